//! Lock-free `f64` cell built on `AtomicU64`.
//!
//! Wind kicks may hit the same gas particle from several stars at once, so the
//! velocity and the recoupling timer of gas particles live in these cells.
//! Additive updates go through `fetch_add`; the recoupling timer uses
//! `fetch_max`, which keeps the largest value ever proposed no matter which
//! writer comes last.
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self { bits: AtomicU64::new(value.to_bits()) }
    }

    #[inline]
    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Exclusive access, no atomic traffic needed.
    #[inline]
    pub fn get_mut(&mut self) -> &mut f64 {
        // SAFETY: `u64` and `f64` have identical size and alignment, and every
        // bit pattern is a valid value of both.
        unsafe { &mut *(self.bits.get_mut() as *mut u64 as *mut f64) }
    }

    pub fn into_inner(self) -> f64 {
        f64::from_bits(self.bits.into_inner())
    }

    /// Adds `delta` and returns the previous value.
    pub fn fetch_add(&self, delta: f64) -> f64 {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let new = (f64::from_bits(current) + delta).to_bits();
            match self.bits.compare_exchange_weak(current, new, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(previous) => return f64::from_bits(previous),
                Err(actual) => current = actual,
            }
        }
    }

    /// Raises the stored value to `max(current, proposed)` and returns the
    /// previous value.
    ///
    /// The comparison is redone on every retry, so a larger value published
    /// concurrently by another thread is never overwritten by a smaller one.
    pub fn fetch_max(&self, proposed: f64) -> f64 {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let read = f64::from_bits(current);
            let new = read.max(proposed);
            if new.to_bits() == current {
                return read;
            }
            match self.bits.compare_exchange_weak(current, new.to_bits(), Ordering::Relaxed, Ordering::Relaxed) {
                Ok(previous) => return f64::from_bits(previous),
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for AtomicF64 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Clone for AtomicF64 {
    fn clone(&self) -> Self {
        Self::new(self.load())
    }
}

impl From<f64> for AtomicF64 {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for AtomicF64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.load(), f)
    }
}

/// Loads a three component atomic vector.
pub fn load_vec3(v: &[AtomicF64; 3]) -> [f64; 3] {
    [v[0].load(), v[1].load(), v[2].load()]
}
