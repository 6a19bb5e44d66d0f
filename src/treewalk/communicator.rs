/// Collective operations across cooperating tasks.
///
/// A distributed run implements this over its message passing layer. Every
/// method is a collective: all tasks must call it in the same order.
pub trait Communicator: Sync {
    /// Rank of this task; task 0 coordinates.
    fn this_task(&self) -> usize;

    fn n_tasks(&self) -> usize;

    /// Logical OR of `local` across all tasks.
    fn any(&self, local: bool) -> bool;

    /// Sum of `local` across all tasks.
    fn sum_i64(&self, local: i64) -> i64;

    /// Returns task 0's `value` on every task. Only task 0 needs to pass `Some`.
    fn broadcast<T: Clone + Send + 'static>(&self, value: Option<T>) -> Option<T>;
}

/// A run consisting of a single task.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn this_task(&self) -> usize {
        0
    }

    fn n_tasks(&self) -> usize {
        1
    }

    fn any(&self, local: bool) -> bool {
        local
    }

    fn sum_i64(&self, local: i64) -> i64 {
        local
    }

    fn broadcast<T: Clone + Send + 'static>(&self, value: Option<T>) -> Option<T> {
        value
    }
}
