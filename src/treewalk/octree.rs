use crate::particles::{Particle, TypeMask};

/// Maximum number of particles kept in a leaf before it is split.
const LEAF_CAPACITY: usize = 8;
/// Leaves at this depth are never split, so coincident particles terminate.
const MAX_DEPTH: usize = 48;

/// Represents a cubic region in 3D space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cube {
    pub center: [f64; 3],
    pub half_size: f64, // half the length of one side
}

impl Cube {
    /// Returns true if `pos` is inside this cube (half-open on the upper faces).
    pub fn contains(&self, pos: &[f64; 3]) -> bool {
        (0..3).all(|d| pos[d] >= self.center[d] - self.half_size && pos[d] < self.center[d] + self.half_size)
    }

    /// Octant of `pos`: bit 0 is +x, bit 1 is +y, bit 2 is +z.
    #[inline]
    pub fn child_index(&self, pos: &[f64; 3]) -> usize {
        (0..3).fold(0, |idx, d| if pos[d] >= self.center[d] { idx | (1 << d) } else { idx })
    }

    /// Subdivides the cube into its eight octants, ordered like `child_index`.
    pub fn subdivide(&self) -> [Cube; 8] {
        let hs = self.half_size / 2.0;
        std::array::from_fn(|octant| {
            let mut center = self.center;
            for (d, c) in center.iter_mut().enumerate() {
                *c += if octant & (1 << d) != 0 { hs } else { -hs };
            }
            Cube { center, half_size: hs }
        })
    }

    /// Squared distance from `pos` to the closest point of the cube, zero inside.
    pub fn distance_sq_to(&self, pos: &[f64; 3]) -> f64 {
        (0..3)
            .map(|d| {
                let excess = (pos[d] - self.center[d]).abs() - self.half_size;
                if excess > 0.0 { excess * excess } else { 0.0 }
            })
            .sum()
    }

    /// Smallest cube enclosing every particle, padded so that all points lie
    /// strictly inside the half-open bounds.
    pub fn bounding(particles: &[Particle]) -> Cube {
        if particles.is_empty() {
            return Cube { center: [0.0; 3], half_size: 1.0 };
        }
        let mut lo = [f64::INFINITY; 3];
        let mut hi = [f64::NEG_INFINITY; 3];
        for p in particles {
            for d in 0..3 {
                lo[d] = lo[d].min(p.pos[d]);
                hi[d] = hi[d].max(p.pos[d]);
            }
        }
        let center = [0.5 * (lo[0] + hi[0]), 0.5 * (lo[1] + hi[1]), 0.5 * (lo[2] + hi[2])];
        let extent = (0..3).map(|d| hi[d] - lo[d]).fold(0.0, f64::max);
        Cube { center, half_size: 0.5 * extent * 1.001 + 1e-9 }
    }
}

/// Octree node over particle indices.
#[derive(Debug)]
pub enum OctreeNode {
    /// The node is empty; it stores the cube representing its region.
    Empty(Cube),

    /// The node is a leaf holding a small bucket of particles.
    Leaf(Cube, Vec<usize>),

    /// The node is internal: eight children plus the species present below it.
    Internal {
        cube: Cube,
        mask: TypeMask,
        num_particles: usize,
        children: Box<[OctreeNode; 8]>,
    },
}

impl OctreeNode {
    pub fn new(cube: Cube) -> Self {
        OctreeNode::Empty(cube)
    }

    pub fn cube(&self) -> Cube {
        match self {
            OctreeNode::Empty(c) => *c,
            OctreeNode::Leaf(c, _) => *c,
            OctreeNode::Internal { cube, .. } => *cube,
        }
    }

    pub fn count_particles(&self) -> usize {
        match self {
            OctreeNode::Empty(_) => 0,
            OctreeNode::Leaf(_, members) => members.len(),
            OctreeNode::Internal { num_particles, .. } => *num_particles,
        }
    }

    /// Inserts particle `index` of `particles` below this node.
    fn insert(&mut self, index: usize, particles: &[Particle], depth: usize) {
        match self {
            OctreeNode::Empty(cube) => {
                *self = OctreeNode::Leaf(*cube, vec![index]);
            }
            OctreeNode::Leaf(cube, members) => {
                if members.len() < LEAF_CAPACITY || depth >= MAX_DEPTH {
                    members.push(index);
                    return;
                }
                // Split the bucket into an internal node and reinsert everything
                let cube = *cube;
                let existing = std::mem::take(members);
                let children = Box::new(cube.subdivide().map(OctreeNode::Empty));
                *self = OctreeNode::Internal {
                    cube,
                    mask: TypeMask::default(),
                    num_particles: 0,
                    children,
                };
                for member in existing {
                    self.insert(member, particles, depth);
                }
                self.insert(index, particles, depth);
            }
            OctreeNode::Internal { cube, mask, num_particles, children } => {
                let p = &particles[index];
                *mask = mask.union(TypeMask::of(p.ptype));
                *num_particles += 1;

                let child_index = cube.child_index(&p.pos);
                children[child_index].insert(index, particles, depth + 1);
            }
        }
    }
}

/// Spatial index over a particle array, used for neighbour searches.
#[derive(Debug)]
pub struct Octree {
    root: OctreeNode,
}

impl Octree {
    /// Builds a tree holding every particle of `particles`.
    pub fn build(particles: &[Particle]) -> Self {
        let mut root = OctreeNode::new(Cube::bounding(particles));
        for index in 0..particles.len() {
            root.insert(index, particles, 0);
        }
        Octree { root }
    }

    pub fn root(&self) -> &OctreeNode {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.root.count_particles()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls `visit(index, dist, r)` for every particle of a species in `mask`
    /// within `radius` of `center`, where `dist = center - pos`.
    ///
    /// `particles` must be the slice the tree was built from.
    pub fn for_each_neighbour<F>(&self, particles: &[Particle], center: &[f64; 3], radius: f64, mask: TypeMask, mut visit: F)
    where
        F: FnMut(usize, [f64; 3], f64),
    {
        let radius_sq = radius * radius;
        // Use a stack to replace recursion
        let mut stack = vec![&self.root];

        while let Some(node) = stack.pop() {
            match node {
                OctreeNode::Empty(_) => {}

                OctreeNode::Leaf(cube, members) => {
                    if cube.distance_sq_to(center) > radius_sq {
                        continue;
                    }
                    for &index in members {
                        let p = &particles[index];
                        if !mask.contains(p.ptype) {
                            continue;
                        }
                        let dist = [center[0] - p.pos[0], center[1] - p.pos[1], center[2] - p.pos[2]];
                        let r_sq = dist[0] * dist[0] + dist[1] * dist[1] + dist[2] * dist[2];
                        if r_sq <= radius_sq {
                            visit(index, dist, r_sq.sqrt());
                        }
                    }
                }

                OctreeNode::Internal { cube, mask: node_mask, children, .. } => {
                    if !node_mask.intersects(mask) || cube.distance_sq_to(center) > radius_sq {
                        continue;
                    }
                    for child in children.iter() {
                        if !matches!(child, OctreeNode::Empty(_)) {
                            stack.push(child);
                        }
                    }
                }
            }
        }
    }
}
