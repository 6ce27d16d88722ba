use crate::Vector3D;

use super::{CellMembership, CellOffset, WrapTable};
use super::membership::NO_PARTICLE;
use super::wrap::NO_CELL;

/// Pair of particles within the cutoff of one another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pair {
    /// index of the first particle in the pair
    pub first: usize,
    /// index of the second particle in the pair
    pub second: usize,
    /// vector from the first particle to the (periodic image of the) second
    /// particle. This is `position[second] - position[first]` plus the
    /// displacement of the periodic image.
    pub vector: Vector3D,
    /// squared distance between the two particles
    pub distance2: f64,
}

impl Pair {
    /// Get the distance between the two particles
    pub fn distance(&self) -> f64 {
        f64::sqrt(self.distance2)
    }
}

/// Which part of the neighboring cells to search around a single particle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Particles after this one in its own cell, and the cells in the "up"
    /// half of the neighboring cells. Visiting the up neighbors of all
    /// particles visits every pair once.
    Up,
    /// Particles before this one in its own cell, and the cells in the
    /// "down" half of the neighboring cells.
    Down,
    /// All neighbors of this particle
    Both,
}

/// Predicate used to exclude pairs of particles (for example bonded pairs)
/// from the neighbors. It is only called for pairs closer than the
/// `exclusion_distance` parameter.
pub trait PairFilter {
    /// Should the pair between `first` and `second` be excluded?
    fn excluded(&self, first: usize, second: usize) -> bool;
}

impl<F> PairFilter for F where F: Fn(usize, usize) -> bool {
    fn excluded(&self, first: usize, second: usize) -> bool {
        self(first, second)
    }
}

/// A `PairFilter` that never excludes any pair
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExclusions;

impl PairFilter for NoExclusions {
    fn excluded(&self, _: usize, _: usize) -> bool {
        false
    }
}

/// Read-only view of everything needed to search for neighbors
#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchTables<'a> {
    pub(crate) offsets: &'a [CellOffset],
    pub(crate) wrap: &'a WrapTable,
    pub(crate) membership: &'a CellMembership,
    pub(crate) positions: &'a [Vector3D],
    pub(crate) cutoff2: f64,
    pub(crate) exclusion2: f64,
}

impl<'a> SearchTables<'a> {
    /// Create a pair between `first` and the image of `second` displaced by
    /// `box_offset`, if they are within the cutoff and not excluded
    #[inline]
    fn pair<F: PairFilter>(&self, filter: &F, first: usize, second: usize, box_offset: Vector3D) -> Option<Pair> {
        let vector = self.positions[second] - self.positions[first] + box_offset;
        let distance2 = vector.norm2();
        if distance2 > self.cutoff2 {
            return None;
        }

        if distance2 < self.exclusion2 && filter.excluded(first, second) {
            return None;
        }

        return Some(Pair {
            first: first,
            second: second,
            vector: vector,
            distance2: distance2,
        });
    }
}

/// Walk through the candidate neighbors of a single particle, in its own
/// cell and in the neighboring cells.
///
/// Stage 0 is the particle own cell, stages `1..=n` are the "up" offsets and
/// stages `n+1..=2n` are the "down" offsets, where `n` is the number of "up"
/// offsets.
#[derive(Debug, Clone)]
struct Walk {
    particle: usize,
    cell: usize,
    direction: Direction,
    stage: usize,
    candidate: usize,
    box_offset: Vector3D,
}

impl Walk {
    fn new(tables: &SearchTables<'_>, particle: usize, cell: usize, direction: Direction) -> Walk {
        let candidate = match direction {
            Direction::Up => tables.membership.next(particle),
            Direction::Down | Direction::Both => tables.membership.head(cell),
        };

        Walk {
            particle: particle,
            cell: cell,
            direction: direction,
            stage: 0,
            candidate: candidate,
            box_offset: Vector3D::zero(),
        }
    }

    /// Get the next candidate neighbor, and the box offset to apply to its
    /// position
    #[inline]
    fn next_candidate(&mut self, tables: &SearchTables<'_>) -> Option<(usize, Vector3D)> {
        loop {
            if self.candidate != NO_PARTICLE {
                let candidate = self.candidate;
                self.candidate = tables.membership.next(candidate);

                if self.stage == 0 && candidate == self.particle {
                    if self.direction == Direction::Down {
                        // the particles before this one are done
                        self.candidate = NO_PARTICLE;
                    }
                    continue;
                }

                return Some((candidate, self.box_offset));
            }

            if !self.next_cell(tables) {
                return None;
            }
        }
    }

    /// Move to the next non-empty neighboring cell. Returns `false` once all
    /// cells have been visited.
    fn next_cell(&mut self, tables: &SearchTables<'_>) -> bool {
        let n_offsets = tables.offsets.len();
        loop {
            self.stage += 1;
            if self.direction == Direction::Down && self.stage <= n_offsets {
                self.stage = n_offsets + 1;
            }

            if self.stage > 2 * n_offsets || (self.direction == Direction::Up && self.stage > n_offsets) {
                return false;
            }

            let delta = if self.stage <= n_offsets {
                tables.offsets[self.stage - 1].delta
            } else {
                -tables.offsets[self.stage - n_offsets - 1].delta
            };

            let target = self.cell.wrapping_add_signed(delta);
            let real = tables.wrap.real_cell(target);
            if real == NO_CELL {
                continue;
            }

            let head = tables.membership.head(real);
            if head == NO_PARTICLE {
                continue;
            }

            self.candidate = head;
            self.box_offset = tables.wrap.box_offset(target);
            return true;
        }
    }
}

/// Iterator over all pairs of particles within the cutoff, visiting each
/// pair exactly once.
///
/// When the cutoff is larger than half of the box, a particle can be close
/// to multiple periodic images of another particle (or of itself). Each of
/// these images produces a separate pair.
#[derive(Debug, Clone)]
pub struct AllPairs<'a, F = NoExclusions> {
    tables: SearchTables<'a>,
    filter: F,
    /// Interior cells along each axis, used to go through the cells
    interior: [usize; 3],
    padding: [usize; 3],
    jump: [usize; 3],
    /// Index of the next interior cell to visit
    next_interior: usize,
    /// Current cell
    cell: usize,
    /// Next particle to visit in the current cell
    next_particle: usize,
    walk: Option<Walk>,
}

impl<'a> AllPairs<'a, NoExclusions> {
    pub(crate) fn new(tables: SearchTables<'a>, interior: [usize; 3], padding: [usize; 3], jump: [usize; 3]) -> AllPairs<'a, NoExclusions> {
        AllPairs {
            tables: tables,
            filter: NoExclusions,
            interior: interior,
            padding: padding,
            jump: jump,
            next_interior: 0,
            cell: NO_CELL,
            next_particle: NO_PARTICLE,
            walk: None,
        }
    }
}

impl<'a, F: PairFilter> AllPairs<'a, F> {
    /// Use the given `filter` to exclude some of the close pairs
    pub fn with_exclusions<G: PairFilter>(self, filter: G) -> AllPairs<'a, G> {
        AllPairs {
            tables: self.tables,
            filter: filter,
            interior: self.interior,
            padding: self.padding,
            jump: self.jump,
            next_interior: self.next_interior,
            cell: self.cell,
            next_particle: self.next_particle,
            walk: self.walk,
        }
    }

    /// Start walking around the next particle, moving to the next non-empty
    /// cell if needed. Returns `false` once all particles have been visited.
    fn next_walk(&mut self) -> bool {
        while self.next_particle == NO_PARTICLE {
            let n_interior = self.interior[0] * self.interior[1] * self.interior[2];
            if self.next_interior >= n_interior {
                return false;
            }

            let index = self.next_interior;
            self.next_interior += 1;

            let i0 = index / (self.interior[1] * self.interior[2]);
            let i1 = (index / self.interior[2]) % self.interior[1];
            let i2 = index % self.interior[2];
            self.cell = (i0 + self.padding[0]) * self.jump[0]
                      + (i1 + self.padding[1]) * self.jump[1]
                      + (i2 + self.padding[2]);
            self.next_particle = self.tables.membership.head(self.cell);
        }

        let particle = self.next_particle;
        self.next_particle = self.tables.membership.next(particle);
        self.walk = Some(Walk::new(&self.tables, particle, self.cell, Direction::Up));
        return true;
    }
}

impl<'a, F: PairFilter> Iterator for AllPairs<'a, F> {
    type Item = Pair;

    fn next(&mut self) -> Option<Pair> {
        loop {
            if let Some(ref mut walk) = self.walk {
                while let Some((second, box_offset)) = walk.next_candidate(&self.tables) {
                    if let Some(pair) = self.tables.pair(&self.filter, walk.particle, second, box_offset) {
                        return Some(pair);
                    }
                }
            }

            if !self.next_walk() {
                self.walk = None;
                return None;
            }
        }
    }
}

/// Iterator over the neighbors of a single particle, in the given
/// `Direction`. The `first` particle of all pairs is the particle used to
/// create this iterator.
#[derive(Debug, Clone)]
pub struct SingleAtom<'a, F = NoExclusions> {
    tables: SearchTables<'a>,
    filter: F,
    walk: Walk,
}

impl<'a> SingleAtom<'a, NoExclusions> {
    pub(crate) fn new(tables: SearchTables<'a>, particle: usize, direction: Direction) -> SingleAtom<'a, NoExclusions> {
        let cell = match tables.membership.cell_of(particle) {
            Some(cell) => cell,
            None => panic!("particle {} is not in the cell list", particle),
        };

        let walk = Walk::new(&tables, particle, cell, direction);
        SingleAtom {
            tables: tables,
            filter: NoExclusions,
            walk: walk,
        }
    }
}

impl<'a, F: PairFilter> SingleAtom<'a, F> {
    /// Use the given `filter` to exclude some of the close pairs
    pub fn with_exclusions<G: PairFilter>(self, filter: G) -> SingleAtom<'a, G> {
        SingleAtom {
            tables: self.tables,
            filter: filter,
            walk: self.walk,
        }
    }
}

impl<'a, F: PairFilter> Iterator for SingleAtom<'a, F> {
    type Item = Pair;

    fn next(&mut self) -> Option<Pair> {
        while let Some((second, box_offset)) = self.walk.next_candidate(&self.tables) {
            if let Some(pair) = self.tables.pair(&self.filter, self.walk.particle, second, box_offset) {
                return Some(pair);
            }
        }
        return None;
    }
}
