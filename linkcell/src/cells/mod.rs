//! Cell list decomposition of a simulation box, used to find all pairs of
//! particles within a cutoff distance without looking at every pair.
//!
//! The [`Grid`] splits the box in cells and finds which neighboring cells to
//! search, the [`WrapTable`] maps cells outside of the box to their periodic
//! image inside the box, and [`CellMembership`] tracks which particles are in
//! which cell. [`CellNeighbors`] puts all of these together and keeps them
//! up to date as particles move, are added or removed.

mod grid;
pub use self::grid::{Grid, CellOffset};

mod wrap;
pub use self::wrap::{WrapTable, NO_CELL};

mod membership;
pub use self::membership::{CellMembership, Occupants, NO_PARTICLE};

mod iterators;
pub use self::iterators::{Pair, Direction, PairFilter, NoExclusions};
pub use self::iterators::{AllPairs, SingleAtom};

mod manager;
pub use self::manager::CellNeighbors;
