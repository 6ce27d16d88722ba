use crate::{CellListParameters, Error, Vector3D};
use crate::systems::SimulationBox;

use super::{Grid, WrapTable, CellMembership};
use super::{AllPairs, SingleAtom, Pair, Direction};
use super::iterators::SearchTables;

/// Cell list based neighbor search, kept up to date with the particles of a
/// simulation.
///
/// The positions are owned by the caller, which must notify this struct of
/// every change using the `on_particle_xxx` functions, or call
/// [`CellNeighbors::assign_all`] after large changes. Particles are
/// identified by their index in the positions array.
///
/// ```
/// # use linkcell::{CellListParameters, CellNeighbors, Vector3D};
/// # use linkcell::systems::SimulationBox;
/// let positions = vec![
///     Vector3D::new(0.0, 0.0, 0.0),
///     Vector3D::new(9.8, 0.0, 0.0),
///     Vector3D::new(5.0, 5.0, 5.0),
/// ];
///
/// let mut neighbors = CellNeighbors::new(SimulationBox::cubic(10.0), CellListParameters::new(2.5)).unwrap();
/// neighbors.assign_all(&positions);
///
/// let pairs = neighbors.all_pairs(&positions).collect::<Vec<_>>();
/// assert_eq!(pairs.len(), 1);
/// assert!((pairs[0].distance() - 0.2).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct CellNeighbors {
    grid: Grid,
    wrap: WrapTable,
    membership: CellMembership,
}

impl CellNeighbors {
    /// Create a new empty cell list for the given box and parameters
    pub fn new(simulation_box: SimulationBox, parameters: CellListParameters) -> Result<CellNeighbors, Error> {
        let grid = Grid::new(&simulation_box, &parameters)?;
        let wrap = WrapTable::new(&grid);
        let membership = CellMembership::new(grid.total_cells());

        return Ok(CellNeighbors {
            grid: grid,
            wrap: wrap,
            membership: membership,
        });
    }

    /// Get the simulation box of this cell list
    pub fn simulation_box(&self) -> &SimulationBox {
        self.grid.simulation_box()
    }

    /// Get the parameters of this cell list
    pub fn parameters(&self) -> &CellListParameters {
        self.grid.parameters()
    }

    /// Get the cell grid
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Get the periodic images of the cells
    pub fn wrap_table(&self) -> &WrapTable {
        &self.wrap
    }

    /// Get the particles in each cell
    pub fn membership(&self) -> &CellMembership {
        &self.membership
    }

    /// Change the simulation box, rebuilding the cells and putting all
    /// `positions` in them. If the new box is too small, this returns an
    /// error and the cell list is not modified.
    pub fn set_box(&mut self, simulation_box: SimulationBox, positions: &[Vector3D]) -> Result<(), Error> {
        let parameters = *self.parameters();
        self.rebuild(simulation_box, parameters, positions)
    }

    /// Change the parameters, rebuilding the cells and putting all
    /// `positions` in them. If the new parameters are invalid, this returns
    /// an error and the cell list is not modified.
    pub fn set_parameters(&mut self, parameters: CellListParameters, positions: &[Vector3D]) -> Result<(), Error> {
        let simulation_box = *self.simulation_box();
        self.rebuild(simulation_box, parameters, positions)
    }

    fn rebuild(&mut self, simulation_box: SimulationBox, parameters: CellListParameters, positions: &[Vector3D]) -> Result<(), Error> {
        let grid = Grid::new(&simulation_box, &parameters)?;
        self.wrap = WrapTable::new(&grid);
        self.grid = grid;
        self.assign_all(positions);
        return Ok(());
    }

    /// Put all the particles in their cell from scratch. The particle `i` is
    /// at `positions[i]`.
    pub fn assign_all(&mut self, positions: &[Vector3D]) {
        self.membership.assign_all(&self.grid, positions);
    }

    /// Update the cell of `particle` after it moved to `position`. Returns
    /// `true` if it changed cell.
    ///
    /// # Panics
    ///
    /// If `particle` is not in the cell list
    pub fn on_particle_moved(&mut self, particle: usize, position: Vector3D) -> bool {
        self.membership.update(&self.grid, particle, position)
    }

    /// Add a new `particle` at `position` to the cell list
    ///
    /// # Panics
    ///
    /// If `particle` is already in the cell list
    pub fn on_particle_added(&mut self, particle: usize, position: Vector3D) {
        self.membership.insert(&self.grid, particle, position);
    }

    /// Remove `particle` from the cell list
    ///
    /// # Panics
    ///
    /// If `particle` is not in the cell list
    pub fn on_particle_removed(&mut self, particle: usize) {
        self.membership.remove(particle);
    }

    /// The particle `old` is now known as `new`
    ///
    /// # Panics
    ///
    /// If `old` is not in the cell list, or if `new` is already in the cell
    /// list
    pub fn on_particle_renumbered(&mut self, old: usize, new: usize) {
        self.membership.reindex(old, new);
    }

    fn tables<'a>(&'a self, positions: &'a [Vector3D]) -> SearchTables<'a> {
        let parameters = self.grid.parameters();
        SearchTables {
            offsets: self.grid.offsets(),
            wrap: &self.wrap,
            membership: &self.membership,
            positions: positions,
            cutoff2: parameters.cutoff * parameters.cutoff,
            exclusion2: parameters.exclusion_distance * parameters.exclusion_distance,
        }
    }

    /// Iterate over all pairs within the cutoff. `positions` must be the
    /// positions used to put particles in cells.
    pub fn all_pairs<'a>(&'a self, positions: &'a [Vector3D]) -> AllPairs<'a> {
        AllPairs::new(
            self.tables(positions),
            self.grid.interior_cells(),
            self.grid.padding(),
            self.grid.jump(),
        )
    }

    /// Iterate over the neighbors of `particle` in the given `direction`.
    ///
    /// # Panics
    ///
    /// If `particle` is not in the cell list
    pub fn single_atom<'a>(&'a self, positions: &'a [Vector3D], particle: usize, direction: Direction) -> SingleAtom<'a> {
        SingleAtom::new(self.tables(positions), particle, direction)
    }

    /// Call `callback` for all pairs within the cutoff
    #[time_graph::instrument(name = "CellNeighbors::for_each_pair")]
    pub fn for_each_pair(&self, positions: &[Vector3D], mut callback: impl FnMut(Pair)) {
        for pair in self.all_pairs(positions) {
            callback(pair);
        }
    }

    /// Call `callback` for all neighbors of `particle` in the given
    /// `direction`
    pub fn for_each_neighbor(&self, positions: &[Vector3D], particle: usize, direction: Direction, mut callback: impl FnMut(Pair)) {
        for pair in self.single_atom(positions, particle, direction) {
            callback(pair);
        }
    }

    /// Check the consistency of the cell membership bookkeeping
    pub fn check_consistency(&self) -> Result<(), Error> {
        self.membership.check_consistency()
    }
}
