use crate::{CellListParameters, Error, Vector3D};
use crate::cells::{CellNeighbors, AllPairs, SingleAtom, Direction};

use super::SimulationBox;

/// A simple collection of particles in a simulation box, keeping an optional
/// cell list up to date as particles are added, moved and removed.
#[derive(Clone, Debug)]
pub struct SimpleSystem {
    simulation_box: SimulationBox,
    positions: Vec<Vector3D>,
    neighbors: Option<CellNeighbors>,
}

impl SimpleSystem {
    /// Create a new empty system with the given simulation box
    pub fn new(simulation_box: SimulationBox) -> SimpleSystem {
        SimpleSystem {
            simulation_box: simulation_box,
            positions: Vec::new(),
            neighbors: None,
        }
    }

    /// Get the number of particles in this system
    pub fn size(&self) -> usize {
        self.positions.len()
    }

    /// Get the positions of all particles, wrapped inside the box along
    /// periodic axes
    pub fn positions(&self) -> &[Vector3D] {
        &self.positions
    }

    /// Get the simulation box of this system
    pub fn simulation_box(&self) -> &SimulationBox {
        &self.simulation_box
    }

    /// Add a particle at the given `position`, returning its index
    pub fn add_particle(&mut self, mut position: Vector3D) -> usize {
        self.simulation_box.wrap_vector(&mut position);
        let particle = self.positions.len();
        self.positions.push(position);

        if let Some(ref mut neighbors) = self.neighbors {
            neighbors.on_particle_added(particle, position);
        }

        return particle;
    }

    /// Move `particle` to a new `position`
    pub fn set_position(&mut self, particle: usize, mut position: Vector3D) {
        self.simulation_box.wrap_vector(&mut position);
        self.positions[particle] = position;

        if let Some(ref mut neighbors) = self.neighbors {
            neighbors.on_particle_moved(particle, position);
        }
    }

    /// Remove `particle` from this system, returning its position. The last
    /// particle takes the index of the removed one.
    pub fn remove_particle(&mut self, particle: usize) -> Vector3D {
        assert!(
            particle < self.positions.len(),
            "particle {} is out of bounds in a system of size {}",
            particle, self.positions.len()
        );

        let last = self.positions.len() - 1;
        let position = self.positions.swap_remove(particle);

        if let Some(ref mut neighbors) = self.neighbors {
            neighbors.on_particle_removed(particle);
            if particle != last {
                neighbors.on_particle_renumbered(last, particle);
            }
        }

        return position;
    }

    /// Change the simulation box of this system. Positions are scaled to
    /// keep their fractional coordinates, and the cells are rebuilt if
    /// needed. If the new box is too small for the current neighbors
    /// parameters, this returns an error and the system is not modified.
    pub fn set_box(&mut self, simulation_box: SimulationBox) -> Result<(), Error> {
        let positions = self.positions.iter()
            .map(|&position| {
                let mut position = simulation_box.cartesian(self.simulation_box.fractional(position));
                simulation_box.wrap_vector(&mut position);
                position
            })
            .collect::<Vec<_>>();

        if let Some(ref mut neighbors) = self.neighbors {
            neighbors.set_box(simulation_box, &positions)?;
        }

        self.simulation_box = simulation_box;
        self.positions = positions;
        return Ok(());
    }

    /// Compute the cell list with the given parameters, re-using the current
    /// one if the parameters did not change.
    pub fn compute_neighbors(&mut self, parameters: CellListParameters) -> Result<(), Error> {
        if let Some(ref neighbors) = self.neighbors {
            if neighbors.parameters() == &parameters {
                return Ok(());
            }
        }

        let mut neighbors = CellNeighbors::new(self.simulation_box, parameters)?;
        neighbors.assign_all(&self.positions);
        self.neighbors = Some(neighbors);
        return Ok(());
    }

    /// Get the cell list of this system, if `compute_neighbors` was called
    pub fn cell_neighbors(&self) -> Option<&CellNeighbors> {
        self.neighbors.as_ref()
    }

    /// Iterate over all pairs within the cutoff
    pub fn pairs(&self) -> Result<AllPairs<'_>, Error> {
        let neighbors = self.expect_neighbors()?;
        return Ok(neighbors.all_pairs(&self.positions));
    }

    /// Iterate over the neighbors of `particle` in the given `direction`
    pub fn neighbors(&self, particle: usize, direction: Direction) -> Result<SingleAtom<'_>, Error> {
        let neighbors = self.expect_neighbors()?;
        return Ok(neighbors.single_atom(&self.positions, particle, direction));
    }

    fn expect_neighbors(&self) -> Result<&CellNeighbors, Error> {
        self.neighbors.as_ref().ok_or_else(|| Error::InvalidParameter(
            "the neighbors are not computed, call compute_neighbors first".into()
        ))
    }
}
