use log::warn;

use crate::{Error, Vector3D};
use super::Grid;
use super::wrap::NO_CELL;

/// Marker for the end of a chain of particles
pub const NO_PARTICLE: usize = usize::MAX;

/// Membership of particles in the cells of a `Grid`.
///
/// Each cell stores a chain of its particles, as an array-based doubly linked
/// list indexed by particle id. New particles are linked at the head of the
/// chain, and any particle can be unlinked in constant time. Particle ids
/// are the indexes of the particles in the caller's position array.
#[derive(Debug, Clone)]
pub struct CellMembership {
    /// Cell containing each particle, or `NO_CELL` for ids not in the cells
    cell_of: Vec<usize>,
    /// Next particle in the same cell, or `NO_PARTICLE`
    next: Vec<usize>,
    /// Previous particle in the same cell, or `NO_PARTICLE`
    previous: Vec<usize>,
    /// First particle in each cell, or `NO_PARTICLE`
    head: Vec<usize>,
    /// Number of particles in each cell
    count: Vec<usize>,
    /// Total number of particles
    len: usize,
}

impl CellMembership {
    /// Create an empty membership store for a grid with `total_cells` cells
    pub fn new(total_cells: usize) -> CellMembership {
        CellMembership {
            cell_of: Vec::new(),
            next: Vec::new(),
            previous: Vec::new(),
            head: vec![NO_PARTICLE; total_cells],
            count: vec![0; total_cells],
            len: 0,
        }
    }

    /// Remove all particles, and resize the store for a grid with
    /// `total_cells` cells
    pub fn clear(&mut self, total_cells: usize) {
        self.cell_of.clear();
        self.next.clear();
        self.previous.clear();
        self.head.clear();
        self.head.resize(total_cells, NO_PARTICLE);
        self.count.clear();
        self.count.resize(total_cells, 0);
        self.len = 0;
    }

    /// Put all particles in their cell from scratch. The particle ids are the
    /// indexes in `positions`.
    #[time_graph::instrument(name = "CellMembership::assign_all")]
    pub fn assign_all(&mut self, grid: &Grid, positions: &[Vector3D]) {
        self.clear(grid.total_cells());
        self.reserve(positions.len());

        let mut n_outside = 0;
        for (particle, &position) in positions.iter().enumerate() {
            let (cell, outside) = grid.locate(position);
            if outside {
                n_outside += 1;
            }
            self.link(particle, cell);
        }

        if n_outside != 0 {
            warn!(
                "{} particle(s) are outside of the box, they have been put in \
                the closest cell. Positions should be wrapped inside the box \
                along periodic axes", n_outside
            );
        }
    }

    /// Update the cell of `particle` after it moved to `position`. Returns
    /// `true` if the particle changed cell.
    ///
    /// # Panics
    ///
    /// If `particle` is not in the cells
    pub fn update(&mut self, grid: &Grid, particle: usize, position: Vector3D) -> bool {
        let old_cell = self.expect_cell(particle);
        let new_cell = locate_particle(grid, particle, position);
        if new_cell == old_cell {
            return false;
        }

        self.unlink(particle);
        self.link(particle, new_cell);
        return true;
    }

    /// Add a new `particle` at `position` to the cells
    ///
    /// # Panics
    ///
    /// If `particle` is already in the cells
    pub fn insert(&mut self, grid: &Grid, particle: usize, position: Vector3D) {
        assert!(
            !self.contains(particle),
            "particle {} is already in the cell list", particle
        );

        self.reserve(particle + 1);
        self.link(particle, locate_particle(grid, particle, position));
    }

    /// Remove `particle` from the cells
    ///
    /// # Panics
    ///
    /// If `particle` is not in the cells
    pub fn remove(&mut self, particle: usize) {
        self.expect_cell(particle);
        self.unlink(particle);
    }

    /// Change the id of a particle from `old` to `new`, keeping its place in
    /// the cell chain.
    ///
    /// # Panics
    ///
    /// If `old` is not in the cells, or if `new` is already used by another
    /// particle.
    pub fn reindex(&mut self, old: usize, new: usize) {
        let cell = self.expect_cell(old);
        if old == new {
            return;
        }

        assert!(
            !self.contains(new),
            "can not renumber particle {} to {}: particle {} is already in the cell list",
            old, new, new
        );

        self.reserve(new + 1);
        let previous = self.previous[old];
        let next = self.next[old];

        if previous == NO_PARTICLE {
            self.head[cell] = new;
        } else {
            self.next[previous] = new;
        }

        if next != NO_PARTICLE {
            self.previous[next] = new;
        }

        self.cell_of[new] = cell;
        self.next[new] = next;
        self.previous[new] = previous;

        self.cell_of[old] = NO_CELL;
        self.next[old] = NO_PARTICLE;
        self.previous[old] = NO_PARTICLE;
    }

    /// Get the number of particles in the cells
    pub fn len(&self) -> usize {
        self.len
    }

    /// Are there no particles in the cells?
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Is `particle` in the cells?
    pub fn contains(&self, particle: usize) -> bool {
        self.cell_of.get(particle).map_or(false, |&cell| cell != NO_CELL)
    }

    /// Get the cell containing `particle`, if any
    pub fn cell_of(&self, particle: usize) -> Option<usize> {
        match self.cell_of.get(particle) {
            Some(&cell) if cell != NO_CELL => Some(cell),
            _ => None,
        }
    }

    /// Get the number of particles in `cell`
    pub fn occupant_count(&self, cell: usize) -> usize {
        self.count[cell]
    }

    /// Iterate over the particles in `cell`, starting with the last one added
    pub fn occupants(&self, cell: usize) -> Occupants<'_> {
        Occupants {
            membership: self,
            current: self.head[cell],
        }
    }

    /// Get the first particle in the chain of `cell`, or `NO_PARTICLE`
    #[inline]
    pub(crate) fn head(&self, cell: usize) -> usize {
        self.head[cell]
    }

    /// Get the particle after `particle` in its chain, or `NO_PARTICLE`
    #[inline]
    pub(crate) fn next(&self, particle: usize) -> usize {
        self.next[particle]
    }

    /// Check that the cell chains and the particles cells agree with each
    /// other. Any failure here is a bug in the bookkeeping of this type.
    pub fn check_consistency(&self) -> Result<(), Error> {
        let mut seen = 0;
        for cell in 0..self.head.len() {
            let mut previous = NO_PARTICLE;
            let mut current = self.head[cell];
            let mut walked = 0;
            while current != NO_PARTICLE {
                if walked > self.len {
                    return Err(Error::Internal(format!(
                        "the chain of cell {} contains a loop: {}",
                        cell, self.dump_cell(cell)
                    )));
                }

                if self.cell_of.get(current) != Some(&cell) {
                    return Err(Error::Internal(format!(
                        "particle {} is in the chain of cell {} but claims cell {}: {}",
                        current, cell, self.claimed_cell(current), self.dump_cell(cell)
                    )));
                }

                if self.previous[current] != previous {
                    return Err(Error::Internal(format!(
                        "broken backward link for particle {} in cell {}: {}",
                        current, cell, self.dump_cell(cell)
                    )));
                }

                previous = current;
                current = self.next[current];
                walked += 1;
            }

            if walked != self.count[cell] {
                return Err(Error::Internal(format!(
                    "cell {} records {} particles but its chain contains {}: {}",
                    cell, self.count[cell], walked, self.dump_cell(cell)
                )));
            }
            seen += walked;
        }

        let claimed = self.cell_of.iter().filter(|&&cell| cell != NO_CELL).count();
        if seen != self.len || claimed != self.len {
            let lost = self.cell_of.iter().enumerate()
                .filter(|&(_, &cell)| cell != NO_CELL)
                .find(|&(particle, &cell)| !self.occupants(cell).any(|p| p == particle));

            let details = match lost {
                Some((particle, cell)) => format!(
                    "particle {} claims cell {}: {}", particle, cell, self.dump_cell(*cell)
                ),
                None => String::new(),
            };

            return Err(Error::Internal(format!(
                "expected {} particles, found {} in the cell chains and {} with a cell. {}",
                self.len, seen, claimed, details
            )));
        }

        return Ok(());
    }

    /// Make sure the per-particle arrays can hold ids up to `size - 1`
    fn reserve(&mut self, size: usize) {
        if self.cell_of.len() < size {
            self.cell_of.resize(size, NO_CELL);
            self.next.resize(size, NO_PARTICLE);
            self.previous.resize(size, NO_PARTICLE);
        }
    }

    fn expect_cell(&self, particle: usize) -> usize {
        match self.cell_of(particle) {
            Some(cell) => cell,
            None => panic!("particle {} is not in the cell list", particle),
        }
    }

    fn claimed_cell(&self, particle: usize) -> String {
        match self.cell_of.get(particle) {
            Some(&NO_CELL) | None => "no cell".into(),
            Some(cell) => cell.to_string(),
        }
    }

    /// Link `particle` at the head of the chain of `cell`
    fn link(&mut self, particle: usize, cell: usize) {
        let head = self.head[cell];
        if head != NO_PARTICLE {
            self.previous[head] = particle;
        }

        self.next[particle] = head;
        self.previous[particle] = NO_PARTICLE;
        self.head[cell] = particle;
        self.cell_of[particle] = cell;

        self.count[cell] += 1;
        self.len += 1;
    }

    /// Unlink `particle` from the chain of its cell
    fn unlink(&mut self, particle: usize) {
        let cell = self.cell_of[particle];
        let previous = self.previous[particle];
        let next = self.next[particle];

        if previous == NO_PARTICLE {
            self.head[cell] = next;
        } else {
            self.next[previous] = next;
        }

        if next != NO_PARTICLE {
            self.previous[next] = previous;
        }

        self.next[particle] = NO_PARTICLE;
        self.previous[particle] = NO_PARTICLE;
        self.cell_of[particle] = NO_CELL;

        self.count[cell] -= 1;
        self.len -= 1;
    }

    /// Describe the content of `cell`, stopping after a bit more than the
    /// expected number of particles in case the chain contains a loop
    fn dump_cell(&self, cell: usize) -> String {
        let occupants = self.occupants(cell)
            .take(self.count[cell] + 5)
            .map(|particle| particle.to_string())
            .collect::<Vec<_>>();
        return format!("cell {} has recorded occupants [{}]", cell, occupants.join(", "));
    }
}

/// Find the cell of a single `particle`, warning if it is outside of the box
fn locate_particle(grid: &Grid, particle: usize, position: Vector3D) -> usize {
    let (cell, outside) = grid.locate(position);
    if outside {
        warn!(
            "particle {} is outside of the box at [{}, {}, {}], it has been put \
            in the closest cell. Positions should be wrapped inside the box \
            along periodic axes", particle, position[0], position[1], position[2]
        );
    }
    return cell;
}

/// Iterator over the particles in a single cell
#[derive(Debug, Clone)]
pub struct Occupants<'a> {
    membership: &'a CellMembership,
    current: usize,
}

impl<'a> Iterator for Occupants<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.current == NO_PARTICLE {
            return None;
        }

        let particle = self.current;
        self.current = self.membership.next[particle];
        return Some(particle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellListParameters;
    use crate::systems::SimulationBox;

    fn grid() -> Grid {
        Grid::new(&SimulationBox::cubic(10.0), &CellListParameters::new(2.5)).unwrap()
    }

    fn occupants(membership: &CellMembership, cell: usize) -> Vec<usize> {
        membership.occupants(cell).collect()
    }

    #[test]
    fn assign_all() {
        let grid = grid();
        let mut membership = CellMembership::new(grid.total_cells());
        let positions = [
            Vector3D::new(0.5, 0.5, 0.5),
            Vector3D::new(5.0, 5.0, 5.0),
            Vector3D::new(0.7, 0.1, 1.0),
        ];
        membership.assign_all(&grid, &positions);

        assert_eq!(membership.len(), 3);
        let cell_0 = grid.interior_cell([0, 0, 0]);
        let cell_1 = grid.interior_cell([4, 4, 4]);
        assert_eq!(membership.cell_of(0), Some(cell_0));
        assert_eq!(membership.cell_of(1), Some(cell_1));
        assert_eq!(membership.cell_of(2), Some(cell_0));
        assert_eq!(membership.cell_of(3), None);

        // last added particle comes first
        assert_eq!(occupants(&membership, cell_0), [2, 0]);
        assert_eq!(membership.occupant_count(cell_0), 2);
        assert_eq!(occupants(&membership, cell_1), [1]);

        membership.check_consistency().unwrap();

        // assigning again starts from scratch
        membership.assign_all(&grid, &positions[..1]);
        assert_eq!(membership.len(), 1);
        assert_eq!(occupants(&membership, cell_0), [0]);
        assert!(!membership.contains(2));
        membership.check_consistency().unwrap();
    }

    #[test]
    fn update() {
        let grid = grid();
        let mut membership = CellMembership::new(grid.total_cells());
        let mut positions = vec![
            Vector3D::new(0.5, 0.5, 0.5),
            Vector3D::new(0.6, 0.5, 0.5),
            Vector3D::new(0.7, 0.5, 0.5),
        ];
        membership.assign_all(&grid, &positions);
        let cell = grid.interior_cell([0, 0, 0]);

        // staying in the same cell
        positions[1] = Vector3D::new(1.0, 1.0, 1.0);
        assert!(!membership.update(&grid, 1, positions[1]));
        assert_eq!(occupants(&membership, cell), [2, 1, 0]);

        // moving the particle in the middle of the chain
        positions[1] = Vector3D::new(9.0, 1.0, 1.0);
        assert!(membership.update(&grid, 1, positions[1]));
        assert_eq!(occupants(&membership, cell), [2, 0]);
        assert_eq!(occupants(&membership, grid.interior_cell([7, 0, 0])), [1]);
        membership.check_consistency().unwrap();

        // moving the head of the chain
        positions[2] = Vector3D::new(9.5, 1.0, 1.0);
        assert!(membership.update(&grid, 2, positions[2]));
        assert_eq!(occupants(&membership, cell), [0]);
        assert_eq!(occupants(&membership, grid.interior_cell([7, 0, 0])), [2, 1]);
        membership.check_consistency().unwrap();
    }

    /// Logger keeping all the warnings emitted during the tests
    struct WarningsLogger {
        messages: std::sync::Mutex<Vec<String>>,
    }

    impl log::Log for WarningsLogger {
        fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
            metadata.level() <= log::Level::Warn
        }

        fn log(&self, record: &log::Record<'_>) {
            if self.enabled(record.metadata()) {
                self.messages.lock().unwrap().push(record.args().to_string());
            }
        }

        fn flush(&self) {}
    }

    static WARNINGS: WarningsLogger = WarningsLogger {
        messages: std::sync::Mutex::new(Vec::new()),
    };

    fn warnings_about(particle: usize) -> Vec<String> {
        static INIT: std::sync::Once = std::sync::Once::new();
        INIT.call_once(|| {
            log::set_logger(&WARNINGS).unwrap();
            log::set_max_level(log::LevelFilter::Warn);
        });

        let prefix = format!("particle {} is outside of the box", particle);
        WARNINGS.messages.lock().unwrap().iter()
            .filter(|message| message.starts_with(&prefix))
            .cloned()
            .collect()
    }

    #[test]
    fn outside_of_the_box() {
        let grid = grid();
        let mut membership = CellMembership::new(grid.total_cells());
        // install the logger before anything is logged
        assert!(warnings_about(173).is_empty());

        membership.insert(&grid, 173, Vector3D::new(5.0, 5.0, 5.0));
        assert!(warnings_about(173).is_empty());

        // moved outside of the box, clamped to the closest cell
        assert!(membership.update(&grid, 173, Vector3D::new(12.0, 5.0, -1.0)));
        assert_eq!(membership.cell_of(173), Some(grid.interior_cell([7, 4, 0])));
        let warnings = warnings_about(173);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("[12, 5, -1]"));

        membership.remove(173);
        membership.insert(&grid, 173, Vector3D::new(-3.0, 5.0, 5.0));
        assert_eq!(membership.cell_of(173), Some(grid.interior_cell([0, 4, 4])));
        assert_eq!(warnings_about(173).len(), 2);
        membership.check_consistency().unwrap();
    }

    #[test]
    fn insert_remove() {
        let grid = grid();
        let mut membership = CellMembership::new(grid.total_cells());
        let cell = grid.interior_cell([0, 0, 0]);

        membership.insert(&grid, 4, Vector3D::new(0.5, 0.5, 0.5));
        membership.insert(&grid, 1, Vector3D::new(0.5, 0.5, 0.5));
        membership.insert(&grid, 7, Vector3D::new(0.5, 0.5, 0.5));
        assert_eq!(membership.len(), 3);
        assert_eq!(occupants(&membership, cell), [7, 1, 4]);
        assert!(!membership.contains(0));
        membership.check_consistency().unwrap();

        membership.remove(1);
        assert_eq!(occupants(&membership, cell), [7, 4]);
        membership.remove(7);
        assert_eq!(occupants(&membership, cell), [4]);
        membership.remove(4);
        assert!(membership.is_empty());
        assert_eq!(membership.occupant_count(cell), 0);
        membership.check_consistency().unwrap();
    }

    #[test]
    fn reindex() {
        let grid = grid();
        let mut membership = CellMembership::new(grid.total_cells());
        let positions = [
            Vector3D::new(0.5, 0.5, 0.5),
            Vector3D::new(0.6, 0.5, 0.5),
            Vector3D::new(0.7, 0.5, 0.5),
        ];
        membership.assign_all(&grid, &positions);
        let cell = grid.interior_cell([0, 0, 0]);

        // remove 1, then renumber the last particle to 1
        membership.remove(1);
        membership.reindex(2, 1);
        assert_eq!(occupants(&membership, cell), [1, 0]);
        assert_eq!(membership.cell_of(1), Some(cell));
        assert_eq!(membership.cell_of(2), None);
        membership.check_consistency().unwrap();

        // renumbering to a new, larger id
        membership.reindex(0, 12);
        assert_eq!(occupants(&membership, cell), [1, 12]);
        membership.check_consistency().unwrap();

        membership.reindex(1, 1);
        assert_eq!(occupants(&membership, cell), [1, 12]);
    }

    #[test]
    #[should_panic(expected = "particle 3 is not in the cell list")]
    fn update_unknown() {
        let grid = grid();
        let mut membership = CellMembership::new(grid.total_cells());
        membership.update(&grid, 3, Vector3D::zero());
    }

    #[test]
    #[should_panic(expected = "particle 0 is already in the cell list")]
    fn double_insert() {
        let grid = grid();
        let mut membership = CellMembership::new(grid.total_cells());
        membership.insert(&grid, 0, Vector3D::zero());
        membership.insert(&grid, 0, Vector3D::zero());
    }

    #[test]
    #[should_panic(expected = "can not renumber particle 0 to 1: particle 1 is already in the cell list")]
    fn reindex_collision() {
        let grid = grid();
        let mut membership = CellMembership::new(grid.total_cells());
        membership.assign_all(&grid, &[Vector3D::zero(), Vector3D::zero()]);
        membership.reindex(0, 1);
    }

    #[test]
    fn corrupted_state() {
        let grid = grid();
        let mut membership = CellMembership::new(grid.total_cells());
        membership.assign_all(&grid, &[Vector3D::zero(), Vector3D::new(5.0, 5.0, 5.0)]);

        // particle 1 claims the wrong cell
        membership.cell_of[1] = grid.interior_cell([0, 0, 0]);
        let error = membership.check_consistency().unwrap_err();
        assert!(matches!(error, Error::Internal(_)));
        assert!(error.to_string().contains("particle 1 is in the chain of cell"));

        // loop in a chain
        let mut membership = CellMembership::new(grid.total_cells());
        membership.assign_all(&grid, &[Vector3D::zero(), Vector3D::zero()]);
        membership.next[0] = 1;
        let error = membership.check_consistency().unwrap_err();
        assert!(matches!(error, Error::Internal(_)));
        assert!(error.to_string().contains("has recorded occupants [1, 0, 1, 0"));
    }
}
