use log::{debug, warn};

use crate::{CellListParameters, Error, Vector3D};
use crate::systems::{BoxShape, SimulationBox};

/// Maximal number of interior cells, we need to use this to prevent having
/// too many cells with a large box and a small cutoff
const MAX_NUMBER_OF_CELLS: f64 = 1e6;

/// Fractional coordinates further than this outside of `[0, 1)` are reported
/// as being outside of the box, smaller excursions are rounding errors.
const OUTSIDE_TOLERANCE: f64 = 1e-9;

/// Displacement between a central cell and one of the cells that can contain
/// neighbors of the particles in the central cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellOffset {
    /// Displacement in number of cells along each axis
    pub displacement: [isize; 3],
    /// Difference between the flat index of the target cell and the flat
    /// index of the central cell
    pub delta: isize,
}

impl CellOffset {
    /// Get the offset pointing in the opposite direction
    #[must_use]
    pub fn reversed(&self) -> CellOffset {
        CellOffset {
            displacement: [-self.displacement[0], -self.displacement[1], -self.displacement[2]],
            delta: -self.delta,
        }
    }
}

/// Regular decomposition of a simulation box in cells, with padding layers
/// around the interior cells and the list of offsets to neighboring cells.
///
/// Cells are indexed with a single flat index over the padded grid, the
/// coordinates `[c0, c1, c2]` of a cell giving the index `c0 * jump[0] + c1 *
/// jump[1] + c2`. Interior cells (the ones inside the box) have coordinates
/// `padding[k] <= ck < padding[k] + interior[k]`. The padding is wide enough
/// that adding any offset to an interior cell gives a valid cell index.
#[derive(Debug, Clone)]
pub struct Grid {
    /// Box decomposed by this grid
    simulation_box: SimulationBox,
    /// Parameters used to create this grid
    parameters: CellListParameters,
    /// Number of cells inside the box along each axis
    interior: [usize; 3],
    /// Number of padding cell layers on each side of the box
    padding: [usize; 3],
    /// Total number of cells (interior and padding) along each axis
    dimensions: [usize; 3],
    /// Strides of the flat cell index
    jump: [usize; 3],
    /// Thickness of a single cell, measured perpendicular to its faces
    thickness: Vector3D,
    /// Offsets in the "up" half of the neighboring cells shell
    offsets: Vec<CellOffset>,
}

impl Grid {
    /// Decompose `simulation_box` in cells at least `cutoff / cell_range`
    /// thick, and find all the cells which can contain neighbors.
    ///
    /// This fails with `Error::Configuration` if the box can not hold a
    /// single cell along one of the axes.
    #[time_graph::instrument(name = "Grid::new")]
    pub fn new(simulation_box: &SimulationBox, parameters: &CellListParameters) -> Result<Grid, Error> {
        parameters.validate()?;

        let faces = simulation_box.distances_between_faces();
        let minimal_size = parameters.minimal_cell_size();

        let mut n_cells = [0.0; 3];
        for axis in 0..3 {
            n_cells[axis] = f64::floor(faces[axis] / minimal_size);
            if !(n_cells[axis] >= 1.0) {
                return Err(Error::Configuration {
                    axis: axis,
                    required: minimal_size,
                    available: faces[axis],
                });
            }
        }

        // limit memory consumption by ensuring we have less than
        // `MAX_NUMBER_OF_CELLS` cells. Cells can only become thicker here.
        let n_cells_total = n_cells[0] * n_cells[1] * n_cells[2];
        let capped_cells = n_cells_total > MAX_NUMBER_OF_CELLS;
        if capped_cells {
            let factor = f64::cbrt(MAX_NUMBER_OF_CELLS / n_cells_total);
            let capped = [
                f64::max(f64::floor(n_cells[0] * factor), 1.0),
                f64::max(f64::floor(n_cells[1] * factor), 1.0),
                f64::max(f64::floor(n_cells[2] * factor), 1.0),
            ];
            debug!(
                "too many cells ({}), using {}x{}x{} cells instead of {}x{}x{}",
                n_cells_total, capped[0], capped[1], capped[2], n_cells[0], n_cells[1], n_cells[2],
            );
            n_cells = capped;
        }

        let interior = [n_cells[0] as usize, n_cells[1] as usize, n_cells[2] as usize];
        let thickness = Vector3D::new(
            faces[0] / n_cells[0],
            faces[1] / n_cells[1],
            faces[2] / n_cells[2],
        );

        let displacements = search_offsets(simulation_box, parameters.cutoff, interior, thickness);

        let mut padding = [0; 3];
        for axis in 0..3 {
            let extent = displacements.iter()
                .map(|displacement| displacement[axis].unsigned_abs())
                .max()
                .unwrap_or(0);

            // thicker cells from the cap reach fewer layers than
            // `cell_range`, only pad with the layers the offsets can reach
            padding[axis] = if simulation_box.is_periodic(axis) && !capped_cells {
                usize::max(parameters.cell_range, extent)
            } else {
                extent
            };
        }

        let dimensions = [
            interior[0] + 2 * padding[0],
            interior[1] + 2 * padding[1],
            interior[2] + 2 * padding[2],
        ];
        let jump = [dimensions[1] * dimensions[2], dimensions[2], 1];

        let offsets = displacements.into_iter()
            .map(|displacement| CellOffset {
                displacement: displacement,
                delta: displacement[0] * jump[0] as isize
                     + displacement[1] * jump[1] as isize
                     + displacement[2] * jump[2] as isize,
            })
            .collect::<Vec<_>>();

        debug!(
            "created cell grid with {}x{}x{} cells (padding {}x{}x{}) and {} neighboring cell offsets",
            interior[0], interior[1], interior[2],
            padding[0], padding[1], padding[2],
            offsets.len(),
        );

        let grid = Grid {
            simulation_box: *simulation_box,
            parameters: *parameters,
            interior: interior,
            padding: padding,
            dimensions: dimensions,
            jump: jump,
            thickness: thickness,
            offsets: offsets,
        };

        if grid.allows_multiple_images() {
            warn!(
                "the cutoff ({}) is larger than half of the box along a periodic \
                axis, multiple periodic images of the same pair will be visited",
                parameters.cutoff
            );
        }

        return Ok(grid);
    }

    /// Get the simulation box used to create this grid
    pub fn simulation_box(&self) -> &SimulationBox {
        &self.simulation_box
    }

    /// Get the parameters used to create this grid
    pub fn parameters(&self) -> &CellListParameters {
        &self.parameters
    }

    /// Get the number of cells inside the box along each axis
    pub fn interior_cells(&self) -> [usize; 3] {
        self.interior
    }

    /// Get the number of padding layers on each side of the box along each
    /// axis
    pub fn padding(&self) -> [usize; 3] {
        self.padding
    }

    /// Get the total number of cells along each axis, including padding
    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    /// Get the strides used to compute flat cell indexes
    pub fn jump(&self) -> [usize; 3] {
        self.jump
    }

    /// Get the total number of cells in the grid, including padding
    pub fn total_cells(&self) -> usize {
        self.dimensions[0] * self.dimensions[1] * self.dimensions[2]
    }

    /// Get the number of cells inside the box
    pub fn interior_count(&self) -> usize {
        self.interior[0] * self.interior[1] * self.interior[2]
    }

    /// Get the thickness of the cells along each axis, measured between
    /// opposite faces
    pub fn cell_thickness(&self) -> Vector3D {
        self.thickness
    }

    /// Get the offsets to all the neighboring cells in the "up" direction.
    /// The offsets in the "down" direction are the reverse of these.
    pub fn offsets(&self) -> &[CellOffset] {
        &self.offsets
    }

    /// Get the number of offsets in the "up" direction
    pub fn offset_count(&self) -> usize {
        self.offsets.len()
    }

    /// Does every periodic axis contain at least `2 * cell_range + 1` cells?
    /// When this is the case, the cells searched around any cell along
    /// periodic axes are all distinct.
    pub fn has_minimum_image_cells(&self) -> bool {
        let required = 2 * self.parameters.cell_range + 1;
        (0..3).all(|axis| !self.simulation_box.is_periodic(axis) || self.interior[axis] >= required)
    }

    /// Is the cutoff larger than half of the box along any periodic axis? In
    /// this case the same pair can be found multiple times, through
    /// different periodic images.
    pub fn allows_multiple_images(&self) -> bool {
        let faces = self.simulation_box.distances_between_faces();
        (0..3).any(|axis| {
            self.simulation_box.is_periodic(axis) && 2.0 * self.parameters.cutoff > faces[axis]
        })
    }

    /// Get the flat index of the interior cell with the given coordinates,
    /// counted from the first interior cell
    pub fn interior_cell(&self, coordinates: [usize; 3]) -> usize {
        debug_assert!((0..3).all(|axis| coordinates[axis] < self.interior[axis]));
        return (coordinates[0] + self.padding[0]) * self.jump[0]
             + (coordinates[1] + self.padding[1]) * self.jump[1]
             + (coordinates[2] + self.padding[2]);
    }

    /// Get the coordinates of the cell with the given flat index in the
    /// padded grid
    pub fn coordinates(&self, cell: usize) -> [usize; 3] {
        debug_assert!(cell < self.total_cells());
        let c0 = cell / self.jump[0];
        let c1 = (cell % self.jump[0]) / self.jump[1];
        let c2 = cell % self.jump[1];
        return [c0, c1, c2];
    }

    /// Get the interior cell containing the given `position`.
    ///
    /// Positions outside of the box (or on the upper faces) are clamped to
    /// the closest interior cell.
    pub fn cell_for_position(&self, position: Vector3D) -> usize {
        self.locate(position).0
    }

    /// Find the interior cell containing `position`, and check if the
    /// position was outside of the box.
    pub(crate) fn locate(&self, position: Vector3D) -> (usize, bool) {
        let fractional = self.simulation_box.fractional(position);

        let mut outside = false;
        let mut coordinates = [0; 3];
        for axis in 0..3 {
            let value = fractional[axis];
            if !(value >= -OUTSIDE_TOLERANCE && value < 1.0 + OUTSIDE_TOLERANCE) {
                outside = true;
            }

            let n = self.interior[axis];
            // NaN becomes 0 here, which is clamped below like any other
            // position outside the box
            let index = f64::floor(value * n as f64) as isize;
            // rounding can put positions just below 1 in cell `n`
            coordinates[axis] = isize::clamp(index, 0, n as isize - 1) as usize;
        }

        return (self.interior_cell(coordinates), outside);
    }
}

/// Find all the cell displacements such that a point in the central cell and
/// a point in the displaced cell can be closer than `cutoff`, keeping only
/// the displacements in the "up" half-space.
///
/// Displacements are searched shell by shell (all displacements with largest
/// component `s` form the shell `s`), until a shell without any admissible
/// displacement. The minimal separation only grows with the components of
/// the displacement, so no further shell could contain one.
fn search_offsets(simulation_box: &SimulationBox, cutoff: f64, interior: [usize; 3], thickness: Vector3D) -> Vec<[isize; 3]> {
    let shape = simulation_box.shape();
    let admissible = |displacement: [isize; 3]| {
        for axis in 0..3 {
            // cells outside of the box do not exist along non-periodic axes
            if !simulation_box.is_periodic(axis) && displacement[axis].unsigned_abs() >= interior[axis] {
                return false;
            }
        }
        return minimal_separation(shape, thickness, displacement) <= cutoff;
    };

    let mut offsets = Vec::new();
    let mut shell: isize = 1;
    loop {
        let mut found = false;
        for d0 in -shell..=shell {
            for d1 in -shell..=shell {
                for d2 in -shell..=shell {
                    let displacement = [d0, d1, d2];
                    let largest = displacement.iter().map(|d| d.abs()).max().unwrap_or(0);
                    if largest != shell || !admissible(displacement) {
                        continue;
                    }

                    found = true;
                    if is_up(displacement) {
                        offsets.push(displacement);
                    }
                }
            }
        }

        if !found {
            break;
        }
        shell += 1;
    }

    return offsets;
}

/// Lower bound on the distance between a point in a cell and a point in
/// another cell displaced by `displacement`.
fn minimal_separation(shape: BoxShape, thickness: Vector3D, displacement: [isize; 3]) -> f64 {
    let mut gaps = [0.0; 3];
    for axis in 0..3 {
        let cells_between = displacement[axis].unsigned_abs().saturating_sub(1);
        gaps[axis] = cells_between as f64 * thickness[axis];
    }

    match shape {
        BoxShape::Orthorhombic => {
            f64::sqrt(gaps[0] * gaps[0] + gaps[1] * gaps[1] + gaps[2] * gaps[2])
        }
        BoxShape::Triclinic => {
            // the gaps are measured along the face normals, which are not
            // orthogonal, so only the largest one is a valid bound
            f64::max(gaps[0], f64::max(gaps[1], gaps[2]))
        }
    }
}

/// Is this displacement in the "up" half of the displacements, i.e. is its
/// first non-zero component positive?
fn is_up(displacement: [isize; 3]) -> bool {
    for value in displacement {
        if value != 0 {
            return value > 0;
        }
    }
    return false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Matrix3;

    use approx::assert_ulps_eq;

    #[test]
    fn cubic_grid() {
        let simulation_box = SimulationBox::cubic(10.0);
        let grid = Grid::new(&simulation_box, &CellListParameters::new(2.5)).unwrap();

        // cells are at least 1.25 thick
        assert_eq!(grid.interior_cells(), [8, 8, 8]);
        assert_ulps_eq!(grid.cell_thickness(), Vector3D::new(1.25, 1.25, 1.25));
        assert_eq!(grid.padding(), [3, 3, 3]);
        assert_eq!(grid.dimensions(), [14, 14, 14]);
        assert_eq!(grid.jump(), [196, 14, 1]);
        assert_eq!(grid.total_cells(), 14 * 14 * 14);
        assert_eq!(grid.interior_count(), 512);

        assert!(grid.has_minimum_image_cells());
        assert!(!grid.allows_multiple_images());
    }

    #[test]
    fn offsets_are_half_of_the_shell() {
        let simulation_box = SimulationBox::cubic(10.0);
        let grid = Grid::new(&simulation_box, &CellListParameters::new(2.5)).unwrap();

        let offsets = grid.offsets();
        for offset in offsets {
            assert!(is_up(offset.displacement));
            let reversed = offset.reversed();
            assert!(!is_up(reversed.displacement));
            assert!(!offsets.contains(&reversed));

            let d = offset.displacement;
            assert_eq!(offset.delta, d[0] * 196 + d[1] * 14 + d[2]);
        }

        // the full shell contains all displacements with components up to 2
        // (5^3 - 1 = 124 cells), plus the displacements with a single
        // component of 3 and the other two components at most 1 in absolute
        // value (6 * 9 = 54 cells)
        assert_eq!(grid.offset_count(), (124 + 54) / 2);

        assert!(offsets.iter().any(|o| o.displacement == [0, 0, 1]));
        assert!(offsets.iter().any(|o| o.displacement == [3, 1, -1]));
        assert!(!offsets.iter().any(|o| o.displacement == [3, 2, 0]));
        assert!(!offsets.iter().any(|o| o.displacement == [0, 0, -1]));
    }

    #[test]
    fn cell_range() {
        let simulation_box = SimulationBox::cubic(10.0);
        let parameters = CellListParameters { cutoff: 2.5, cell_range: 1, exclusion_distance: 0.0 };
        let grid = Grid::new(&simulation_box, &parameters).unwrap();

        assert_eq!(grid.interior_cells(), [4, 4, 4]);
        assert_eq!(grid.padding(), [2, 2, 2]);
        // cells are exactly as thick as the cutoff, so the second layer can
        // contain points exactly at the cutoff, but only along one axis at
        // the time
        assert!(grid.offsets().iter().any(|o| o.displacement == [2, 0, 0]));
        assert!(grid.offsets().iter().any(|o| o.displacement == [1, -1, 2]));
        assert!(!grid.offsets().iter().any(|o| o.displacement == [2, 2, 0]));
        assert_eq!(grid.offset_count(), (26 + 54) / 2);
    }

    #[test]
    fn capped_padding() {
        let simulation_box = SimulationBox::cubic(10.0);
        let parameters = CellListParameters { cutoff: 2.5, cell_range: 1000, exclusion_distance: 0.0 };
        let grid = Grid::new(&simulation_box, &parameters).unwrap();

        // 4000 cells per axis before the cap
        assert!(grid.interior_count() <= MAX_NUMBER_OF_CELLS as usize);
        let interior = grid.interior_cells();
        for axis in 0..3 {
            assert!(interior[axis] >= 99 && interior[axis] <= 100);
            // cells are about 0.1 thick, so the offsets reach 26 layers
            assert!(grid.padding()[axis] <= 27);
            assert!(grid.offsets().iter().any(|o| o.displacement[axis].unsigned_abs() == grid.padding()[axis]));
        }

        assert!(grid.total_cells() < 4 * MAX_NUMBER_OF_CELLS as usize);
    }

    #[test]
    fn too_small_box() {
        let simulation_box = SimulationBox::orthorhombic(10.0, 1.0, 10.0);
        let error = Grid::new(&simulation_box, &CellListParameters::new(3.0)).unwrap_err();
        match error {
            Error::Configuration { axis, required, available } => {
                assert_eq!(axis, 1);
                assert_eq!(required, 1.5);
                assert_eq!(available, 1.0);
            }
            _ => panic!("unexpected error: {:?}", error),
        }

        let error = Grid::new(&simulation_box, &CellListParameters::new(-3.0)).unwrap_err();
        assert!(matches!(error, Error::InvalidParameter(_)));
    }

    #[test]
    fn skewed_box() {
        let simulation_box = SimulationBox::new(Matrix3::new([
            [10.0, 0.0, 0.0],
            [6.0, 8.0, 0.0],
            [0.0, 0.0, 10.0],
        ])).unwrap();
        let grid = Grid::new(&simulation_box, &CellListParameters::new(2.0)).unwrap();

        // the number of cells comes from the distances between faces, not
        // from the edge lengths
        assert_eq!(grid.interior_cells(), [8, 8, 10]);
        assert_ulps_eq!(grid.cell_thickness(), Vector3D::new(1.0, 1.0, 1.0), epsilon = 1e-12);
        assert!(grid.has_minimum_image_cells());
    }

    #[test]
    fn non_periodic_axes() {
        let simulation_box = SimulationBox::cubic(10.0).with_periodicity([false, false, true]);
        let parameters = CellListParameters { cutoff: 12.0, cell_range: 2, exclusion_distance: 0.0 };
        let grid = Grid::new(&simulation_box, &parameters).unwrap();

        assert_eq!(grid.interior_cells(), [1, 1, 1]);
        // no neighbors can exist along the non-periodic axes
        assert_eq!(grid.padding(), [0, 0, 2]);
        let displacements = grid.offsets().iter().map(|o| o.displacement).collect::<Vec<_>>();
        assert_eq!(displacements, [[0, 0, 1], [0, 0, 2]]);

        assert!(!grid.has_minimum_image_cells());
        assert!(grid.allows_multiple_images());
    }

    #[test]
    fn cell_count_cap() {
        let simulation_box = SimulationBox::orthorhombic(1000.0, 1000.0, 2000.0);
        let grid = Grid::new(&simulation_box, &CellListParameters::new(1.0)).unwrap();

        let interior = grid.interior_cells();
        assert!(grid.interior_count() as f64 <= MAX_NUMBER_OF_CELLS);
        assert_eq!(interior[0], interior[1]);
        assert!(interior[2] >= 2 * interior[0] - 1 && interior[2] <= 2 * interior[0] + 1);

        let thickness = grid.cell_thickness();
        for axis in 0..3 {
            assert!(thickness[axis] >= 0.5);
        }
    }

    #[test]
    fn cell_for_position() {
        let simulation_box = SimulationBox::cubic(10.0);
        let grid = Grid::new(&simulation_box, &CellListParameters::new(2.5)).unwrap();

        assert_eq!(grid.cell_for_position(Vector3D::zero()), grid.interior_cell([0, 0, 0]));
        assert_eq!(grid.cell_for_position(Vector3D::new(1.3, 2.5, 9.9)), grid.interior_cell([1, 2, 7]));
        assert_eq!(grid.coordinates(grid.interior_cell([1, 2, 7])), [4, 5, 10]);

        // positions on a cell boundary go in the upper cell
        assert_eq!(grid.cell_for_position(Vector3D::new(1.25, 0.0, 0.0)), grid.interior_cell([1, 0, 0]));

        // positions outside of the box are clamped
        let (cell, outside) = grid.locate(Vector3D::new(10.0, -3.0, 5.0));
        assert!(outside);
        assert_eq!(cell, grid.interior_cell([7, 0, 4]));

        let (cell, outside) = grid.locate(Vector3D::new(f64::NAN, 0.0, 0.0));
        assert!(outside);
        assert_eq!(cell, grid.interior_cell([0, 0, 0]));

        let (_, outside) = grid.locate(Vector3D::new(9.999, 0.0, 0.0));
        assert!(!outside);
    }
}
