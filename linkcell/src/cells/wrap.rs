use crate::Vector3D;
use super::Grid;

/// Marker for cells which do not exist, i.e. cells outside of the box along
/// a non-periodic axis
pub const NO_CELL: usize = usize::MAX;

/// Periodic images of the cells in a `Grid`.
///
/// Every cell of the padded grid refers to a "real" interior cell, possibly
/// through a number of box lengths of wrapping along the periodic axes. The
/// particles of a padding cell are the particles of the real cell, displaced
/// by the corresponding box offset. Box offsets are stored once per
/// combination of wrap counts, and the cells only store an index in this
/// table.
#[derive(Debug, Clone)]
pub struct WrapTable {
    /// Real cell corresponding to each cell in the grid, or `NO_CELL`
    real_cell: Vec<usize>,
    /// Index in `box_offsets` for each cell in the grid
    box_offset_index: Vec<u32>,
    /// Real space displacement for each combination of wrap counts
    box_offsets: Vec<Vector3D>,
    /// Largest number of wraps along each axis
    max_wraps: [usize; 3],
}

impl WrapTable {
    /// Compute the real cell and box offset of all cells in the `grid`
    #[time_graph::instrument(name = "WrapTable::new")]
    pub fn new(grid: &Grid) -> WrapTable {
        let simulation_box = grid.simulation_box();
        let interior = grid.interior_cells();
        let padding = grid.padding();
        let dimensions = grid.dimensions();
        let jump = grid.jump();

        let mut max_wraps = [0; 3];
        for axis in 0..3 {
            if simulation_box.is_periodic(axis) {
                max_wraps[axis] = (padding[axis] + interior[axis] - 1) / interior[axis];
            }
        }

        let wrap_counts = [2 * max_wraps[0] + 1, 2 * max_wraps[1] + 1, 2 * max_wraps[2] + 1];
        let mut box_offsets = Vec::with_capacity(wrap_counts[0] * wrap_counts[1] * wrap_counts[2]);
        for w0 in 0..wrap_counts[0] {
            for w1 in 0..wrap_counts[1] {
                for w2 in 0..wrap_counts[2] {
                    let wraps = [
                        w0 as f64 - max_wraps[0] as f64,
                        w1 as f64 - max_wraps[1] as f64,
                        w2 as f64 - max_wraps[2] as f64,
                    ];
                    box_offsets.push(
                        wraps[0] * simulation_box.edge(0)
                        + wraps[1] * simulation_box.edge(1)
                        + wraps[2] * simulation_box.edge(2)
                    );
                }
            }
        }

        let total_cells = grid.total_cells();
        let mut real_cell = vec![NO_CELL; total_cells];
        let mut box_offset_index = vec![0; total_cells];

        for c0 in 0..dimensions[0] {
            for c1 in 0..dimensions[1] {
                for c2 in 0..dimensions[2] {
                    let coordinates = [c0, c1, c2];
                    let cell = c0 * jump[0] + c1 * jump[1] + c2;

                    let mut real = 0;
                    let mut offset_index = 0;
                    let mut exists = true;
                    for axis in 0..3 {
                        let n = interior[axis] as isize;
                        let index = coordinates[axis] as isize - padding[axis] as isize;

                        let (wrap, real_index) = if simulation_box.is_periodic(axis) {
                            (index.div_euclid(n), index.rem_euclid(n))
                        } else if index < 0 || index >= n {
                            exists = false;
                            break;
                        } else {
                            (0, index)
                        };

                        real += (real_index as usize + padding[axis]) * jump[axis];
                        let wrap_stride = match axis {
                            0 => wrap_counts[1] * wrap_counts[2],
                            1 => wrap_counts[2],
                            _ => 1,
                        };
                        offset_index += (wrap + max_wraps[axis] as isize) as usize * wrap_stride;
                    }

                    if exists {
                        real_cell[cell] = real;
                        box_offset_index[cell] = offset_index as u32;
                    }
                }
            }
        }

        return WrapTable {
            real_cell: real_cell,
            box_offset_index: box_offset_index,
            box_offsets: box_offsets,
            max_wraps: max_wraps,
        };
    }

    /// Get the interior cell that `cell` is a periodic image of, or `NO_CELL`
    /// if this cell is outside of the box along a non-periodic axis.
    #[inline]
    pub fn real_cell(&self, cell: usize) -> usize {
        self.real_cell[cell]
    }

    /// Get the displacement to add to the positions of the particles in the
    /// real cell to get their image in `cell`
    #[inline]
    pub fn box_offset(&self, cell: usize) -> Vector3D {
        self.box_offsets[self.box_offset_index[cell] as usize]
    }

    /// Get the number of distinct box offsets
    pub fn box_offset_count(&self) -> usize {
        self.box_offsets.len()
    }

    /// Get the largest number of box lengths any cell is wrapped by, along
    /// each axis
    pub fn max_wraps(&self) -> [usize; 3] {
        self.max_wraps
    }
}
