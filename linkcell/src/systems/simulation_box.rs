//! The `SimulationBox` type represents the enclosing box of a simulated
//! system, with periodic boundary conditions along any subset of its axes.
use std::f64;
use crate::{Error, Matrix3, Vector3D};

/// The shape of a box determines how periodic boundary conditions are
/// computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxShape {
    /// Orthorhombic box, with cuboid shape
    Orthorhombic,
    /// Triclinic box, with arbitrary parallelepiped shape
    Triclinic,
}

/// A `SimulationBox` defines the system physical boundaries.
///
/// The box is the parallelepiped spanned by three edge vectors `a`, `b` and
/// `c`, starting at the origin. Positions inside the box have fractional
/// coordinates in `[0, 1)`. Each axis can be periodic or not; along
/// non-periodic axes the box faces act as walls which particles are expected
/// to stay within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationBox {
    /// Box matrix, the edge vectors are stored as rows
    matrix: Matrix3,
    /// Transpose of the box matrix, cached from matrix
    transpose: Matrix3,
    /// Inverse of the transpose of the box matrix, cached from matrix
    inverse: Matrix3,
    /// Box shape
    shape: BoxShape,
    /// Periodicity along each of the edge vectors
    periodic: [bool; 3],
}

impl SimulationBox {
    /// Create a fully periodic box from the given matrix, where the rows of
    /// the matrix are the edge vectors of the box.
    ///
    /// The edge vectors must form a right-handed set with a positive volume.
    pub fn new(matrix: Matrix3) -> Result<SimulationBox, Error> {
        let all_finite = (0..3).all(|i| Vector3D::from(matrix[i]).is_finite());
        if !all_finite {
            return Err(Error::InvalidParameter(
                "the box matrix contains non-finite values".into()
            ));
        }

        let determinant = matrix.determinant();
        if determinant <= 1e-6 {
            return Err(Error::InvalidParameter(format!(
                "the box matrix must have a positive determinant, got {}", determinant
            )));
        }

        let is_close_0 = |value| f64::abs(value) < 1e-6;
        let is_diagonal = is_close_0(matrix[0][1]) && is_close_0(matrix[0][2]) &&
                          is_close_0(matrix[1][0]) && is_close_0(matrix[1][2]) &&
                          is_close_0(matrix[2][0]) && is_close_0(matrix[2][1]);

        let shape = if is_diagonal {
            BoxShape::Orthorhombic
        } else {
            BoxShape::Triclinic
        };

        return Ok(SimulationBox {
            matrix: matrix,
            transpose: matrix.transposed(),
            inverse: matrix.transposed().inverse(),
            shape: shape,
            periodic: [true, true, true],
        });
    }

    /// Create a fully periodic orthorhombic box, with side lengths `a, b, c`.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> SimulationBox {
        assert!(a > 0.0 && b > 0.0 && c > 0.0, "Box lengths must be positive");
        let matrix = Matrix3::diagonal(a, b, c);
        SimulationBox {
            matrix: matrix,
            transpose: matrix,
            inverse: matrix.inverse(),
            shape: BoxShape::Orthorhombic,
            periodic: [true, true, true],
        }
    }

    /// Create a fully periodic cubic box, with side lengths `length, length,
    /// length`.
    pub fn cubic(length: f64) -> SimulationBox {
        SimulationBox::orthorhombic(length, length, length)
    }

    /// Create a fully periodic triclinic box, with side lengths `a, b, c` and
    /// angles `alpha, beta, gamma` (in degrees).
    pub fn triclinic(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> SimulationBox {
        assert!(a > 0.0 && b > 0.0 && c > 0.0, "Box lengths must be positive");
        let cos_alpha = alpha.to_radians().cos();
        let cos_beta = beta.to_radians().cos();
        let (sin_gamma, cos_gamma) = gamma.to_radians().sin_cos();

        let b_x = b * cos_gamma;
        let b_y = b * sin_gamma;

        let c_x = c * cos_beta;
        let c_y = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let c_z = f64::sqrt(c * c - c_y * c_y - c_x * c_x);

        return SimulationBox::new(Matrix3::new([
            [a,   0.0, 0.0],
            [b_x, b_y, 0.0],
            [c_x, c_y, c_z],
        ])).expect("invalid triclinic box angles");
    }

    /// Get a copy of this box with the given periodicity along each axis
    #[must_use]
    pub fn with_periodicity(mut self, periodic: [bool; 3]) -> SimulationBox {
        self.periodic = periodic;
        return self;
    }

    /// Get the box shape
    pub fn shape(&self) -> BoxShape {
        self.shape
    }

    /// Get the periodicity along each axis
    pub fn periodicity(&self) -> [bool; 3] {
        self.periodic
    }

    /// Is this box periodic along the given `axis`?
    pub fn is_periodic(&self, axis: usize) -> bool {
        self.periodic[axis]
    }

    /// Get the matricial representation of the box, with edge vectors as rows
    pub fn matrix(&self) -> Matrix3 {
        self.matrix
    }

    /// Get the edge vector of the box along the given `axis`
    pub fn edge(&self, axis: usize) -> Vector3D {
        self.matrix[axis].into()
    }

    /// Get the lengths of the three edge vectors of the box
    pub fn lengths(&self) -> Vector3D {
        match self.shape {
            BoxShape::Triclinic => Vector3D::new(
                self.edge(0).norm(), self.edge(1).norm(), self.edge(2).norm()
            ),
            BoxShape::Orthorhombic => Vector3D::new(
                self.matrix[0][0], self.matrix[1][1], self.matrix[2][2]
            ),
        }
    }

    /// Get the angles between edge vectors (in degrees), in the `alpha, beta,
    /// gamma` order.
    pub fn angles(&self) -> Vector3D {
        match self.shape {
            BoxShape::Triclinic => {
                let (a, b, c) = (self.edge(0), self.edge(1), self.edge(2));
                Vector3D::new(
                    angle(b, c).to_degrees(),
                    angle(a, c).to_degrees(),
                    angle(a, b).to_degrees(),
                )
            }
            BoxShape::Orthorhombic => Vector3D::new(90.0, 90.0, 90.0),
        }
    }

    /// Get the volume of the box
    pub fn volume(&self) -> f64 {
        match self.shape {
            BoxShape::Orthorhombic => {
                let lengths = self.lengths();
                lengths[0] * lengths[1] * lengths[2]
            }
            BoxShape::Triclinic => {
                // mixed product of the three edge vectors
                self.edge(0) * (self.edge(1) ^ self.edge(2))
            }
        }
    }

    /// Get the distances between opposite faces of the box.
    ///
    /// Along each axis, this is the component of the corresponding edge
    /// vector orthogonal to the two other edge vectors, i.e. the true
    /// thickness of the box in this direction. For skewed boxes this is
    /// smaller than the edge length.
    pub fn distances_between_faces(&self) -> Vector3D {
        if self.shape == BoxShape::Orthorhombic {
            return self.lengths();
        }

        let (a, b, c) = (self.edge(0), self.edge(1), self.edge(2));
        // normal vectors to the faces
        let na = (b ^ c).normalized();
        let nb = (c ^ a).normalized();
        let nc = (a ^ b).normalized();

        Vector3D::new(f64::abs(na * a), f64::abs(nb * b), f64::abs(nc * c))
    }
}

/// Geometric operations using periodic boundary conditions
impl SimulationBox {
    /// Get the fractional representation of the `vector` in this box
    #[inline]
    pub fn fractional(&self, vector: Vector3D) -> Vector3D {
        // we only have code to multiply a vector by a matrix on the left, so
        // this uses the inverse of the transposed matrix
        return self.inverse * vector;
    }

    /// Get the Cartesian representation of the `fractional` vector in this
    /// box
    #[inline]
    pub fn cartesian(&self, fractional: Vector3D) -> Vector3D {
        return self.transpose * fractional;
    }

    /// Wrap a position inside the box along all periodic axes. For a cubic
    /// box of side length `L`, this produces components in `[0, L)`.
    pub fn wrap_vector(&self, vector: &mut Vector3D) {
        match self.shape {
            BoxShape::Orthorhombic => {
                let lengths = self.lengths();
                for axis in 0..3 {
                    if self.periodic[axis] {
                        vector[axis] -= f64::floor(vector[axis] / lengths[axis]) * lengths[axis];
                    }
                }
            }
            BoxShape::Triclinic => {
                let mut fractional = self.fractional(*vector);
                for axis in 0..3 {
                    if self.periodic[axis] {
                        fractional[axis] -= f64::floor(fractional[axis]);
                    }
                }
                *vector = self.cartesian(fractional);
            }
        }
    }

    /// Find the image of a vector closest to the origin along all periodic
    /// axes. For a cubic box of side length `L`, this produces components in
    /// `[-L/2, L/2]`.
    ///
    /// For very skewed triclinic boxes this is not always the shortest image
    /// of the vector, only the one with the smallest fractional coordinates.
    pub fn vector_image(&self, vector: &mut Vector3D) {
        match self.shape {
            BoxShape::Orthorhombic => {
                let lengths = self.lengths();
                for axis in 0..3 {
                    if self.periodic[axis] {
                        vector[axis] -= f64::round(vector[axis] / lengths[axis]) * lengths[axis];
                    }
                }
            }
            BoxShape::Triclinic => {
                let mut fractional = self.fractional(*vector);
                for axis in 0..3 {
                    if self.periodic[axis] {
                        fractional[axis] -= f64::round(fractional[axis]);
                    }
                }
                *vector = self.cartesian(fractional);
            }
        }
    }

    /// Periodic boundary conditions squared distance between the point `u`
    /// and the point `v`
    pub fn distance2(&self, u: Vector3D, v: Vector3D) -> f64 {
        let mut d = v - u;
        self.vector_image(&mut d);
        return d.norm2();
    }

    /// Periodic boundary conditions distance between the point `u` and the
    /// point `v`
    pub fn distance(&self, u: Vector3D, v: Vector3D) -> f64 {
        return f64::sqrt(self.distance2(u, v));
    }
}

/// Get the angles between the vectors `u` and `v`.
fn angle(u: Vector3D, v: Vector3D) -> f64 {
    let un = u.normalized();
    let vn = v.normalized();
    f64::acos(un * vn)
}
