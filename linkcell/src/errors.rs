#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Got an invalid parameter value in a function
    InvalidParameter(String),
    /// The simulation box is too small to hold a single cell of the
    /// requested size along `axis`
    Configuration {
        /// index of the offending axis (0, 1 or 2)
        axis: usize,
        /// minimal cell thickness required by the cutoff and cell range
        required: f64,
        /// thickness of the box along this axis
        available: f64,
    },
    /// Error while serializing/deserializing parameters
    Json(serde_json::Error),
    /// Error used for failed internal consistency check, i.e. bugs in the
    /// cell bookkeeping
    Internal(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidParameter(e) => write!(f, "invalid parameter: {}", e),
            Error::Configuration { axis, required, available } => write!(f,
                "configuration error: the box is too small along axis {}, cells \
                must be at least {} thick but only {} is available",
                axis, required, available
            ),
            Error::Json(e) => write!(f, "json error: {}", e),
            Error::Internal(e) => write!(f,
                "internal linkcell error (this is likely a bug, please report it): {}", e
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidParameter(_) |
            Error::Configuration { .. } |
            Error::Internal(_) => None,
            Error::Json(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::Json(error)
    }
}
