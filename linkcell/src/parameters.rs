use crate::Error;

fn default_cell_range() -> usize {
    2
}

/// Parameters controlling the construction of a cell list.
///
/// These can be created directly, or read from JSON:
///
/// ```
/// # use linkcell::CellListParameters;
/// let parameters = CellListParameters::from_json(r#"{"cutoff": 2.5, "cell_range": 3}"#).unwrap();
/// assert_eq!(parameters.cutoff, 2.5);
/// assert_eq!(parameters.cell_range, 3);
/// assert_eq!(parameters.exclusion_distance, 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CellListParameters {
    /// Interaction range. Pairs further apart than this are never reported.
    pub cutoff: f64,
    /// Number of cell layers searched outward from a particle's own cell.
    /// Cells are at least `cutoff / cell_range` thick, so larger values make
    /// smaller cells and a tighter fit of the searched volume to the cutoff
    /// sphere.
    #[serde(default = "default_cell_range")]
    pub cell_range: usize,
    /// Pairs closer than this distance are checked against the exclusion
    /// predicate given to the iterators (used to skip bonded pairs). The
    /// default of 0 disables the check.
    #[serde(default)]
    pub exclusion_distance: f64,
}

impl CellListParameters {
    /// Create parameters with the given `cutoff` and default values for
    /// everything else
    pub fn new(cutoff: f64) -> CellListParameters {
        CellListParameters {
            cutoff: cutoff,
            cell_range: default_cell_range(),
            exclusion_distance: 0.0,
        }
    }

    /// Parse and validate parameters from a JSON string
    pub fn from_json(json: &str) -> Result<CellListParameters, Error> {
        let parameters: CellListParameters = serde_json::from_str(json)?;
        parameters.validate()?;
        return Ok(parameters);
    }

    /// Serialize these parameters to a JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("failed to serialize to JSON")
    }

    /// Check that all the parameters have acceptable values
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.cutoff.is_finite() && self.cutoff > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "cutoff must be a positive finite number, got {}", self.cutoff
            )));
        }

        if self.cell_range == 0 {
            return Err(Error::InvalidParameter(
                "cell_range must be at least 1".into()
            ));
        }

        if !(self.exclusion_distance.is_finite() && self.exclusion_distance >= 0.0) {
            return Err(Error::InvalidParameter(format!(
                "exclusion_distance must be a non-negative finite number, got {}",
                self.exclusion_distance
            )));
        }

        return Ok(());
    }

    /// Minimal thickness of a single cell
    pub fn minimal_cell_size(&self) -> f64 {
        self.cutoff / self.cell_range as f64
    }
}
