//! The three kinds of output a workflow can declare.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared output type of a workflow.
///
/// Serializes the way the server spells the top-level workflow `type`
/// (`"Raster"`, `"Vector"`, `"Plot"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultKind {
    Raster,
    Vector,
    Plot,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Raster => "Raster",
            ResultKind::Vector => "Vector",
            ResultKind::Plot => "Plot",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultKind {
    type Err = UnknownResultKind;

    /// Accepts the workflow spelling (`Raster`) as well as the descriptor spelling (`raster`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Raster" | "raster" => Ok(ResultKind::Raster),
            "Vector" | "vector" => Ok(ResultKind::Vector),
            "Plot" | "plot" => Ok(ResultKind::Plot),
            other => Err(UnknownResultKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown workflow type '{0}'. Expected one of Raster, Vector, Plot")]
pub struct UnknownResultKind(pub String);
