//! Spatial reference identifiers and their OGC spellings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Spatial reference in `AUTHORITY:CODE` form, e.g. `EPSG:4326`.
///
/// Geo Engine addresses spatial references by authority and code only, so this
/// keeps the identifier and knows how to spell it for the different OGC services.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpatialReference {
    authority: String,
    code: String,
}

impl SpatialReference {
    /// WGS84 geographic coordinates.
    pub fn epsg4326() -> Self {
        Self {
            authority: "EPSG".to_string(),
            code: "4326".to_string(),
        }
    }

    pub fn new(authority: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            authority: authority.into().to_uppercase(),
            code: code.into(),
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Axis order as OGC services (WMS 1.3.0, WCS 1.1.1) expect it.
    ///
    /// Geographic WGS84 is latitude first; everything else is treated as x/y.
    pub fn ogc_axis_order(&self) -> AxisOrder {
        if self.authority == "EPSG" && self.code == "4326" {
            AxisOrder::LatLon
        } else {
            AxisOrder::XY
        }
    }

    /// Check if this is a geographic (lat/lon) reference.
    pub fn is_y_axis_first(&self) -> bool {
        self.ogc_axis_order() == AxisOrder::LatLon
    }

    /// URN form used by WCS 1.1.1: `urn:ogc:def:crs:EPSG::4326`.
    pub fn to_urn(&self) -> String {
        format!("urn:ogc:def:crs:{}::{}", self.authority, self.code)
    }
}

impl Default for SpatialReference {
    fn default() -> Self {
        Self::epsg4326()
    }
}

impl fmt::Display for SpatialReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

impl FromStr for SpatialReference {
    type Err = SrsParseError;

    /// Accepts `EPSG:4326`, `epsg:4326` and the URN form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Some(rest) = trimmed.strip_prefix("urn:ogc:def:crs:") {
            let mut parts = rest.split(':').filter(|p| !p.is_empty());
            return match (parts.next(), parts.next(), parts.next()) {
                (Some(authority), Some(code), None) => Ok(Self::new(authority, code)),
                _ => Err(SrsParseError::InvalidFormat(s.to_string())),
            };
        }

        match trimmed.split_once(':') {
            Some((authority, code))
                if !authority.is_empty() && !code.is_empty() && !code.contains(':') =>
            {
                Ok(Self::new(authority, code))
            }
            _ => Err(SrsParseError::InvalidFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for SpatialReference {
    type Error = SrsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SpatialReference> for String {
    fn from(value: SpatialReference) -> Self {
        value.to_string()
    }
}

/// Axis order for coordinate interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrder {
    /// X (longitude/easting), Y (latitude/northing)
    XY,
    /// Y (latitude/northing), X (longitude/easting)
    LatLon,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SrsParseError {
    #[error("Invalid spatial reference: {0}. Expected 'AUTHORITY:CODE'")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let srs: SpatialReference = "epsg:3857".parse().unwrap();
        assert_eq!(srs.to_string(), "EPSG:3857");
        assert_eq!(srs.ogc_axis_order(), AxisOrder::XY);
    }

    #[test]
    fn test_urn_round_trip() {
        let srs = SpatialReference::epsg4326();
        assert_eq!(srs.to_urn(), "urn:ogc:def:crs:EPSG::4326");
        let parsed: SpatialReference = srs.to_urn().parse().unwrap();
        assert_eq!(parsed, srs);
        assert!(parsed.is_y_axis_first());
    }

    #[test]
    fn test_reject_garbage() {
        assert!("4326".parse::<SpatialReference>().is_err());
        assert!("EPSG:".parse::<SpatialReference>().is_err());
        assert!("a:b:c".parse::<SpatialReference>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&SpatialReference::epsg4326()).unwrap();
        assert_eq!(json, "\"EPSG:4326\"");
        let back: SpatialReference = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SpatialReference::epsg4326());
    }
}
