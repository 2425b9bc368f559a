//! Plot responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use geoengine_common::{GeoEngineError, GeoEngineResult};

/// Output of `GET /plot/{workflow}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotOutput {
    /// E.g. "JsonVega" or "JsonPlain"
    pub output_format: String,
    pub plot_type: String,
    pub data: Value,
}

impl PlotOutput {
    /// Parse the Vega-Lite chart embedded as a JSON string in `data.vegaString`.
    pub fn vega_spec(&self) -> GeoEngineResult<Value> {
        let vega = self
            .data
            .get("vegaString")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                GeoEngineError::Decode(format!(
                    "{} plot output has no vegaString",
                    self.output_format
                ))
            })?;

        serde_json::from_str(vega)
            .map_err(|e| GeoEngineError::Decode(format!("invalid vega chart: {}", e)))
    }
}
