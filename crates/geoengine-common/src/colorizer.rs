//! Colorizers: mappings from raster values to display colors.
//!
//! The same definition is sent to the server as a WMS `custom:` style and can be
//! applied locally to a decoded raster grid.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An RGBA color, serialized as `[r, g, b, a]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba([r, g, b, a])
    }

    pub const fn transparent() -> Self {
        Rgba([0, 0, 0, 0])
    }

    pub const fn black() -> Self {
        Rgba([0, 0, 0, 255])
    }

    pub const fn white() -> Self {
        Rgba([255, 255, 255, 255])
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`.
    pub fn from_hex(s: &str) -> Result<Self, ColorizerError> {
        let hex = s.trim_start_matches('#');
        if hex.len() != 6 && hex.len() != 8 {
            return Err(ColorizerError::InvalidColor(s.to_string()));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| ColorizerError::InvalidColor(s.to_string()))
        };

        let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, alpha]))
    }

    /// Linear interpolation between two colors, per channel.
    pub fn lerp(&self, other: &Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);

        let lerp_u8 =
            |a: u8, b: u8| -> u8 { ((a as f64) * (1.0 - t) + (b as f64) * t).round() as u8 };

        let mut out = [0u8; 4];
        for (i, channel) in out.iter_mut().enumerate() {
            *channel = lerp_u8(self.0[i], other.0[i]);
        }
        Rgba(out)
    }
}

/// A color at a data value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub value: f64,
    pub color: Rgba,
}

impl Breakpoint {
    pub fn new(value: f64, color: Rgba) -> Self {
        Self { value, color }
    }
}

/// Mapping from a single band's values to colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Colorizer {
    #[serde(rename_all = "camelCase")]
    LinearGradient {
        breakpoints: Vec<Breakpoint>,
        no_data_color: Rgba,
        over_color: Rgba,
        under_color: Rgba,
    },

    /// Interpolates in log10 space; all breakpoints must be positive.
    #[serde(rename_all = "camelCase")]
    LogarithmicGradient {
        breakpoints: Vec<Breakpoint>,
        no_data_color: Rgba,
        over_color: Rgba,
        under_color: Rgba,
    },

    /// Discrete classes. Keys are the class values as strings.
    #[serde(rename_all = "camelCase")]
    Palette {
        colors: BTreeMap<String, Rgba>,
        no_data_color: Rgba,
        default_color: Rgba,
    },
}

impl Colorizer {
    /// Linear gradient spreading `colors` evenly over `[min, max]`.
    ///
    /// Values outside the range take the first/last color; no-data is transparent.
    pub fn linear_with_colors(min: f64, max: f64, colors: &[Rgba]) -> Result<Self, ColorizerError> {
        if colors.len() < 2 {
            return Err(ColorizerError::TooFewBreakpoints(colors.len()));
        }
        if !(min < max) {
            return Err(ColorizerError::InvalidRange { min, max });
        }

        let step = (max - min) / (colors.len() - 1) as f64;
        let breakpoints = colors
            .iter()
            .enumerate()
            .map(|(i, color)| Breakpoint::new(min + step * i as f64, *color))
            .collect();

        let colorizer = Colorizer::LinearGradient {
            breakpoints,
            no_data_color: Rgba::transparent(),
            over_color: colors[colors.len() - 1],
            under_color: colors[0],
        };
        colorizer.validate()?;
        Ok(colorizer)
    }

    /// Palette from `(value, color)` pairs.
    pub fn palette(entries: &[(f64, Rgba)], no_data_color: Rgba, default_color: Rgba) -> Self {
        let colors = entries
            .iter()
            .map(|(value, color)| (format!("{:?}", value), *color))
            .collect();

        Colorizer::Palette {
            colors,
            no_data_color,
            default_color,
        }
    }

    pub fn validate(&self) -> Result<(), ColorizerError> {
        match self {
            Colorizer::LinearGradient { breakpoints, .. } => validate_breakpoints(breakpoints),
            Colorizer::LogarithmicGradient { breakpoints, .. } => {
                validate_breakpoints(breakpoints)?;
                match breakpoints.iter().find(|b| b.value <= 0.0) {
                    Some(b) => Err(ColorizerError::NonPositiveLogBreakpoint(b.value)),
                    None => Ok(()),
                }
            }
            Colorizer::Palette { colors, .. } => {
                for key in colors.keys() {
                    key.parse::<f64>()
                        .map_err(|_| ColorizerError::InvalidPaletteKey(key.clone()))?;
                }
                Ok(())
            }
        }
    }

    pub fn no_data_color(&self) -> Rgba {
        match self {
            Colorizer::LinearGradient { no_data_color, .. }
            | Colorizer::LogarithmicGradient { no_data_color, .. }
            | Colorizer::Palette { no_data_color, .. } => *no_data_color,
        }
    }

    /// Color for a pixel value; `None` is no-data.
    pub fn color_for(&self, value: Option<f64>) -> Rgba {
        let value = match value {
            Some(v) if !v.is_nan() => v,
            _ => return self.no_data_color(),
        };

        match self {
            Colorizer::LinearGradient {
                breakpoints,
                over_color,
                under_color,
                ..
            } => interpolate(breakpoints, value, *under_color, *over_color, |v| v),
            Colorizer::LogarithmicGradient {
                breakpoints,
                over_color,
                under_color,
                ..
            } => {
                if value <= 0.0 {
                    return *under_color;
                }
                interpolate(breakpoints, value, *under_color, *over_color, f64::log10)
            }
            Colorizer::Palette {
                colors,
                default_color,
                ..
            } => colors
                .iter()
                .find(|(key, _)| key.parse::<f64>().map_or(false, |k| k == value))
                .map(|(_, color)| *color)
                .unwrap_or(*default_color),
        }
    }
}

fn validate_breakpoints(breakpoints: &[Breakpoint]) -> Result<(), ColorizerError> {
    if breakpoints.len() < 2 {
        return Err(ColorizerError::TooFewBreakpoints(breakpoints.len()));
    }

    for pair in breakpoints.windows(2) {
        if pair[1].value <= pair[0].value {
            return Err(ColorizerError::UnorderedBreakpoints);
        }
    }

    Ok(())
}

/// Find bracketing breakpoints and blend between them in `scale` space.
fn interpolate<F>(breakpoints: &[Breakpoint], value: f64, under: Rgba, over: Rgba, scale: F) -> Rgba
where
    F: Fn(f64) -> f64,
{
    let (first, last) = match (breakpoints.first(), breakpoints.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return under,
    };

    if value < first.value {
        return under;
    }
    if value > last.value {
        return over;
    }

    for pair in breakpoints.windows(2) {
        let (low, high) = (&pair[0], &pair[1]);
        if value <= high.value {
            let span = scale(high.value) - scale(low.value);
            let t = if span == 0.0 {
                0.0
            } else {
                (scale(value) - scale(low.value)) / span
            };
            return low.color.lerp(&high.color, t);
        }
    }

    last.color
}

/// Multi-band wrapper the WMS `styles` parameter expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RasterColorizer {
    #[serde(rename_all = "camelCase")]
    SingleBand {
        band: u32,
        band_colorizer: Colorizer,
    },
}

impl RasterColorizer {
    pub fn single_band(band: u32, band_colorizer: Colorizer) -> Self {
        RasterColorizer::SingleBand {
            band,
            band_colorizer,
        }
    }

    pub fn band(&self) -> u32 {
        match self {
            RasterColorizer::SingleBand { band, .. } => *band,
        }
    }

    pub fn band_colorizer(&self) -> &Colorizer {
        match self {
            RasterColorizer::SingleBand { band_colorizer, .. } => band_colorizer,
        }
    }

    /// Value of the WMS `styles` parameter: `custom:` followed by the JSON definition.
    pub fn to_wms_style(&self) -> Result<String, ColorizerError> {
        let json =
            serde_json::to_string(self).map_err(|e| ColorizerError::Serialize(e.to_string()))?;
        Ok(format!("custom:{}", json))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ColorizerError {
    #[error("A gradient needs at least 2 breakpoints, got {0}")]
    TooFewBreakpoints(usize),

    #[error("Breakpoints must be in ascending value order")]
    UnorderedBreakpoints,

    #[error("Logarithmic breakpoints must be positive, got {0}")]
    NonPositiveLogBreakpoint(f64),

    #[error("Invalid colorizer range: min {min} must be below max {max}")]
    InvalidRange { min: f64, max: f64 },

    #[error("Invalid palette key: {0}")]
    InvalidPaletteKey(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Failed to serialize colorizer: {0}")]
    Serialize(String),
}

impl From<ColorizerError> for crate::GeoEngineError {
    fn from(err: ColorizerError) -> Self {
        crate::GeoEngineError::InvalidInput(err.to_string())
    }
}
