//! Raster grids decoded from WCS GeoTIFF responses.

use std::io::Cursor;

use image::RgbaImage;
use num_traits::ToPrimitive;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use geoengine_common::{BoundingBox2D, Colorizer, GeoEngineError, GeoEngineResult, SpatialReference};

/// GeoTIFF `ModelPixelScaleTag`.
pub const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
/// GeoTIFF `ModelTiepointTag`.
pub const MODEL_TIEPOINT_TAG: u16 = 33922;
/// GDAL's no-data value, stored as an ASCII number.
pub const GDAL_NODATA_TAG: u16 = 42113;

/// Affine transform of a north-up raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// World x of the upper-left corner
    pub origin_x: f64,
    /// World y of the upper-left corner
    pub origin_y: f64,
    pub pixel_width: f64,
    /// Negative for north-up rasters
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// From GeoTIFF pixel scale and tiepoint tag values.
    pub fn from_tags(scale: &[f64], tiepoint: &[f64]) -> Option<Self> {
        if scale.len() < 2 || tiepoint.len() < 6 {
            return None;
        }
        Some(Self::new(
            tiepoint[3] - tiepoint[0] * scale[0],
            tiepoint[4] + tiepoint[1] * scale[1],
            scale[0],
            -scale[1],
        ))
    }

    /// World coordinate of a pixel's upper-left corner.
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width,
            self.origin_y + row * self.pixel_height,
        )
    }
}

/// A single-band raster with an optional no-data sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    width: usize,
    height: usize,
    /// Row-major, `width * height` values
    data: Vec<f64>,
    no_data: Option<f64>,
    transform: Option<GeoTransform>,
    spatial_reference: SpatialReference,
}

impl RasterGrid {
    pub fn new(
        width: usize,
        height: usize,
        data: Vec<f64>,
        spatial_reference: SpatialReference,
    ) -> GeoEngineResult<Self> {
        if data.len() != width * height {
            return Err(GeoEngineError::InvalidInput(format!(
                "{}x{} raster needs {} values, got {}",
                width,
                height,
                width * height,
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            data,
            no_data: None,
            transform: None,
            spatial_reference,
        })
    }

    pub fn with_no_data(mut self, no_data: Option<f64>) -> Self {
        self.no_data = no_data;
        self
    }

    pub fn with_transform(mut self, transform: GeoTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Decode the first band of a GeoTIFF.
    ///
    /// The no-data value comes from the `GDAL_NODATA` tag and the transform
    /// from the pixel scale and tiepoint tags, if present.
    pub fn decode_geotiff(bytes: &[u8], spatial_reference: SpatialReference) -> GeoEngineResult<Self> {
        let mut decoder = Decoder::new(Cursor::new(bytes))
            .map_err(|e| GeoEngineError::Decode(format!("TIFF decode error: {}", e)))?;

        let (width, height) = decoder
            .dimensions()
            .map_err(|e| GeoEngineError::Decode(format!("Cannot read dimensions: {}", e)))?;
        let (width, height) = (width as usize, height as usize);

        let samples = match decoder
            .read_image()
            .map_err(|e| GeoEngineError::Decode(format!("Cannot read image data: {}", e)))?
        {
            DecodingResult::U8(buf) => to_f64(buf),
            DecodingResult::U16(buf) => to_f64(buf),
            DecodingResult::U32(buf) => to_f64(buf),
            DecodingResult::U64(buf) => to_f64(buf),
            DecodingResult::I8(buf) => to_f64(buf),
            DecodingResult::I16(buf) => to_f64(buf),
            DecodingResult::I32(buf) => to_f64(buf),
            DecodingResult::I64(buf) => to_f64(buf),
            DecodingResult::F32(buf) => to_f64(buf),
            DecodingResult::F64(buf) => buf,
        };

        let pixels = width * height;
        if pixels == 0 || samples.len() % pixels != 0 {
            return Err(GeoEngineError::Decode(format!(
                "{} samples don't fill a {}x{} raster",
                samples.len(),
                width,
                height
            )));
        }

        // pixel-interleaved bands: keep band 1
        let band_count = samples.len() / pixels;
        let data = if band_count == 1 {
            samples
        } else {
            samples.into_iter().step_by(band_count).collect()
        };

        let no_data = decoder
            .get_tag_ascii_string(Tag::from_u16_exhaustive(GDAL_NODATA_TAG))
            .ok()
            .and_then(|s| s.trim_matches(char::from(0)).trim().parse::<f64>().ok());

        let scale = decoder
            .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE_TAG))
            .ok();
        let tiepoint = decoder
            .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT_TAG))
            .ok();
        let transform = match (scale, tiepoint) {
            (Some(scale), Some(tiepoint)) => GeoTransform::from_tags(&scale, &tiepoint),
            _ => None,
        };

        Ok(Self {
            width,
            height,
            data,
            no_data,
            transform,
            spatial_reference,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn no_data(&self) -> Option<f64> {
        self.no_data
    }

    pub fn transform(&self) -> Option<&GeoTransform> {
        self.transform.as_ref()
    }

    pub fn spatial_reference(&self) -> &SpatialReference {
        &self.spatial_reference
    }

    pub fn is_no_data(&self, value: f64) -> bool {
        value.is_nan() || self.no_data.map_or(false, |nd| nd == value)
    }

    /// Value at a pixel; `None` outside the grid or for no-data.
    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let value = self.data[row * self.width + col];
        if self.is_no_data(value) {
            None
        } else {
            Some(value)
        }
    }

    /// Smallest and largest valid value.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .copied()
            .filter(|v| !self.is_no_data(*v))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((min, max)) => Some((min.min(v), max.max(v))),
            })
    }

    /// World extent, if the grid is georeferenced.
    pub fn bounds(&self) -> Option<BoundingBox2D> {
        let transform = self.transform?;
        let (x0, y0) = transform.pixel_to_world(0.0, 0.0);
        let (x1, y1) = transform.pixel_to_world(self.width as f64, self.height as f64);
        Some(BoundingBox2D::new_unchecked(
            x0.min(x1),
            y0.min(y1),
            x0.max(x1),
            y0.max(y1),
        ))
    }

    /// Render with a colorizer; no-data pixels take its no-data color.
    pub fn render(&self, colorizer: &Colorizer) -> RgbaImage {
        RgbaImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let color = colorizer.color_for(self.get(x as usize, y as usize));
            image::Rgba(color.0)
        })
    }
}

fn to_f64<T: ToPrimitive>(buf: Vec<T>) -> Vec<f64> {
    buf.into_iter()
        .map(|v| v.to_f64().unwrap_or(f64::NAN))
        .collect()
}
