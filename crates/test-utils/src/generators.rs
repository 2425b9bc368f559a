//! Generators for the binary bodies Geo Engine answers with.
//!
//! WCS coverages come back as GeoTIFF, WMS maps as PNG.

use std::io::Cursor;

use image::{ImageOutputFormat, Rgba, RgbaImage};
use tiff::encoder::{colortype::Gray32Float, TiffEncoder};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
const MODEL_TIEPOINT_TAG: u16 = 33922;
const GDAL_NODATA_TAG: u16 = 42113;

/// Creates a grid with predictable values.
///
/// Each cell value is `col * 1000 + row`, so a misplaced pixel is easy to spot.
/// Values are in row-major order.
///
/// ```
/// use test_utils::generators::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0);
/// assert_eq!(grid[10], 1.0);
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Builds a single band `f32` GeoTIFF in memory.
///
/// ```
/// use test_utils::generators::GeoTiffBuilder;
///
/// let tiff = GeoTiffBuilder::new(2, 2)
///     .values(vec![1.0, 2.0, 3.0, 4.0])
///     .origin(-180.0, 90.0)
///     .pixel_size(180.0, 90.0)
///     .build();
/// assert!(tiff.starts_with(b"II*\0"));
/// ```
#[derive(Debug, Clone)]
pub struct GeoTiffBuilder {
    width: u32,
    height: u32,
    values: Vec<f32>,
    origin: (f64, f64),
    pixel_size: (f64, f64),
    no_data: Option<f64>,
}

impl GeoTiffBuilder {
    /// Starts from [`create_test_grid`] values covering the whole globe.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            values: create_test_grid(width as usize, height as usize),
            origin: (-180.0, 90.0),
            pixel_size: (360.0 / width.max(1) as f64, 180.0 / height.max(1) as f64),
            no_data: None,
        }
    }

    /// Row-major pixel values; must hold `width * height` entries.
    pub fn values(mut self, values: Vec<f32>) -> Self {
        self.values = values;
        self
    }

    /// World coordinate of the upper left corner.
    pub fn origin(mut self, x: f64, y: f64) -> Self {
        self.origin = (x, y);
        self
    }

    /// Pixel size; `y` is positive and counts downwards.
    pub fn pixel_size(mut self, x: f64, y: f64) -> Self {
        self.pixel_size = (x, y);
        self
    }

    /// Writes the GDAL no-data tag.
    pub fn no_data(mut self, value: f64) -> Self {
        self.no_data = Some(value);
        self
    }

    pub fn build(self) -> Vec<u8> {
        assert_eq!(
            self.values.len(),
            (self.width * self.height) as usize,
            "values don't fill a {}x{} raster",
            self.width,
            self.height
        );

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut buffer).unwrap();
            let mut image = encoder
                .new_image::<Gray32Float>(self.width, self.height)
                .unwrap();

            let scale = [self.pixel_size.0, self.pixel_size.1, 0.0];
            let tiepoint = [0.0, 0.0, 0.0, self.origin.0, self.origin.1, 0.0];
            let directory = image.encoder();
            directory
                .write_tag(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE_TAG), &scale[..])
                .unwrap();
            directory
                .write_tag(Tag::from_u16_exhaustive(MODEL_TIEPOINT_TAG), &tiepoint[..])
                .unwrap();
            if let Some(no_data) = self.no_data {
                directory
                    .write_tag(
                        Tag::from_u16_exhaustive(GDAL_NODATA_TAG),
                        no_data.to_string().as_str(),
                    )
                    .unwrap();
            }

            image.write_data(&self.values).unwrap();
        }
        buffer.into_inner()
    }
}

/// A PNG filled with one color, as a WMS map would be.
pub fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageOutputFormat::Png).unwrap();
    buffer.into_inner()
}
