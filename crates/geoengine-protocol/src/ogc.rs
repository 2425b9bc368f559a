//! OGC request parameters for the per-workflow WFS, WMS and WCS endpoints.
//!
//! Each request is built from a workflow id and a [`QueryRectangle`] and
//! turned into KVP query parameters with `to_query_params`. Floats are
//! written with `Debug` formatting so whole numbers keep their `.0`.

use geoengine_common::{QueryRectangle, RasterColorizer, WorkflowId};

/// Query parameters as sent on the wire.
pub type QueryParams = Vec<(&'static str, String)>;

/// WFS 2.0.0 GetFeature against `/wfs/{workflow}`.
#[derive(Debug, Clone, PartialEq)]
pub struct WfsGetFeature {
    /// Workflow id, used as the feature type name
    pub type_names: WorkflowId,
    /// `xmin,ymin,xmax,ymax` (never axis-swapped for WFS)
    pub bbox: String,
    /// Instant or `start/end`
    pub time: String,
    pub srs_name: String,
    /// Resolution for raster inputs of vector operators
    pub query_resolution: String,
}

impl WfsGetFeature {
    pub const VERSION: &'static str = "2.0.0";

    pub fn from_query(workflow: WorkflowId, query: &QueryRectangle) -> Self {
        Self {
            type_names: workflow,
            bbox: query.bbox_str(),
            time: query.time_str(),
            srs_name: query.srs().to_string(),
            query_resolution: query.resolution().to_string(),
        }
    }

    pub fn to_query_params(&self) -> QueryParams {
        vec![
            ("version", Self::VERSION.to_string()),
            ("service", "WFS".to_string()),
            ("request", "GetFeature".to_string()),
            ("typeNames", self.type_names.to_string()),
            ("bbox", self.bbox.clone()),
            ("time", self.time.clone()),
            ("srsName", self.srs_name.clone()),
            ("queryResolution", self.query_resolution.clone()),
        ]
    }
}

/// Image formats the WMS endpoint can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapFormat {
    #[default]
    Png,
}

impl MapFormat {
    pub fn to_mime(&self) -> &'static str {
        match self {
            MapFormat::Png => "image/png",
        }
    }
}

/// WMS 1.3.0 GetMap against `/wms/{workflow}`.
#[derive(Debug, Clone, PartialEq)]
pub struct WmsGetMap {
    /// Workflow id, used as the layer name
    pub layers: WorkflowId,
    /// Map width in pixels
    pub width: u32,
    /// Map height in pixels
    pub height: u32,
    /// Bounds in the OGC axis order of `crs`
    pub bbox: String,
    pub crs: String,
    /// `custom:{colorizer json}`
    pub styles: String,
    pub time: String,
    pub format: MapFormat,
}

impl WmsGetMap {
    pub const VERSION: &'static str = "1.3.0";

    /// Size the map so one pixel covers one resolution cell of the query.
    pub fn from_query(
        workflow: WorkflowId,
        query: &QueryRectangle,
        colorizer: &RasterColorizer,
    ) -> geoengine_common::GeoEngineResult<Self> {
        let (width, height) = query.pixel_size();
        if width == 0 || height == 0 {
            return Err(geoengine_common::GeoEngineError::InvalidInput(format!(
                "query {} is smaller than one pixel",
                query
            )));
        }

        Ok(Self {
            layers: workflow,
            width,
            height,
            bbox: query.bbox_ogc_str(),
            crs: query.srs().to_string(),
            styles: colorizer.to_wms_style()?,
            time: query.time_str(),
            format: MapFormat::Png,
        })
    }

    pub fn to_query_params(&self) -> QueryParams {
        vec![
            ("version", Self::VERSION.to_string()),
            ("service", "WMS".to_string()),
            ("request", "GetMap".to_string()),
            ("width", self.width.to_string()),
            ("height", self.height.to_string()),
            ("bbox", self.bbox.clone()),
            ("format", self.format.to_mime().to_string()),
            ("layers", self.layers.to_string()),
            ("crs", self.crs.clone()),
            ("styles", self.styles.clone()),
            ("time", self.time.clone()),
        ]
    }
}

/// WCS 1.1.1 GetCoverage against `/wcs/{workflow}`.
#[derive(Debug, Clone, PartialEq)]
pub struct WcsGetCoverage {
    /// Workflow id, used as the coverage identifier
    pub identifier: WorkflowId,
    /// Bounds in the OGC axis order of the reference
    pub bounding_box: String,
    pub time_sequence: String,
    /// Reference as an OGC URN, e.g. `urn:ogc:def:crs:EPSG::4326`
    pub crs: String,
    /// First and second axis offsets in OGC axis order
    pub resolution: (f64, f64),
    /// Replace the coverage's no-data value
    pub no_data_value: Option<f64>,
}

impl WcsGetCoverage {
    pub const VERSION: &'static str = "1.1.1";
    /// The endpoint only encodes GeoTIFF.
    pub const FORMAT: &'static str = "image/tiff";

    pub fn from_query(workflow: WorkflowId, query: &QueryRectangle) -> Self {
        Self {
            identifier: workflow,
            bounding_box: query.bbox_ogc_str(),
            time_sequence: query.time_str(),
            crs: query.srs().to_urn(),
            resolution: query.resolution_ogc(),
            no_data_value: None,
        }
    }

    pub fn with_no_data_value(mut self, no_data_value: Option<f64>) -> Self {
        self.no_data_value = no_data_value;
        self
    }

    pub fn to_query_params(&self) -> QueryParams {
        let mut params = vec![
            ("version", Self::VERSION.to_string()),
            ("request", "GetCoverage".to_string()),
            ("service", "WCS".to_string()),
            ("identifier", self.identifier.to_string()),
            ("boundingbox", self.bounding_box.clone()),
            ("timesequence", self.time_sequence.clone()),
            ("format", Self::FORMAT.to_string()),
            ("crs", self.crs.clone()),
            ("resx", format!("{:?}", self.resolution.0)),
            ("resy", format!("{:?}", self.resolution.1)),
        ];
        if let Some(no_data) = self.no_data_value {
            params.push(("nodatavalue", format!("{:?}", no_data)));
        }
        params
    }
}

/// Plot request against `/plot/{workflow}`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRequest {
    /// `xmin,ymin,xmax,ymax`
    pub bbox: String,
    pub crs: String,
    pub time: String,
    pub spatial_resolution: String,
}

impl PlotRequest {
    pub fn from_query(query: &QueryRectangle) -> Self {
        Self {
            bbox: query.bbox_str(),
            crs: query.srs().to_string(),
            time: query.time_str(),
            spatial_resolution: query.resolution().to_string(),
        }
    }

    pub fn to_query_params(&self) -> QueryParams {
        vec![
            ("bbox", self.bbox.clone()),
            ("crs", self.crs.clone()),
            ("time", self.time.clone()),
            ("spatialResolution", self.spatial_resolution.clone()),
        ]
    }
}
