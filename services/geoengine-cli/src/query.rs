//! Query rectangle arguments shared by the data subcommands.

use anyhow::{Context, Result};
use clap::Args;

use geoengine_common::{
    BoundingBox2D, QueryRectangle, SpatialReference, SpatialResolution, TimeInterval,
};

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Bounds as xmin,ymin,xmax,ymax
    #[arg(long, default_value = "-180,-90,180,90")]
    pub bbox: String,

    /// Instant or start/end in RFC 3339
    #[arg(long)]
    pub time: String,

    /// Pixel size in both directions
    #[arg(long, default_value = "0.1")]
    pub resolution: f64,

    #[arg(long, default_value = "EPSG:4326")]
    pub srs: String,
}

impl QueryArgs {
    pub fn to_query(&self) -> Result<QueryRectangle> {
        let bbox = BoundingBox2D::from_bbox_str(&self.bbox)
            .with_context(|| format!("Invalid --bbox {}", self.bbox))?;
        let time = TimeInterval::from_time_str(&self.time)
            .with_context(|| format!("Invalid --time {}", self.time))?;
        let resolution = SpatialResolution::new(self.resolution, self.resolution)?;
        let srs: SpatialReference = self
            .srs
            .parse()
            .with_context(|| format!("Invalid --srs {}", self.srs))?;

        Ok(QueryRectangle::with_srs(bbox, time, resolution, srs)?)
    }
}
