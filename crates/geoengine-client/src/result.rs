//! Results of executing a workflow.

use geoengine_common::ResultKind;
use geoengine_protocol::PlotOutput;

use crate::raster::RasterGrid;
use crate::vector::FeatureTable;

/// What [`WorkflowHandle::execute`](crate::WorkflowHandle::execute) returns,
/// chosen by the workflow's declared output type.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Vector(FeatureTable),
    Raster(RasterGrid),
    Plot(PlotOutput),
}

impl QueryResult {
    pub fn kind(&self) -> ResultKind {
        match self {
            QueryResult::Vector(_) => ResultKind::Vector,
            QueryResult::Raster(_) => ResultKind::Raster,
            QueryResult::Plot(_) => ResultKind::Plot,
        }
    }

    pub fn into_vector(self) -> Option<FeatureTable> {
        match self {
            QueryResult::Vector(table) => Some(table),
            _ => None,
        }
    }

    pub fn into_raster(self) -> Option<RasterGrid> {
        match self {
            QueryResult::Raster(grid) => Some(grid),
            _ => None,
        }
    }

    pub fn into_plot(self) -> Option<PlotOutput> {
        match self {
            QueryResult::Plot(plot) => Some(plot),
            _ => None,
        }
    }
}
