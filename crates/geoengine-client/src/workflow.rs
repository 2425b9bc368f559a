//! Workflow registration and query execution.
//!
//! A registered workflow is represented by a [`WorkflowHandle`], which knows
//! its declared output type. Every query checks that type before sending
//! anything, so asking a raster workflow for a feature table fails with
//! `SchemaMismatch` without touching the network.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info, instrument};

use geoengine_common::{
    DatasetName, GeoEngineError, GeoEngineResult, QueryRectangle, RasterColorizer, ResultKind,
    WorkflowId,
};
use geoengine_protocol::dataset::RasterQueryRectangle;
use geoengine_protocol::{
    DatasetFromWorkflow, FeatureCollection, IdResponse, PlotOutput, PlotRequest,
    ProvenanceEntry, RasterResultDescriptor, ResultDescriptor, TaskResponse, WcsGetCoverage,
    WfsGetFeature, WmsGetMap, Workflow,
};

use crate::http::{check_ogc_body, decode_json, stream_to_file};
use crate::raster::RasterGrid;
use crate::result::QueryResult;
use crate::session::Session;
use crate::tasks::Task;
use crate::vector::FeatureTable;

/// Register a workflow and return a handle that knows its output type.
///
/// The definition is validated locally first; the server does the
/// authoritative check.
#[instrument(skip(session, workflow), fields(kind = %workflow.kind))]
pub async fn register_workflow(
    session: &Session,
    workflow: &Workflow,
) -> GeoEngineResult<WorkflowHandle> {
    workflow.validate()?;

    let request = session.request(Method::POST, "workflow")?.json(workflow);
    let IdResponse { id } = session.send_json::<IdResponse<WorkflowId>>(request).await?;

    info!(workflow = %id, operator = %workflow.operator.name(), "Workflow registered");

    workflow_by_id(session, id).await
}

/// Register a definition given as JSON.
///
/// A missing or unknown `type`, or a missing `operator`, is rejected with
/// `InvalidInput` before any request is made.
pub async fn register_workflow_json(
    session: &Session,
    definition: Value,
) -> GeoEngineResult<WorkflowHandle> {
    let workflow = Workflow::from_json(definition)?;
    register_workflow(session, &workflow).await
}

/// Handle for a workflow that is already registered.
pub async fn workflow_by_id(session: &Session, id: WorkflowId) -> GeoEngineResult<WorkflowHandle> {
    let result_descriptor = fetch_result_descriptor(session, id).await?;
    Ok(WorkflowHandle {
        id,
        result_descriptor,
    })
}

/// `GET /workflow/{id}/metadata`: the declared output, without executing anything.
#[instrument(skip(session), fields(workflow = %id))]
pub async fn fetch_result_descriptor(
    session: &Session,
    id: WorkflowId,
) -> GeoEngineResult<ResultDescriptor> {
    let descriptor: ResultDescriptor = session
        .get_json(&format!("workflow/{}/metadata", id))
        .await?;
    debug!(kind = %descriptor.kind(), "Fetched result descriptor");
    Ok(descriptor)
}

/// One tile written by [`WorkflowHandle::download_raster_tiled`].
#[derive(Debug, Clone, PartialEq)]
pub struct RasterTile {
    pub row: usize,
    pub col: usize,
    pub query: QueryRectangle,
    pub path: PathBuf,
    pub bytes: u64,
}

/// A registered workflow and its declared output.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowHandle {
    id: WorkflowId,
    result_descriptor: ResultDescriptor,
}

impl WorkflowHandle {
    pub fn new(id: WorkflowId, result_descriptor: ResultDescriptor) -> Self {
        Self {
            id,
            result_descriptor,
        }
    }

    pub fn id(&self) -> WorkflowId {
        self.id
    }

    pub fn kind(&self) -> ResultKind {
        self.result_descriptor.kind()
    }

    /// The declared output, as fetched when the handle was created.
    pub fn get_result_descriptor(&self) -> &ResultDescriptor {
        &self.result_descriptor
    }

    /// The stored definition, `GET /workflow/{id}`.
    pub async fn workflow_definition(&self, session: &Session) -> GeoEngineResult<Workflow> {
        let definition: Value = session.get_json(&format!("workflow/{}", self.id)).await?;
        Ok(Workflow::from_json(definition)?)
    }

    /// Run a vector workflow through WFS and decode the features.
    #[instrument(skip(self, session, query), fields(workflow = %self.id))]
    pub async fn get_dataframe(
        &self,
        session: &Session,
        query: &QueryRectangle,
        resolve_classifications: bool,
    ) -> GeoEngineResult<FeatureTable> {
        let descriptor = self.result_descriptor.as_vector()?;

        let params = WfsGetFeature::from_query(self.id, query).to_query_params();
        let request = session
            .request(Method::GET, &format!("wfs/{}", self.id))?
            .query(&params);

        let body = session.send_bytes(request).await?;
        check_ogc_body(&body)?;
        let collection: FeatureCollection = decode_json(&body)?;

        let mut table = FeatureTable::from_geojson(
            collection,
            Some(query.srs().clone()),
            Some(&descriptor.columns),
        );
        if resolve_classifications {
            table.resolve_classifications(descriptor);
        }

        debug!(rows = table.len(), "Decoded feature table");
        Ok(table)
    }

    /// Render a raster workflow to PNG through WMS.
    #[instrument(skip(self, session, query, colorizer), fields(workflow = %self.id))]
    pub async fn wms_get_map(
        &self,
        session: &Session,
        query: &QueryRectangle,
        colorizer: &RasterColorizer,
    ) -> GeoEngineResult<Vec<u8>> {
        self.result_descriptor.expect_kind(ResultKind::Raster)?;

        let params = WmsGetMap::from_query(self.id, query, colorizer)?.to_query_params();
        let request = session
            .request(Method::GET, &format!("wms/{}", self.id))?
            .query(&params);

        let body = session.send_bytes(request).await?;
        check_ogc_body(&body)?;
        Ok(body.to_vec())
    }

    pub async fn wms_get_map_as_image(
        &self,
        session: &Session,
        query: &QueryRectangle,
        colorizer: &RasterColorizer,
    ) -> GeoEngineResult<DynamicImage> {
        let png = self.wms_get_map(session, query, colorizer).await?;
        image::load_from_memory_with_format(&png, ImageFormat::Png)
            .map_err(|e| GeoEngineError::Decode(format!("invalid PNG from WMS: {}", e)))
    }

    /// Fetch a raster workflow through WCS and decode the first band.
    #[instrument(skip(self, session, query), fields(workflow = %self.id))]
    pub async fn get_raster(
        &self,
        session: &Session,
        query: &QueryRectangle,
        force_no_data: Option<f64>,
    ) -> GeoEngineResult<RasterGrid> {
        let request = self.wcs_request(session, query, force_no_data)?;

        let body = session.send_bytes(request).await?;
        check_ogc_body(&body)?;

        let grid = RasterGrid::decode_geotiff(&body, query.srs().clone())?;
        debug!(width = grid.width(), height = grid.height(), "Decoded raster");
        Ok(grid)
    }

    /// Write the WCS response for `query` to `path` without decoding it.
    /// Returns the number of bytes written.
    #[instrument(skip(self, session, query), fields(workflow = %self.id, path = %path.display()))]
    pub async fn download_raster(
        &self,
        session: &Session,
        query: &QueryRectangle,
        path: &Path,
        force_no_data: Option<f64>,
    ) -> GeoEngineResult<u64> {
        let request = self.wcs_request(session, query, force_no_data)?;
        let response = session.send(request).await?;
        let bytes = stream_to_file(response, path).await?;

        info!(path = %path.display(), bytes = bytes, "Raster downloaded");
        Ok(bytes)
    }

    /// Download `query` as tiles of at most `tile_width` x `tile_height`
    /// pixels, one request per tile, written as `tile_{row}_{col}.tif`.
    ///
    /// Tiles are fetched one after another; a failing tile stops the download
    /// and leaves the tiles written so far in place.
    #[instrument(skip(self, session, query), fields(workflow = %self.id, dir = %dir.display()))]
    pub async fn download_raster_tiled(
        &self,
        session: &Session,
        query: &QueryRectangle,
        tile_width: u32,
        tile_height: u32,
        dir: &Path,
    ) -> GeoEngineResult<Vec<RasterTile>> {
        self.check_raster_query(query)?;
        let tiles = query.split_into_tiles(tile_width, tile_height)?;

        fs::create_dir_all(dir).await?;

        let mut written = Vec::with_capacity(tiles.len());
        for (row, col, tile_query) in tiles {
            let path = dir.join(format!("tile_{}_{}.tif", row, col));
            let request = self.wcs_request(session, &tile_query, None)?;
            let response = session.send(request).await?;
            let bytes = stream_to_file(response, &path).await?;

            info!(row = row, col = col, path = %path.display(), bytes = bytes, "Tile written");

            written.push(RasterTile {
                row,
                col,
                query: tile_query,
                path,
                bytes,
            });
        }

        Ok(written)
    }

    /// Run a plot workflow.
    #[instrument(skip(self, session, query), fields(workflow = %self.id))]
    pub async fn plot_json(
        &self,
        session: &Session,
        query: &QueryRectangle,
    ) -> GeoEngineResult<PlotOutput> {
        self.result_descriptor.expect_kind(ResultKind::Plot)?;

        let params = PlotRequest::from_query(query).to_query_params();
        let request = session
            .request(Method::GET, &format!("plot/{}", self.id))?
            .query(&params);

        session.send_json(request).await
    }

    /// Run a plot workflow and parse its Vega-Lite chart.
    pub async fn plot_chart(
        &self,
        session: &Session,
        query: &QueryRectangle,
    ) -> GeoEngineResult<Value> {
        self.plot_json(session, query).await?.vega_spec()
    }

    /// Citations and licenses of the data the workflow reads.
    pub async fn get_provenance(&self, session: &Session) -> GeoEngineResult<Vec<ProvenanceEntry>> {
        session
            .get_json(&format!("workflow/{}/provenance", self.id))
            .await
    }

    /// Write the zip archive of the workflow's metadata to `path`.
    #[instrument(skip(self, session), fields(workflow = %self.id, path = %path.display()))]
    pub async fn metadata_zip(&self, session: &Session, path: &Path) -> GeoEngineResult<u64> {
        let request = session.request(
            Method::GET,
            &format!("workflow/{}/allMetadata/zip", self.id),
        )?;
        let response = session.send(request).await?;
        stream_to_file(response, path).await
    }

    /// Materialize a raster workflow as a new dataset. The server does this
    /// in a background task.
    #[instrument(skip(self, session, query, display_name, description), fields(workflow = %self.id))]
    pub async fn save_as_dataset(
        &self,
        session: &Session,
        query: &QueryRectangle,
        name: Option<DatasetName>,
        display_name: impl Into<String>,
        description: Option<String>,
    ) -> GeoEngineResult<Task> {
        self.result_descriptor.expect_kind(ResultKind::Raster)?;

        let body = DatasetFromWorkflow {
            name,
            display_name: display_name.into(),
            description,
            query: RasterQueryRectangle::from(query),
        };
        let request = session
            .request(Method::POST, &format!("datasetFromWorkflow/{}", self.id))?
            .json(&body);

        let TaskResponse { task_id } = session.send_json(request).await?;
        info!(task = %task_id, "Dataset task started");
        Ok(Task::new(task_id))
    }

    /// Fetch the result in whatever form the declared output type calls for.
    pub async fn execute(
        &self,
        session: &Session,
        query: &QueryRectangle,
    ) -> GeoEngineResult<QueryResult> {
        match self.kind() {
            ResultKind::Vector => self
                .get_dataframe(session, query, false)
                .await
                .map(QueryResult::Vector),
            ResultKind::Raster => self
                .get_raster(session, query, None)
                .await
                .map(QueryResult::Raster),
            ResultKind::Plot => self.plot_json(session, query).await.map(QueryResult::Plot),
        }
    }

    /// Raster downloads need the query in the workflow's own reference.
    fn check_raster_query(&self, query: &QueryRectangle) -> GeoEngineResult<&RasterResultDescriptor> {
        let descriptor = self.result_descriptor.as_raster()?;
        if query.srs() != &descriptor.spatial_reference {
            return Err(GeoEngineError::InvalidInput(format!(
                "query is in {} but the workflow produces {}",
                query.srs(),
                descriptor.spatial_reference
            )));
        }
        Ok(descriptor)
    }

    fn wcs_request(
        &self,
        session: &Session,
        query: &QueryRectangle,
        force_no_data: Option<f64>,
    ) -> GeoEngineResult<RequestBuilder> {
        self.check_raster_query(query)?;

        let params = WcsGetCoverage::from_query(self.id, query)
            .with_no_data_value(force_no_data)
            .to_query_params();

        Ok(session
            .request(Method::GET, &format!("wcs/{}", self.id))?
            .query(&params))
    }
}
