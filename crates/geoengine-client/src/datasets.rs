//! Dataset upload, creation, listing and deletion.

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use tracing::{debug, info, instrument};

use geoengine_common::{DatasetName, GeoEngineError, GeoEngineResult, RoleId, UploadId};
use geoengine_protocol::{
    AddDatasetProperties, CreateDataset, CreateDatasetResponse, DataPath, Dataset,
    DatasetDefinition, DatasetListing, DatasetOrder, IdResponse, MetaDataDefinition, OgrOnError,
    OgrSourceColumnSpec, OgrSourceDataset, OgrSourceDatasetTimeType, Permission, Resource, Volume,
};

use crate::permissions::add_permission;
use crate::session::Session;
use crate::vector::FeatureTable;

/// File and layer name uploads are stored under.
const UPLOAD_FILE_NAME: &str = "geo.json";
const UPLOAD_LAYER_NAME: &str = "geo";

/// Server error kinds that mean "no such dataset".
const MISSING_DATASET_KINDS: [&str; 2] = ["NotFound", "CannotLoadDataset"];

/// Options for [`upload_dataframe`].
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOptions {
    /// Server picks a name if `None`
    pub name: Option<DatasetName>,
    pub display_name: String,
    pub description: String,
    /// Which columns hold the features' time
    pub time: OgrSourceDatasetTimeType,
    pub on_error: OgrOnError,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            name: None,
            display_name: "Upload from Rust".to_string(),
            description: "Upload from Rust".to_string(),
            time: OgrSourceDatasetTimeType::None,
            on_error: OgrOnError::Abort,
        }
    }
}

/// Upload a feature table and register it as an OGR dataset.
///
/// Empty tables, tables without a spatial reference and time specs that
/// name missing columns are rejected before anything is sent.
#[instrument(skip(session, table, options), fields(rows = table.len()))]
pub async fn upload_dataframe(
    session: &Session,
    table: &FeatureTable,
    options: UploadOptions,
) -> GeoEngineResult<DatasetName> {
    if table.is_empty() {
        return Err(GeoEngineError::InvalidInput(
            "cannot upload an empty feature table".to_string(),
        ));
    }
    let result_descriptor = table.result_descriptor()?;

    for field in options.time.fields() {
        if table.column(field).is_none() {
            return Err(GeoEngineError::InvalidInput(format!(
                "time column {} is not in the table",
                field
            )));
        }
    }

    let geojson = serde_json::to_vec(&table.to_feature_collection())?;
    let bytes = geojson.len();
    let part = Part::bytes(geojson)
        .file_name(UPLOAD_FILE_NAME)
        .mime_str("application/json")
        .map_err(|e| GeoEngineError::InvalidInput(e.to_string()))?;
    let form = Form::new().part("files[]", part);

    let request = session.request(Method::POST, "upload")?.multipart(form);
    let IdResponse { id: upload_id } = session.send_json::<IdResponse<UploadId>>(request).await?;
    debug!(upload = %upload_id, bytes = bytes, "Uploaded features");

    let loading_info = OgrSourceDataset {
        file_name: UPLOAD_FILE_NAME.to_string(),
        layer_name: UPLOAD_LAYER_NAME.to_string(),
        data_type: Some(result_descriptor.data_type),
        time: options.time,
        columns: Some(OgrSourceColumnSpec::from_columns(&result_descriptor.columns)),
        on_error: options.on_error,
    };

    let mut properties =
        AddDatasetProperties::new(options.display_name, options.description, "OgrSource");
    properties.name = options.name;

    let meta_data = MetaDataDefinition::OgrMetaData {
        loading_info,
        result_descriptor,
    };

    let name = add_dataset(session, DataPath::Upload(upload_id), properties, meta_data).await?;
    info!(dataset = %name, upload = %upload_id, "Dataset uploaded");
    Ok(name)
}

/// `POST /dataset` from a volume or an earlier upload.
#[instrument(skip(session, properties, meta_data))]
pub async fn add_dataset(
    session: &Session,
    data_path: DataPath,
    properties: AddDatasetProperties,
    meta_data: MetaDataDefinition,
) -> GeoEngineResult<DatasetName> {
    let body = CreateDataset {
        data_path,
        definition: DatasetDefinition {
            properties,
            meta_data,
        },
    };

    let request = session.request(Method::POST, "dataset")?.json(&body);
    let CreateDatasetResponse { dataset_name } = session.send_json(request).await?;

    info!(dataset = %dataset_name, "Dataset added");
    Ok(dataset_name)
}

/// Add a dataset and grant permissions on it.
///
/// If `properties` names a dataset that already exists, it is deleted and
/// re-added when `replace_existing` is set and left alone otherwise.
pub async fn add_or_replace_dataset_with_permissions(
    session: &Session,
    data_path: DataPath,
    properties: AddDatasetProperties,
    meta_data: MetaDataDefinition,
    permissions: &[(RoleId, Permission)],
    replace_existing: bool,
) -> GeoEngineResult<DatasetName> {
    if let Some(name) = properties.name.clone() {
        if dataset_info_by_name(session, &name).await?.is_some() {
            if !replace_existing {
                debug!(dataset = %name, "Dataset exists, keeping it");
                return Ok(name);
            }
            delete_dataset(session, &name).await?;
        }
    }

    let name = add_dataset(session, data_path, properties, meta_data).await?;

    let resource = Resource::dataset(name.clone());
    for (role, permission) in permissions {
        add_permission(session, *role, resource.clone(), *permission).await?;
    }

    Ok(name)
}

/// Delete a dataset. Only its owner may do this.
#[instrument(skip(session))]
pub async fn delete_dataset(session: &Session, name: &DatasetName) -> GeoEngineResult<()> {
    let request = session.request(Method::DELETE, &format!("dataset/{}", name))?;
    session.send(request).await?;
    info!(dataset = %name, "Dataset deleted");
    Ok(())
}

/// One page of `GET /datasets`.
pub async fn list_datasets_page(
    session: &Session,
    offset: usize,
    limit: usize,
    order: DatasetOrder,
    name_filter: Option<&str>,
) -> GeoEngineResult<Vec<DatasetListing>> {
    let mut params = vec![
        ("offset", offset.to_string()),
        ("limit", limit.to_string()),
        ("order", order.as_str().to_string()),
    ];
    if let Some(filter) = name_filter {
        params.push(("filter", filter.to_string()));
    }

    let request = session.request(Method::GET, "datasets")?.query(&params);
    session.send_json(request).await
}

/// Up to `limit` datasets starting at `offset`, fetched page by page.
pub async fn list_datasets(
    session: &Session,
    offset: usize,
    limit: usize,
    order: DatasetOrder,
    name_filter: Option<&str>,
) -> GeoEngineResult<Vec<DatasetListing>> {
    let page_size = session.page_size();
    let mut datasets = Vec::new();

    while datasets.len() < limit {
        let page = list_datasets_page(
            session,
            offset + datasets.len(),
            page_size.min(limit - datasets.len()),
            order,
            name_filter,
        )
        .await?;

        let last_page = page.len() < page_size;
        datasets.extend(page);
        if last_page {
            break;
        }
    }

    datasets.truncate(limit);
    Ok(datasets)
}

/// `GET /dataset/{name}`, or `None` if there is no such dataset.
pub async fn dataset_info_by_name(
    session: &Session,
    name: &DatasetName,
) -> GeoEngineResult<Option<Dataset>> {
    none_if_missing(session.get_json(&format!("dataset/{}", name)).await)
}

/// `GET /dataset/{name}/loadingInfo`, or `None` if there is no such dataset.
pub async fn dataset_metadata_by_name(
    session: &Session,
    name: &DatasetName,
) -> GeoEngineResult<Option<MetaDataDefinition>> {
    none_if_missing(
        session
            .get_json(&format!("dataset/{}/loadingInfo", name))
            .await,
    )
}

/// Volumes datasets can be added from.
pub async fn list_volumes(session: &Session) -> GeoEngineResult<Vec<Volume>> {
    session.get_json("dataset/volumes").await
}

pub async fn volume_by_name(session: &Session, name: &str) -> GeoEngineResult<Option<Volume>> {
    let mut matching: Vec<Volume> = list_volumes(session)
        .await?
        .into_iter()
        .filter(|v| v.name == name)
        .collect();

    if matching.len() > 1 {
        return Err(GeoEngineError::InvalidInput(format!(
            "volume name {} is not unique",
            name
        )));
    }
    Ok(matching.pop())
}

fn none_if_missing<T>(result: GeoEngineResult<T>) -> GeoEngineResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err)
            if err
                .server_kind()
                .map_or(false, |kind| MISSING_DATASET_KINDS.contains(&kind)) =>
        {
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
