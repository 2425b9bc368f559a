//! Transport helpers: client construction, status checks and body decoding.

use std::path::Path;

use bytes::Bytes;
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use geoengine_common::{GeoEngineError, GeoEngineResult};
use geoengine_protocol::exceptions::ogc_error_from_body;
use geoengine_protocol::{ErrorResponse, ServiceException};

use crate::config::ClientConfig;

/// Longest body excerpt quoted in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Build the reqwest client a session uses for all its requests.
pub(crate) fn build_client(config: &ClientConfig) -> GeoEngineResult<Client> {
    Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|e| GeoEngineError::Connection(format!("Failed to create HTTP client: {}", e)))
}

/// Strip trailing slashes so paths can be appended with a single `/`.
pub(crate) fn normalize_base_url(url: &str) -> GeoEngineResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(GeoEngineError::InvalidInput(format!(
            "server url must start with http:// or https://, got {:?}",
            url
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base, path.trim_start_matches('/'))
}

pub(crate) fn transport_error(err: reqwest::Error) -> GeoEngineError {
    if err.is_decode() {
        GeoEngineError::Decode(err.to_string())
    } else if err.is_timeout() {
        GeoEngineError::Connection(format!("request timed out: {}", err))
    } else {
        GeoEngineError::Connection(err.to_string())
    }
}

/// Pass successful responses through; turn everything else into an error
/// built from the body.
pub(crate) async fn check_status(response: Response) -> GeoEngineResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.map_err(transport_error)?;
    debug!(status = status.as_u16(), bytes = body.len(), "Request failed");
    Err(error_from_body(status, &body))
}

/// Map a failed response to `Server`: JSON error bodies first, then OGC
/// exception reports, then whatever text the server sent.
pub(crate) fn error_from_body(status: StatusCode, body: &[u8]) -> GeoEngineError {
    let code = Some(status.as_u16());

    if let Some(error) = ErrorResponse::parse(body) {
        return error.into_error(code);
    }
    if ServiceException::is_ogc_error(body) {
        return ogc_error_from_body(body, code);
    }

    let kind = status
        .canonical_reason()
        .map(|r| r.replace(' ', ""))
        .unwrap_or_else(|| "HttpError".to_string());
    let text = String::from_utf8_lossy(body);
    let message = if text.trim().is_empty() {
        status.to_string()
    } else {
        excerpt(text.trim())
    };
    GeoEngineError::server(kind, message, code)
}

/// Decode a JSON body. Some endpoints answer with `{error, message}` and a
/// 200 status, so that shape is tried before giving up.
pub(crate) fn decode_json<T: DeserializeOwned>(body: &[u8]) -> GeoEngineResult<T> {
    match serde_json::from_slice(body) {
        Ok(value) => Ok(value),
        Err(err) => match ErrorResponse::parse(body) {
            Some(error) => Err(error.into_error(None)),
            None => Err(GeoEngineError::Decode(format!(
                "{} in {}",
                err,
                excerpt(&String::from_utf8_lossy(body))
            ))),
        },
    }
}

/// Fail if an OGC endpoint answered with an exception report instead of data.
pub(crate) fn check_ogc_body(body: &[u8]) -> GeoEngineResult<()> {
    if ServiceException::is_ogc_error(body) {
        return Err(ogc_error_from_body(body, None));
    }
    Ok(())
}

/// Stream a response body to `path`, returning the number of bytes written.
///
/// The first chunk is checked for an OGC exception report; in that case the
/// rest of the body is collected into the error and nothing is written.
pub(crate) async fn stream_to_file(response: Response, path: &Path) -> GeoEngineResult<u64> {
    let mut stream = response.bytes_stream();

    let first: Bytes = match stream.next().await {
        Some(chunk) => chunk.map_err(transport_error)?,
        None => Bytes::new(),
    };

    if ServiceException::is_ogc_error(&first) {
        let mut body = first.to_vec();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk.map_err(transport_error)?);
        }
        return Err(ogc_error_from_body(&body, None));
    }

    let mut file = File::create(path).await?;
    file.write_all(&first).await?;
    let mut written = first.len() as u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(transport_error)?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;

    Ok(written)
}

fn excerpt(text: &str) -> String {
    if text.len() <= MAX_ERROR_BODY {
        return text.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
