//! Server error bodies.
//!
//! REST endpoints answer failures with `{"error": ..., "message": ...}`.
//! The OGC endpoints may instead answer with a `ServiceExceptionReport`
//! XML document, sometimes even with a 200 status.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use geoengine_common::error::OGC_SERVICE_EXCEPTION;
use geoengine_common::GeoEngineError;

/// JSON error body of the REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

impl ErrorResponse {
    /// Parse a body if it is a JSON object with an `error` member.
    pub fn parse(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    pub fn into_error(self, status: Option<u16>) -> GeoEngineError {
        GeoEngineError::server(self.error, self.message, status)
    }
}

/// The first `ServiceException` of an OGC `ServiceExceptionReport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceException {
    /// The `code` attribute, if present.
    pub code: Option<String>,
    pub text: String,
}

impl ServiceException {
    /// Whether a response body looks like an XML document rather than the
    /// image or coverage that was asked for.
    pub fn is_ogc_error(body: &[u8]) -> bool {
        let start = body
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(body.len());
        let trimmed = &body[start..];
        trimmed.starts_with(b"<?xml") || trimmed.starts_with(b"<ServiceExceptionReport")
    }

    /// Extract the first `ServiceException` element.
    pub fn parse(xml: &str) -> Result<Self, quick_xml::Error> {
        let mut reader = Reader::from_str(xml.trim_start());
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut in_exception = false;
        let mut code = None;
        let mut text = String::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) if e.local_name().as_ref() == b"ServiceException" => {
                    in_exception = true;
                    for attr in e.attributes().flatten() {
                        if attr.key.local_name().as_ref() == b"code" {
                            code = Some(String::from_utf8_lossy(&attr.value).into_owned());
                        }
                    }
                }
                Event::Text(t) if in_exception => {
                    text.push_str(&t.unescape()?);
                }
                Event::CData(t) if in_exception => {
                    text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
                Event::End(e) if e.local_name().as_ref() == b"ServiceException" => break,
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(Self {
            code,
            text: text.trim().to_string(),
        })
    }

    pub fn into_error(self, status: Option<u16>) -> GeoEngineError {
        GeoEngineError::server(OGC_SERVICE_EXCEPTION, self.text, status)
    }
}

/// Map an OGC XML body to an error, falling back to the raw text if it
/// can't be parsed.
pub fn ogc_error_from_body(body: &[u8], status: Option<u16>) -> GeoEngineError {
    let xml = String::from_utf8_lossy(body);
    match ServiceException::parse(&xml) {
        Ok(exception) => exception.into_error(status),
        Err(_) => GeoEngineError::server(OGC_SERVICE_EXCEPTION, xml.trim(), status),
    }
}
