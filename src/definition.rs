//! Mock definition data model.
//!
//! Response and request definitions, their registration DTOs, and the
//! resolution rules that turn stored fields into wire types.

use crate::error::Error;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;
use uuid::Uuid;

/// A canned response registered under a mock id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MockResponseDefinition {
    /// Opaque identifier the response is served under.
    pub mock_id: String,

    /// HTTP status code to serve.
    #[serde(default = "default_status")]
    pub status_code: u16,

    /// Response headers, multi-valued. Order is preserved within a name.
    #[serde(default)]
    pub headers: HashMap<String, Vec<String>>,

    /// Response payload. `null` means an empty body, strings are served
    /// as raw text, anything else is serialized as JSON.
    #[serde(default)]
    pub body: serde_json::Value,

    /// Artificial delay applied before the response is served (0 = none).
    #[serde(default)]
    pub delay_millis: u64,
}

fn default_status() -> u16 {
    200
}

impl MockResponseDefinition {
    /// Validate the definition before it reaches the store.
    pub fn validate(&self) -> Result<(), Error> {
        if self.mock_id.trim().is_empty() {
            return Err(Error::InvalidDefinition("mockId cannot be blank".into()));
        }
        resolve_status(self.status_code)?;
        for (name, values) in &self.headers {
            for value in values {
                wire_header(name, value)?;
            }
        }
        Ok(())
    }
}

/// Registration payload for a response definition. The id is optional;
/// a fresh one is generated when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MockResponseDto {
    #[serde(default)]
    pub mock_id: Option<String>,

    #[serde(default = "default_status")]
    pub status_code: u16,

    #[serde(default)]
    pub headers: HashMap<String, Vec<String>>,

    #[serde(default)]
    pub body: serde_json::Value,

    #[serde(default)]
    pub delay_millis: u64,
}

impl MockResponseDto {
    /// Convert into a validated definition, generating an id if needed.
    pub fn into_definition(self) -> Result<MockResponseDefinition, Error> {
        let definition = MockResponseDefinition {
            mock_id: resolve_mock_id(self.mock_id)?,
            status_code: self.status_code,
            headers: self.headers,
            body: self.body,
            delay_millis: self.delay_millis,
        };
        definition.validate()?;
        Ok(definition)
    }
}

/// An outbound request registered under a mock id, replayable against
/// the real remote endpoint it describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MockRequestDefinition {
    /// Opaque identifier. Lives in its own namespace, independent of
    /// response definition ids.
    pub mock_id: String,

    /// Remote host, optionally with a port (`example.test:8081`).
    pub host_name: String,

    /// URI scheme, `http` or `https`.
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Path and query, appended verbatim to the host.
    pub endpoint: String,

    /// HTTP verb name. Must resolve via [`resolve_method`].
    pub http_method: String,

    /// Outbound headers as ordered pairs. Duplicate names are preserved.
    #[serde(default)]
    pub headers: Vec<HeaderPair>,

    /// Request payload, same rules as the response body.
    #[serde(default)]
    pub body: serde_json::Value,
}

fn default_schema() -> String {
    "http".to_string()
}

impl MockRequestDefinition {
    /// Validate the definition before it reaches the store.
    pub fn validate(&self) -> Result<(), Error> {
        if self.mock_id.trim().is_empty() {
            return Err(Error::InvalidDefinition("mockId cannot be blank".into()));
        }
        if self.host_name.trim().is_empty() {
            return Err(Error::InvalidDefinition("hostName cannot be blank".into()));
        }
        match self.schema.as_str() {
            "http" | "https" => {}
            other => {
                return Err(Error::InvalidDefinition(format!(
                    "schema must be http or https, got '{other}'"
                )))
            }
        }
        resolve_method(&self.http_method)?;
        self.target_uri()?;
        for pair in &self.headers {
            wire_header(&pair.name, &pair.value)?;
        }
        Ok(())
    }

    /// Compose `<schema>://<hostName><endpoint>` and parse it.
    pub fn target_uri(&self) -> Result<Url, Error> {
        let raw = format!("{}://{}{}", self.schema, self.host_name, self.endpoint);
        Url::parse(&raw).map_err(|_| Error::InvalidUri(raw))
    }
}

/// Registration payload for a request definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MockRequestDto {
    #[serde(default)]
    pub mock_id: Option<String>,

    pub host_name: String,

    #[serde(default = "default_schema")]
    pub schema: String,

    pub endpoint: String,

    pub http_method: String,

    #[serde(default)]
    pub headers: Vec<HeaderPair>,

    #[serde(default)]
    pub body: serde_json::Value,
}

impl MockRequestDto {
    /// Convert into a validated definition, generating an id if needed.
    pub fn into_definition(self) -> Result<MockRequestDefinition, Error> {
        let definition = MockRequestDefinition {
            mock_id: resolve_mock_id(self.mock_id)?,
            host_name: self.host_name,
            schema: self.schema,
            endpoint: self.endpoint,
            http_method: self.http_method,
            headers: self.headers,
            body: self.body,
        };
        definition.validate()?;
        Ok(definition)
    }
}

/// One outbound header. Pairs are kept in submission order and duplicate
/// names are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderPair {
    pub name: String,
    pub value: String,
}

fn resolve_mock_id(id: Option<String>) -> Result<String, Error> {
    match id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        Some(_) => Err(Error::InvalidDefinition("mockId cannot be blank".into())),
        None => Ok(Uuid::new_v4().to_string()),
    }
}

/// Resolve a status code to a recognized HTTP status.
///
/// Unregistered codes (299, 999) are rejected, not just out-of-range ones.
pub fn resolve_status(code: u16) -> Result<StatusCode, Error> {
    StatusCode::from_u16(code)
        .ok()
        .filter(|status| status.canonical_reason().is_some())
        .ok_or(Error::InvalidStatusCode(code))
}

/// Resolve a method name against the standard verb set, exact match.
/// Extension tokens are rejected even though they would be wire-legal.
pub fn resolve_method(raw: &str) -> Result<Method, Error> {
    match raw {
        "GET" => Ok(Method::GET),
        "HEAD" => Ok(Method::HEAD),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "PATCH" => Ok(Method::PATCH),
        "DELETE" => Ok(Method::DELETE),
        "OPTIONS" => Ok(Method::OPTIONS),
        "TRACE" => Ok(Method::TRACE),
        other => Err(Error::UnresolvedMethod(other.to_string())),
    }
}

/// Materialize a definition body as wire bytes.
pub fn body_bytes(body: &serde_json::Value) -> Bytes {
    match body {
        serde_json::Value::Null => Bytes::new(),
        serde_json::Value::String(text) => Bytes::copy_from_slice(text.as_bytes()),
        // Value serialization is infallible for string-keyed maps.
        other => Bytes::from(serde_json::to_vec(other).unwrap_or_default()),
    }
}

/// Default content type for a body when the definition carries none.
pub fn body_content_type(body: &serde_json::Value) -> Option<&'static str> {
    match body {
        serde_json::Value::Null => None,
        serde_json::Value::String(_) => Some("text/plain"),
        _ => Some("application/json"),
    }
}

pub(crate) fn wire_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), Error> {
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    let header_value = HeaderValue::from_str(value).map_err(|e| Error::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok((header_name, header_value))
}
