//! Replaying stored request definitions against real remote endpoints.

use crate::definition::{
    body_bytes, body_content_type, resolve_method, wire_header, MockRequestDefinition,
};
use crate::error::Error;
use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use http::Method;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// What came back from the remote endpoint, relayed unmodified. A remote
/// 4xx or 5xx status is still a successful replay.
#[derive(Debug, Clone)]
pub struct RemoteResponse {
    pub status: u16,
    /// Raw remote headers; values are bytes and need not be UTF-8.
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// The outbound transport seam. One call per replay, no retries.
#[async_trait]
pub trait HttpDispatcher: Debug + Send + Sync {
    async fn dispatch(
        &self,
        method: Method,
        url: Url,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<RemoteResponse, Error>;
}

/// reqwest-backed dispatcher with an optional overall timeout.
#[derive(Debug)]
pub struct ReqwestDispatcher {
    client: reqwest::Client,
}

impl ReqwestDispatcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl HttpDispatcher for ReqwestDispatcher {
    async fn dispatch(
        &self,
        method: Method,
        url: Url,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<RemoteResponse, Error> {
        let response = self
            .client
            .request(method, url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(RemoteResponse {
            status,
            headers,
            body,
        })
    }
}

/// Reconstructs a stored request definition and dispatches it.
pub struct RequestReplayer {
    dispatcher: Arc<dyn HttpDispatcher>,
}

impl RequestReplayer {
    pub fn new(dispatcher: Arc<dyn HttpDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Replay a definition against its remote endpoint.
    ///
    /// The method and target URI are resolved before any network activity,
    /// so an unresolvable definition never produces an outbound call.
    pub async fn replay(
        &self,
        definition: &MockRequestDefinition,
    ) -> Result<RemoteResponse, Error> {
        let method = resolve_method(&definition.http_method)?;
        let url = definition.target_uri()?;
        let headers = build_headers(definition)?;
        let body = body_bytes(&definition.body);

        debug!(
            mock_id = %definition.mock_id,
            method = %method,
            url = %url,
            "Dispatching replay"
        );
        let response = self.dispatcher.dispatch(method, url, headers, body).await?;
        info!(
            mock_id = %definition.mock_id,
            status = response.status,
            "Replay completed"
        );
        Ok(response)
    }
}

/// Flatten the ordered header pairs into a wire header map, keeping
/// duplicate names and their submission order. A content type is added
/// only when the pairs carry none and a body is present.
fn build_headers(definition: &MockRequestDefinition) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    for pair in &definition.headers {
        let (name, value) = wire_header(&pair.name, &pair.value)?;
        headers.append(name, value);
    }
    if !headers.contains_key(CONTENT_TYPE) {
        if let Some(content_type) = body_content_type(&definition.body) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
    }
    Ok(headers)
}
