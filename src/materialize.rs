//! Turning stored response definitions into servable responses.

use crate::definition::{
    body_bytes, body_content_type, resolve_status, wire_header, MockResponseDefinition,
};
use crate::error::Error;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, warn};

/// A response ready to go on the wire.
#[derive(Debug, Clone)]
pub struct MaterializedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl MaterializedResponse {
    /// What a lookup miss serves: 404, no headers, empty body.
    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

/// Materializes response definitions, applying their configured delay.
///
/// The delay suspends only the calling task. A shutdown signal observed
/// mid-delay ends the wait early; the response is still produced.
pub struct ResponseMaterializer {
    shutdown: watch::Receiver<bool>,
    delays_interrupted: AtomicU64,
}

impl ResponseMaterializer {
    pub fn new(shutdown: watch::Receiver<bool>) -> Self {
        Self {
            shutdown,
            delays_interrupted: AtomicU64::new(0),
        }
    }

    /// Total delays cut short by shutdown.
    pub fn total_interrupted_delays(&self) -> u64 {
        self.delays_interrupted.load(Ordering::Relaxed)
    }

    /// Realize a definition. Fails only when the stored status code or a
    /// stored header cannot be represented on the wire.
    pub async fn materialize(
        &self,
        definition: &MockResponseDefinition,
    ) -> Result<MaterializedResponse, Error> {
        let status = resolve_status(definition.status_code)?;
        let headers = build_headers(definition)?;
        let body = body_bytes(&definition.body);

        if definition.delay_millis > 0 {
            self.apply_delay(definition).await;
        }

        Ok(MaterializedResponse {
            status,
            headers,
            body,
        })
    }

    async fn apply_delay(&self, definition: &MockResponseDefinition) {
        debug!(
            mock_id = %definition.mock_id,
            delay_millis = definition.delay_millis,
            "Applying response delay"
        );
        let mut shutdown = self.shutdown.clone();
        tokio::select! {
            _ = tokio::time::sleep(tokio::time::Duration::from_millis(definition.delay_millis)) => {}
            _ = shutdown.changed() => {
                self.delays_interrupted.fetch_add(1, Ordering::Relaxed);
                warn!(
                    mock_id = %definition.mock_id,
                    "Response delay interrupted by shutdown, serving early"
                );
            }
        }
    }
}

/// Copy definition headers verbatim, multi-valued, keeping per-name order.
/// A content type is added only when the definition has none and the body
/// is non-empty.
fn build_headers(definition: &MockResponseDefinition) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    for (name, values) in &definition.headers {
        for value in values {
            let (header_name, header_value) = wire_header(name, value)?;
            headers.append(header_name, header_value);
        }
    }
    if !headers.contains_key(CONTENT_TYPE) {
        if let Some(content_type) = body_content_type(&definition.body) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::{Duration, Instant};

    fn materializer() -> (watch::Sender<bool>, ResponseMaterializer) {
        let (tx, rx) = watch::channel(false);
        (tx, ResponseMaterializer::new(rx))
    }

    fn definition(mock_id: &str) -> MockResponseDefinition {
        MockResponseDefinition {
            mock_id: mock_id.to_string(),
            status_code: 200,
            headers: HashMap::new(),
            body: serde_json::Value::Null,
            delay_millis: 0,
        }
    }

    #[tokio::test]
    async fn test_materialize_round_trip() {
        let (_tx, materializer) = materializer();
        let mut def = definition("round-trip");
        def.status_code = 201;
        def.headers
            .insert("X-Request-Id".into(), vec!["abc".into(), "def".into()]);
        def.body = serde_json::json!({"message": "created"});

        let response = materializer.materialize(&def).await.unwrap();
        assert_eq!(response.status, StatusCode::CREATED);

        let ids: Vec<_> = response.headers.get_all("X-Request-Id").iter().collect();
        assert_eq!(ids, vec!["abc", "def"]);
        assert_eq!(response.body.as_ref(), br#"{"message":"created"}"#);
    }

    #[tokio::test]
    async fn test_not_found_shape() {
        let response = MaterializedResponse::not_found();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(response.headers.is_empty());
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_status_rejected() {
        let (_tx, materializer) = materializer();
        let mut def = definition("bad-status");
        def.status_code = 299;

        assert!(matches!(
            materializer.materialize(&def).await,
            Err(Error::InvalidStatusCode(299))
        ));
    }

    #[tokio::test]
    async fn test_invalid_header_rejected() {
        let (_tx, materializer) = materializer();
        let mut def = definition("bad-header");
        def.headers.insert("bad name".into(), vec!["x".into()]);

        assert!(matches!(
            materializer.materialize(&def).await,
            Err(Error::InvalidHeader { .. })
        ));
    }

    #[tokio::test]
    async fn test_delay_elapses() {
        let (_tx, materializer) = materializer();
        let mut def = definition("slow");
        def.delay_millis = 50;

        let start = Instant::now();
        materializer.materialize(&def).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_delay() {
        let (tx, materializer) = materializer();
        let mut def = definition("interrupted");
        def.delay_millis = 30_000;

        tx.send(true).unwrap();

        let start = Instant::now();
        let response = materializer.materialize(&def).await.unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(materializer.total_interrupted_delays(), 1);
    }

    #[tokio::test]
    async fn test_content_type_defaulted() {
        let (_tx, materializer) = materializer();
        let mut def = definition("typed");
        def.body = serde_json::json!({"k": 1});

        let response = materializer.materialize(&def).await.unwrap();
        assert_eq!(
            response.headers.get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_content_type_kept_from_definition() {
        let (_tx, materializer) = materializer();
        let mut def = definition("custom-type");
        def.headers
            .insert("Content-Type".into(), vec!["application/xml".into()]);
        def.body = serde_json::json!("<x/>");

        let response = materializer.materialize(&def).await.unwrap();
        assert_eq!(
            response.headers.get(CONTENT_TYPE).unwrap(),
            "application/xml"
        );
    }

    #[tokio::test]
    async fn test_empty_body_has_no_content_type() {
        let (_tx, materializer) = materializer();
        let response = materializer.materialize(&definition("empty")).await.unwrap();
        assert!(response.headers.get(CONTENT_TYPE).is_none());
        assert!(response.body.is_empty());
    }
}
