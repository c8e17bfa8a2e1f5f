//! Mock service orchestration.
//!
//! Serving, registration, deletion, and replay over the definition store.

use crate::config::CallbackSettings;
use crate::definition::{
    MockRequestDefinition, MockRequestDto, MockResponseDefinition, MockResponseDto,
};
use crate::error::Error;
use crate::materialize::{MaterializedResponse, ResponseMaterializer};
use crate::replay::{RemoteResponse, RequestReplayer};
use crate::store::DefinitionStore;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Receipt for a completed registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReceipt {
    pub mock_id: String,
    /// Callback URL the registered mock is served under. `None` when the
    /// advertised host could not be resolved; registration still stands.
    pub url: Option<String>,
}

/// Point-in-time counters for health reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceReport {
    pub lookups: u64,
    pub served: u64,
    pub missed: u64,
    pub replays: u64,
    pub interrupted_delays: u64,
}

/// Local hostname source for callback URLs when no host is advertised.
pub trait HostnameResolver: Debug + Send + Sync {
    fn local_hostname(&self) -> Option<String>;
}

/// OS hostname resolver, the binary's default.
#[derive(Debug, Default)]
pub struct OsHostnameResolver;

impl HostnameResolver for OsHostnameResolver {
    fn local_hostname(&self) -> Option<String> {
        match gethostname::gethostname().into_string() {
            Ok(host) if !host.is_empty() => Some(host),
            Ok(_) | Err(_) => None,
        }
    }
}

/// Orchestrates lookups, registrations, deletions, and replays.
pub struct MockService {
    store: Arc<dyn DefinitionStore>,
    materializer: ResponseMaterializer,
    replayer: RequestReplayer,
    resolver: Box<dyn HostnameResolver>,
    advertised_host: Option<String>,
    advertised_port: u16,
    /// Serve lookups received.
    lookups_total: AtomicU64,
    /// Lookups that found a definition.
    lookups_served: AtomicU64,
    /// Lookups that missed.
    lookups_missed: AtomicU64,
    /// Replays handed to the dispatcher.
    replays_total: AtomicU64,
}

impl MockService {
    pub fn new(
        store: Arc<dyn DefinitionStore>,
        materializer: ResponseMaterializer,
        replayer: RequestReplayer,
        resolver: Box<dyn HostnameResolver>,
        callback: CallbackSettings,
        listen_port: u16,
    ) -> Self {
        Self {
            store,
            materializer,
            replayer,
            resolver,
            advertised_host: callback.advertised_host,
            advertised_port: callback.advertised_port.unwrap_or(listen_port),
            lookups_total: AtomicU64::new(0),
            lookups_served: AtomicU64::new(0),
            lookups_missed: AtomicU64::new(0),
            replays_total: AtomicU64::new(0),
        }
    }

    /// Serve the mock registered under `mock_id`.
    ///
    /// A miss is not an error: it serves the 404 shape with an empty body.
    pub async fn serve_mock(&self, mock_id: &str) -> Result<MaterializedResponse, Error> {
        self.lookups_total.fetch_add(1, Ordering::Relaxed);
        match self.store.get_response(mock_id).await? {
            Some(definition) => {
                debug!(mock_id = %mock_id, "Serving mock response");
                let response = self.materializer.materialize(&definition).await?;
                self.lookups_served.fetch_add(1, Ordering::Relaxed);
                Ok(response)
            }
            None => {
                self.lookups_missed.fetch_add(1, Ordering::Relaxed);
                error!(mock_id = %mock_id, "No mock response found");
                Ok(MaterializedResponse::not_found())
            }
        }
    }

    /// Validate and persist a response definition.
    pub async fn register_response(
        &self,
        dto: MockResponseDto,
    ) -> Result<RegistrationReceipt, Error> {
        let definition = dto.into_definition()?;
        let mock_id = definition.mock_id.clone();
        info!(mock_id = %mock_id, "Saving mock response definition");
        self.store.save_response(definition).await?;
        Ok(self.receipt(mock_id))
    }

    /// Delete a response definition. Deleting an unknown id is an explicit
    /// failure, distinct from a failing store.
    pub async fn delete_response(&self, mock_id: &str) -> Result<(), Error> {
        info!(mock_id = %mock_id, "Deleting mock response definition");
        if self.store.delete_response(mock_id).await? {
            Ok(())
        } else {
            Err(Error::NotFound(mock_id.to_string()))
        }
    }

    /// Validate and persist a request definition.
    pub async fn register_request(
        &self,
        dto: MockRequestDto,
    ) -> Result<RegistrationReceipt, Error> {
        let definition = dto.into_definition()?;
        let mock_id = definition.mock_id.clone();
        info!(mock_id = %mock_id, "Saving mock request definition");
        self.store.save_request(definition).await?;
        Ok(self.receipt(mock_id))
    }

    /// Delete a request definition.
    pub async fn delete_request(&self, mock_id: &str) -> Result<(), Error> {
        info!(mock_id = %mock_id, "Deleting mock request definition");
        if self.store.delete_request(mock_id).await? {
            Ok(())
        } else {
            Err(Error::NotFound(mock_id.to_string()))
        }
    }

    /// Replay a submitted request definition without storing it.
    pub async fn replay_request(&self, dto: MockRequestDto) -> Result<RemoteResponse, Error> {
        let definition = dto.into_definition()?;
        self.replays_total.fetch_add(1, Ordering::Relaxed);
        self.replayer.replay(&definition).await
    }

    /// Replay a stored request definition.
    pub async fn replay_by_id(&self, mock_id: &str) -> Result<RemoteResponse, Error> {
        let definition = self
            .store
            .get_request(mock_id)
            .await?
            .ok_or_else(|| Error::NotFound(mock_id.to_string()))?;
        self.replays_total.fetch_add(1, Ordering::Relaxed);
        self.replayer.replay(&definition).await
    }

    /// Register definitions seeded from configuration.
    pub async fn seed(
        &self,
        responses: Vec<MockResponseDefinition>,
        requests: Vec<MockRequestDefinition>,
    ) -> Result<(), Error> {
        let counts = (responses.len(), requests.len());
        for definition in responses {
            self.store.save_response(definition).await?;
        }
        for definition in requests {
            self.store.save_request(definition).await?;
        }
        if counts != (0, 0) {
            info!(responses = counts.0, requests = counts.1, "Seeded mock definitions");
        }
        Ok(())
    }

    pub fn report(&self) -> ServiceReport {
        ServiceReport {
            lookups: self.lookups_total.load(Ordering::Relaxed),
            served: self.lookups_served.load(Ordering::Relaxed),
            missed: self.lookups_missed.load(Ordering::Relaxed),
            replays: self.replays_total.load(Ordering::Relaxed),
            interrupted_delays: self.materializer.total_interrupted_delays(),
        }
    }

    fn receipt(&self, mock_id: String) -> RegistrationReceipt {
        let url = self.callback_url(&mock_id);
        RegistrationReceipt { mock_id, url }
    }

    /// Build the callback URL a registration is served under. Resolution
    /// happens per call so a transient failure only degrades that receipt.
    fn callback_url(&self, mock_id: &str) -> Option<String> {
        let host = match &self.advertised_host {
            Some(host) => host.clone(),
            None => match self.resolver.local_hostname() {
                Some(host) => host,
                None => {
                    error!(
                        mock_id = %mock_id,
                        "Could not resolve local hostname, registration URL omitted"
                    );
                    return None;
                }
            },
        };
        Some(format!(
            "http://{}:{}/api/mock/{}",
            host, self.advertised_port, mock_id
        ))
    }
}
