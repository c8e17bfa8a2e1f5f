//! Definition storage.
//!
//! The store is a black-box collaborator: the service only requires atomic
//! per-id get/save/delete on two independent collections, with no cross-id
//! transactions. The bundled implementation keeps everything in memory.

use crate::definition::{MockRequestDefinition, MockResponseDefinition};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Keyed storage for mock definitions. Response and request definitions
/// live in independent namespaces, so the same id may exist in both.
#[async_trait]
pub trait DefinitionStore: Send + Sync {
    async fn get_response(
        &self,
        mock_id: &str,
    ) -> Result<Option<MockResponseDefinition>, StoreError>;

    /// Save a response definition, replacing any previous one with the id.
    async fn save_response(&self, definition: MockResponseDefinition) -> Result<(), StoreError>;

    /// Delete a response definition, reporting whether one existed.
    async fn delete_response(&self, mock_id: &str) -> Result<bool, StoreError>;

    async fn get_request(
        &self,
        mock_id: &str,
    ) -> Result<Option<MockRequestDefinition>, StoreError>;

    /// Save a request definition, replacing any previous one with the id.
    async fn save_request(&self, definition: MockRequestDefinition) -> Result<(), StoreError>;

    /// Delete a request definition, reporting whether one existed.
    async fn delete_request(&self, mock_id: &str) -> Result<bool, StoreError>;
}

/// In-memory definition store, the default backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    responses: RwLock<HashMap<String, MockResponseDefinition>>,
    requests: RwLock<HashMap<String, MockRequestDefinition>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DefinitionStore for MemoryStore {
    async fn get_response(
        &self,
        mock_id: &str,
    ) -> Result<Option<MockResponseDefinition>, StoreError> {
        Ok(self.responses.read().await.get(mock_id).cloned())
    }

    async fn save_response(&self, definition: MockResponseDefinition) -> Result<(), StoreError> {
        self.responses
            .write()
            .await
            .insert(definition.mock_id.clone(), definition);
        Ok(())
    }

    async fn delete_response(&self, mock_id: &str) -> Result<bool, StoreError> {
        Ok(self.responses.write().await.remove(mock_id).is_some())
    }

    async fn get_request(
        &self,
        mock_id: &str,
    ) -> Result<Option<MockRequestDefinition>, StoreError> {
        Ok(self.requests.read().await.get(mock_id).cloned())
    }

    async fn save_request(&self, definition: MockRequestDefinition) -> Result<(), StoreError> {
        self.requests
            .write()
            .await
            .insert(definition.mock_id.clone(), definition);
        Ok(())
    }

    async fn delete_request(&self, mock_id: &str) -> Result<bool, StoreError> {
        Ok(self.requests.write().await.remove(mock_id).is_some())
    }
}
