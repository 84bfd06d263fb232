use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use superplane_core::IntegrationId;

#[derive(Debug, Error)]
pub enum IntegrationLookupError {
  #[error("integration backend error: {0}")]
  Backend(String),
}

/// Whether an `integration-id` referenced by a node or request still
/// resolves to a live integration instance. Integration CRUD is an
/// external collaborator (spec.md §1 Non-goals); this core only needs to
/// know whether one has been soft-deleted out from under a request that
/// still references it, per spec §4.3/§7.5 "if the integration referenced
/// no longer exists, complete the request silently".
#[async_trait]
pub trait IntegrationLookup: Send + Sync {
  async fn exists(&self, id: IntegrationId) -> Result<bool, IntegrationLookupError>;
}

/// In-memory double for tests: every integration exists unless explicitly
/// marked deleted.
#[derive(Debug, Default)]
pub struct InMemoryIntegrationLookup {
  deleted: RwLock<HashSet<IntegrationId>>,
}

impl InMemoryIntegrationLookup {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn mark_deleted(&self, id: IntegrationId) {
    self.deleted.write().unwrap().insert(id);
  }
}

#[async_trait]
impl IntegrationLookup for InMemoryIntegrationLookup {
  async fn exists(&self, id: IntegrationId) -> Result<bool, IntegrationLookupError> {
    Ok(!self.deleted.read().unwrap().contains(&id))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn unmarked_integration_exists() {
    let lookup = InMemoryIntegrationLookup::new();
    assert!(lookup.exists(IntegrationId::new()).await.unwrap());
  }

  #[tokio::test]
  async fn marked_deleted_integration_does_not_exist() {
    let lookup = InMemoryIntegrationLookup::new();
    let id = IntegrationId::new();
    lookup.mark_deleted(id);
    assert!(!lookup.exists(id).await.unwrap());
  }
}
