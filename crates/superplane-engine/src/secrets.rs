use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use superplane_component::{ComponentError, SecretReader};
use superplane_core::OrganizationId;

#[derive(Debug, Error)]
pub enum SecretsError {
  #[error("secret not found: {0}")]
  NotFound(String),

  #[error("secrets backend error: {0}")]
  Backend(String),
}

/// Organisation-scoped secret storage. Implemented by the host process;
/// this crate only depends on the trait and ships an in-memory test
/// double for tests.
#[async_trait]
pub trait SecretsBackend: Send + Sync {
  async fn get_secret(&self, org: OrganizationId, name: &str) -> Result<Vec<u8>, SecretsError>;
}

#[derive(Debug, Default)]
pub struct InMemorySecretsBackend {
  secrets: RwLock<HashMap<(OrganizationId, String), Vec<u8>>>,
}

impl InMemorySecretsBackend {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(&self, org: OrganizationId, name: impl Into<String>, value: impl Into<Vec<u8>>) {
    self.secrets.write().unwrap().insert((org, name.into()), value.into());
  }
}

#[async_trait]
impl SecretsBackend for InMemorySecretsBackend {
  async fn get_secret(&self, org: OrganizationId, name: &str) -> Result<Vec<u8>, SecretsError> {
    self
      .secrets
      .read()
      .unwrap()
      .get(&(org, name.to_string()))
      .cloned()
      .ok_or_else(|| SecretsError::NotFound(name.to_string()))
  }
}

/// Adapts a `SecretsBackend` plus a fixed organisation into the narrow
/// `SecretReader` capability a component context hands out. Every execution context is scoped to exactly one organisation
/// (its workflow's owner), so this adapter is built once per context.
///
/// Holds an owned `Arc` rather than a borrow: contexts handed back as
/// `Box<dyn ExecutionMetadataContext>` (e.g. `find_execution_by_kv`) are
/// implicitly `'static`, so nothing here can borrow from the caller's stack.
pub struct OrgSecretReader {
  backend: Arc<dyn SecretsBackend>,
  organization_id: OrganizationId,
}

impl OrgSecretReader {
  pub fn new(backend: Arc<dyn SecretsBackend>, organization_id: OrganizationId) -> Self {
    Self { backend, organization_id }
  }
}

#[async_trait]
impl SecretReader for OrgSecretReader {
  async fn get_secret(&self, name: &str) -> Result<Vec<u8>, ComponentError> {
    self
      .backend
      .get_secret(self.organization_id, name)
      .await
      .map_err(|err| ComponentError::failed(err.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn reads_a_secret_scoped_to_its_organisation() {
    let backend = InMemorySecretsBackend::new();
    let org = OrganizationId::new();
    backend.set(org, "api-key", b"shh".to_vec());

    let reader = OrgSecretReader::new(Arc::new(backend), org);
    assert_eq!(reader.get_secret("api-key").await.unwrap(), b"shh".to_vec());
  }

  #[tokio::test]
  async fn missing_secret_is_an_error() {
    let backend: Arc<dyn SecretsBackend> = Arc::new(InMemorySecretsBackend::new());
    let reader = OrgSecretReader::new(backend, OrganizationId::new());
    assert!(reader.get_secret("missing").await.is_err());
  }
}
