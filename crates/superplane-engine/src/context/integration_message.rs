use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use superplane_bus::Bus;
use superplane_component::{ComponentError, ExecutionMetadataContext, IntegrationMessageContext};
use superplane_core::{IntegrationId, NodeId, OrganizationId, WorkflowId};
use superplane_store::{PgStore, StoreError};

use crate::secrets::{OrgSecretReader, SecretsBackend};

use super::live_execution::LiveExecutionContext;

fn store_err(err: StoreError) -> ComponentError {
  ComponentError::failed(err.to_string())
}

/// `IntegrationMessageContext` built once per matching `IntegrationSubscription`
/// by the integration router. `find_execution_by_kv` hands
/// back a fresh `LiveExecutionContext` rather than a transaction it already
/// holds — the router fans one delivered payload out to every subscribing
/// node, so no single transaction can span all of them.
pub struct IntegrationMessageDispatchContext {
  store: PgStore,
  bus: Arc<dyn Bus>,
  secrets_backend: Arc<dyn SecretsBackend>,
  organization_id: OrganizationId,
  workflow_id: WorkflowId,
  node_id: NodeId,
  integration_id: IntegrationId,
  subscription_configuration: Value,
}

impl IntegrationMessageDispatchContext {
  pub fn new(
    store: PgStore,
    bus: Arc<dyn Bus>,
    secrets_backend: Arc<dyn SecretsBackend>,
    organization_id: OrganizationId,
    workflow_id: WorkflowId,
    node_id: NodeId,
    integration_id: IntegrationId,
    subscription_configuration: Value,
  ) -> Self {
    Self {
      store,
      bus,
      secrets_backend,
      organization_id,
      workflow_id,
      node_id,
      integration_id,
      subscription_configuration,
    }
  }
}

#[async_trait]
impl IntegrationMessageContext for IntegrationMessageDispatchContext {
  fn workflow_id(&self) -> WorkflowId {
    self.workflow_id
  }

  fn node_id(&self) -> &NodeId {
    &self.node_id
  }

  fn integration_id(&self) -> IntegrationId {
    self.integration_id
  }

  fn subscription_configuration(&self) -> &Value {
    &self.subscription_configuration
  }

  async fn find_execution_by_kv(
    &self,
    key: &str,
    value: &str,
  ) -> Result<Option<Box<dyn ExecutionMetadataContext>>, ComponentError> {
    let found = self.store.find_execution_by_kv(&self.node_id, key, value).await.map_err(store_err)?;
    let Some(execution) = found else { return Ok(None) };

    let secrets = Arc::new(OrgSecretReader::new(self.secrets_backend.clone(), self.organization_id));
    let context = LiveExecutionContext::new(
      PgStore::new(self.store.pool()),
      self.bus.clone(),
      execution.workflow_id,
      execution.node_id,
      execution.id,
      execution.root_event_id,
      self.organization_id,
      execution.configuration,
      secrets,
    );

    Ok(Some(Box::new(context)))
  }
}
