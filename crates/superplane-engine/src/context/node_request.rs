use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use superplane_component::{ComponentError, NodeRequestContext, SecretReader};
use superplane_core::{Channel, EventId, NodeId, RequestId, WorkflowId};
use superplane_execution::{CanvasEvent, CanvasNodeRequest};
use superplane_store::{PgStore, StoreError};

fn store_err(err: StoreError) -> ComponentError {
  ComponentError::failed(err.to_string())
}

/// `NodeRequestContext` for a request on a trigger or component node
/// itself, with no execution-id. Opens its own short transactions
/// through `PgStore`, same discipline as `LiveExecutionContext`.
pub struct NodeRequestDispatchContext {
  store: PgStore,
  workflow_id: WorkflowId,
  node_id: NodeId,
  action_name: String,
  parameters: Value,
  configuration: Value,
  secrets: Arc<dyn SecretReader>,
}

impl NodeRequestDispatchContext {
  pub fn new(
    store: PgStore,
    workflow_id: WorkflowId,
    node_id: NodeId,
    action_name: String,
    parameters: Value,
    configuration: Value,
    secrets: Arc<dyn SecretReader>,
  ) -> Self {
    Self { store, workflow_id, node_id, action_name, parameters, configuration, secrets }
  }
}

#[async_trait]
impl NodeRequestContext for NodeRequestDispatchContext {
  fn workflow_id(&self) -> WorkflowId {
    self.workflow_id
  }

  fn node_id(&self) -> &NodeId {
    &self.node_id
  }

  fn action_name(&self) -> &str {
    &self.action_name
  }

  fn parameters(&self) -> &Value {
    &self.parameters
  }

  fn configuration(&self) -> &Value {
    &self.configuration
  }

  async fn emit_root_event(
    &mut self,
    channel: Channel,
    event_type: &str,
    payload: Value,
  ) -> Result<EventId, ComponentError> {
    let event = CanvasEvent::new_root(self.workflow_id, self.node_id.clone(), channel, event_type, payload, Utc::now());
    self.store.insert_event(&event).await.map_err(store_err)?;
    Ok(event.id)
  }

  async fn schedule_action_call(
    &mut self,
    action_name: &str,
    parameters: Value,
    delay: Duration,
  ) -> Result<RequestId, ComponentError> {
    let now = Utc::now();
    let scheduled_at = now + chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::zero());
    let request = CanvasNodeRequest::new_invoke_action(
      self.workflow_id,
      self.node_id.clone(),
      None,
      action_name,
      parameters,
      scheduled_at,
      now,
    );
    self.store.insert_request(&request).await.map_err(store_err)?;
    Ok(request.id)
  }

  fn secrets(&self) -> &dyn SecretReader {
    self.secrets.as_ref()
  }
}
