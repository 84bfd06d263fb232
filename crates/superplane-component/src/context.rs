use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use superplane_core::{Channel, EventId, ExecutionId, NodeId, RequestId, ResultReason, WorkflowId};

use crate::error::ComponentError;

/// A notification a component wants fanned out to a recipient set. Components never talk to RBAC/email directly — they hand this to
/// the context and the engine publishes it on the bus.
#[derive(Debug, Clone)]
pub struct NotificationRequest {
  pub title: String,
  pub body: String,
  pub url: Option<String>,
  pub url_label: Option<String>,
  pub emails: Vec<String>,
  pub groups: Vec<String>,
  pub roles: Vec<String>,
}

/// Read-only access to secrets scoped to the node's owning organisation.
#[async_trait]
pub trait SecretReader: Send + Sync {
  async fn get_secret(&self, name: &str) -> Result<Vec<u8>, ComponentError>;
}

/// The capability bundle passed to `Component::execute`, `handle-action` on
/// an execution, `on-integration-message`, and `cancel`/`cleanup`.
/// Every method is bound to the single database transaction that owns
/// this execution's row lock; there is no method to start a new one —
/// that discipline lives in the engine, not in component code.
#[async_trait]
pub trait ExecutionMetadataContext: Send + Sync {
  fn workflow_id(&self) -> WorkflowId;
  fn node_id(&self) -> &NodeId;
  fn execution_id(&self) -> ExecutionId;
  fn root_event_id(&self) -> EventId;

  /// The materialised configuration for this execution (post-templating).
  fn configuration(&self) -> &Value;

  /// Component-owned free-form metadata persisted on the execution row.
  async fn get_metadata(&self) -> Result<Value, ComponentError>;
  async fn set_metadata(&mut self, value: Value) -> Result<(), ComponentError>;

  /// `ExecutionKV` reads/writes: components tag their execution with
  /// (key, value) pairs so an inbound external event carrying the same
  /// pair can be correlated back to it.
  async fn get_kv(&self, key: &str) -> Result<Option<String>, ComponentError>;
  async fn set_kv(&mut self, key: &str, value: &str) -> Result<(), ComponentError>;

  /// Emit a `CanvasEvent` on `channel`, inheriting this execution's
  /// root-event-id.
  async fn emit(
    &mut self,
    channel: Channel,
    event_type: &str,
    payload: Value,
  ) -> Result<EventId, ComponentError>;

  /// Insert a `CanvasNodeRequest` targeting this execution, to fire
  /// `delay` from now.
  async fn schedule_action_call(
    &mut self,
    action_name: &str,
    parameters: Value,
    delay: Duration,
  ) -> Result<RequestId, ComponentError>;

  /// Mark the execution `finished, result=passed`.
  async fn finish_passed(&mut self) -> Result<(), ComponentError>;

  /// Mark the execution `finished, result=failed|cancelled` with a reason
  /// and human-readable message.
  async fn finish_with_result(
    &mut self,
    result: superplane_core::ExecutionResult,
    reason: Option<ResultReason>,
    message: String,
  ) -> Result<(), ComponentError>;

  /// Whether this execution has already reached a terminal state — used by
  /// handlers that may be invoked after the execution was independently
  /// finished (e.g. by a racing child completion).
  async fn is_finished(&self) -> Result<bool, ComponentError>;

  async fn notify(&mut self, notification: NotificationRequest) -> Result<(), ComponentError>;

  fn secrets(&self) -> &dyn SecretReader;
}

/// The capability bundle for `handle-action` invoked against a trigger or
/// component *node* (no execution-id — the request targets the node
/// itself, not a specific execution).
#[async_trait]
pub trait NodeRequestContext: Send + Sync {
  fn workflow_id(&self) -> WorkflowId;
  fn node_id(&self) -> &NodeId;
  fn action_name(&self) -> &str;
  fn parameters(&self) -> &Value;

  /// Node-level configuration, as declared on the `CanvasNode` (not an
  /// execution's materialised snapshot — there is no execution here).
  fn configuration(&self) -> &Value;

  /// Emit a `CanvasEvent` originating a brand new causal chain: its own id
  /// becomes the root-event-id.
  async fn emit_root_event(
    &mut self,
    channel: Channel,
    event_type: &str,
    payload: Value,
  ) -> Result<EventId, ComponentError>;

  async fn schedule_action_call(
    &mut self,
    action_name: &str,
    parameters: Value,
    delay: Duration,
  ) -> Result<RequestId, ComponentError>;

  fn secrets(&self) -> &dyn SecretReader;
}

/// The capability bundle for `handle-action` invoked against an
/// execution. A superset of `ExecutionMetadataContext` plus the action's
/// own name/parameters and a handle to the node's integration, if any.
#[async_trait]
pub trait ActionContext: ExecutionMetadataContext {
  fn action_name(&self) -> &str;
  fn parameters(&self) -> &Value;
  fn integration_id(&self) -> Option<superplane_core::IntegrationId>;
}

/// The capability bundle for `handle-webhook`.
#[async_trait]
pub trait WebhookContext: Send + Sync {
  fn workflow_id(&self) -> WorkflowId;
  fn node_id(&self) -> &NodeId;
  fn method(&self) -> &str;
  fn path(&self) -> &str;
  fn headers(&self) -> &[(String, String)];
  fn body(&self) -> &[u8];

  async fn emit_root_event(
    &mut self,
    channel: Channel,
    event_type: &str,
    payload: Value,
  ) -> Result<EventId, ComponentError>;
}

/// The capability bundle for `on-integration-message`. Built
/// by the router once per matching `IntegrationSubscription`; `find`
/// resolves the execution the payload correlates to, if any, and hands back
/// an `ExecutionMetadataContext` already scoped to that row's transaction.
#[async_trait]
pub trait IntegrationMessageContext: Send + Sync {
  fn workflow_id(&self) -> WorkflowId;
  fn node_id(&self) -> &NodeId;
  fn integration_id(&self) -> superplane_core::IntegrationId;

  /// The subscription's own stored configuration.
  fn subscription_configuration(&self) -> &Value;

  /// Locate the execution under this subscription's node whose
  /// `ExecutionKV` carries `(key, value)`.
  async fn find_execution_by_kv(
    &self,
    key: &str,
    value: &str,
  ) -> Result<Option<Box<dyn ExecutionMetadataContext>>, ComponentError>;
}
