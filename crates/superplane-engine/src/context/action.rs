use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use superplane_component::{ActionContext, ComponentError, ExecutionMetadataContext, NotificationRequest, SecretReader};
use superplane_core::{Channel, EventId, ExecutionId, ExecutionResult, IntegrationId, NodeId, RequestId, ResultReason, WorkflowId};

use super::live_execution::LiveExecutionContext;

/// `ActionContext` for a request dispatched against an already-existing
/// execution. Delegates every `ExecutionMetadataContext`
/// method to an owned `LiveExecutionContext` and adds the action's own
/// name/parameters plus the node's integration, if any.
pub struct ActionDispatchContext {
  inner: LiveExecutionContext,
  action_name: String,
  parameters: Value,
  integration_id: Option<IntegrationId>,
}

impl ActionDispatchContext {
  pub fn new(
    inner: LiveExecutionContext,
    action_name: String,
    parameters: Value,
    integration_id: Option<IntegrationId>,
  ) -> Self {
    Self { inner, action_name, parameters, integration_id }
  }
}

#[async_trait]
impl ExecutionMetadataContext for ActionDispatchContext {
  fn workflow_id(&self) -> WorkflowId {
    self.inner.workflow_id()
  }

  fn node_id(&self) -> &NodeId {
    self.inner.node_id()
  }

  fn execution_id(&self) -> ExecutionId {
    self.inner.execution_id()
  }

  fn root_event_id(&self) -> EventId {
    self.inner.root_event_id()
  }

  fn configuration(&self) -> &Value {
    self.inner.configuration()
  }

  async fn get_metadata(&self) -> Result<Value, ComponentError> {
    self.inner.get_metadata().await
  }

  async fn set_metadata(&mut self, value: Value) -> Result<(), ComponentError> {
    self.inner.set_metadata(value).await
  }

  async fn get_kv(&self, key: &str) -> Result<Option<String>, ComponentError> {
    self.inner.get_kv(key).await
  }

  async fn set_kv(&mut self, key: &str, value: &str) -> Result<(), ComponentError> {
    self.inner.set_kv(key, value).await
  }

  async fn emit(&mut self, channel: Channel, event_type: &str, payload: Value) -> Result<EventId, ComponentError> {
    self.inner.emit(channel, event_type, payload).await
  }

  async fn schedule_action_call(
    &mut self,
    action_name: &str,
    parameters: Value,
    delay: Duration,
  ) -> Result<RequestId, ComponentError> {
    self.inner.schedule_action_call(action_name, parameters, delay).await
  }

  async fn finish_passed(&mut self) -> Result<(), ComponentError> {
    self.inner.finish_passed().await
  }

  async fn finish_with_result(
    &mut self,
    result: ExecutionResult,
    reason: Option<ResultReason>,
    message: String,
  ) -> Result<(), ComponentError> {
    self.inner.finish_with_result(result, reason, message).await
  }

  async fn is_finished(&self) -> Result<bool, ComponentError> {
    self.inner.is_finished().await
  }

  async fn notify(&mut self, notification: NotificationRequest) -> Result<(), ComponentError> {
    self.inner.notify(notification).await
  }

  fn secrets(&self) -> &dyn SecretReader {
    self.inner.secrets()
  }
}

#[async_trait]
impl ActionContext for ActionDispatchContext {
  fn action_name(&self) -> &str {
    &self.action_name
  }

  fn parameters(&self) -> &Value {
    &self.parameters
  }

  fn integration_id(&self) -> Option<IntegrationId> {
    self.integration_id
  }
}
