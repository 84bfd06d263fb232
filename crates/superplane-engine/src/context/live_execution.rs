use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use superplane_bus::{Bus, BusMessage};
use superplane_component::{ComponentError, ExecutionMetadataContext, NotificationRequest, SecretReader};
use superplane_core::{
  Channel, EventId, ExecutionId, ExecutionResult, ExecutionState, NodeId, RequestId, ResultReason, WorkflowId,
};
use superplane_execution::{CanvasEvent, CanvasNodeRequest, ExecutionKv};
use superplane_store::{PgStore, StoreError};

fn store_err(err: StoreError) -> ComponentError {
  ComponentError::failed(err.to_string())
}

/// An `ExecutionMetadataContext` that never holds an open transaction of
/// its own: every method opens-and-commits a short transaction through
/// `PgStore`'s autocommit wrappers, guarding finishes with the conditional
/// `UPDATE ... WHERE state <> 'finished'` rather than a held row lock.
///
/// Used wherever the caller can't reclaim a transaction after the context
/// is consumed — the request worker dispatching an action against an
/// already-claimed-and-released execution, and `find_execution_by_kv`'s
/// `Box<dyn ExecutionMetadataContext>` return value, which the trait
/// signature pins to `'static`.
pub struct LiveExecutionContext {
  store: PgStore,
  bus: Arc<dyn Bus>,
  workflow_id: WorkflowId,
  node_id: NodeId,
  execution_id: ExecutionId,
  root_event_id: EventId,
  organization_id: superplane_core::OrganizationId,
  configuration: Value,
  secrets: Arc<dyn SecretReader>,
}

impl LiveExecutionContext {
  pub fn new(
    store: PgStore,
    bus: Arc<dyn Bus>,
    workflow_id: WorkflowId,
    node_id: NodeId,
    execution_id: ExecutionId,
    root_event_id: EventId,
    organization_id: superplane_core::OrganizationId,
    configuration: Value,
    secrets: Arc<dyn SecretReader>,
  ) -> Self {
    Self {
      store,
      bus,
      workflow_id,
      node_id,
      execution_id,
      root_event_id,
      organization_id,
      configuration,
      secrets,
    }
  }
}

#[async_trait]
impl ExecutionMetadataContext for LiveExecutionContext {
  fn workflow_id(&self) -> WorkflowId {
    self.workflow_id
  }

  fn node_id(&self) -> &NodeId {
    &self.node_id
  }

  fn execution_id(&self) -> ExecutionId {
    self.execution_id
  }

  fn root_event_id(&self) -> EventId {
    self.root_event_id
  }

  fn configuration(&self) -> &Value {
    &self.configuration
  }

  async fn get_metadata(&self) -> Result<Value, ComponentError> {
    let execution = self.store.fetch_execution(self.execution_id).await.map_err(store_err)?;
    Ok(execution.map(|e| e.metadata).unwrap_or(Value::Null))
  }

  async fn set_metadata(&mut self, value: Value) -> Result<(), ComponentError> {
    self.store.set_metadata(self.execution_id, &value).await.map_err(store_err)
  }

  async fn get_kv(&self, key: &str) -> Result<Option<String>, ComponentError> {
    self.store.get_kv(self.execution_id, key).await.map_err(store_err)
  }

  async fn set_kv(&mut self, key: &str, value: &str) -> Result<(), ComponentError> {
    let kv = ExecutionKv { execution_id: self.execution_id, key: key.to_string(), value: value.to_string() };
    self.store.set_kv(&kv).await.map_err(store_err)
  }

  async fn emit(&mut self, channel: Channel, event_type: &str, payload: Value) -> Result<EventId, ComponentError> {
    let event = CanvasEvent::new_in_chain(
      self.workflow_id,
      self.node_id.clone(),
      channel,
      event_type,
      payload,
      self.root_event_id,
      Utc::now(),
    );
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
      Some(self.execution_id),
      action_name,
      parameters,
      scheduled_at,
      now,
    );
    self.store.insert_request(&request).await.map_err(store_err)?;
    Ok(request.id)
  }

  /// Idempotent: if the execution already reached `finished` (a racing
  /// cancel, a concurrent handler) the conditional `UPDATE` simply affects
  /// no rows, matching the invariant "R.state=completed is monotone".
  async fn finish_passed(&mut self) -> Result<(), ComponentError> {
    self
      .store
      .conditional_finish_execution(self.execution_id, ExecutionResult::Passed, None, None, Utc::now())
      .await
      .map_err(store_err)?;
    Ok(())
  }

  async fn finish_with_result(
    &mut self,
    result: ExecutionResult,
    reason: Option<ResultReason>,
    message: String,
  ) -> Result<(), ComponentError> {
    self
      .store
      .conditional_finish_execution(self.execution_id, result, reason, Some(message), Utc::now())
      .await
      .map_err(store_err)?;
    Ok(())
  }

  async fn is_finished(&self) -> Result<bool, ComponentError> {
    let execution = self.store.fetch_execution(self.execution_id).await.map_err(store_err)?;
    Ok(execution.map(|e| e.state == ExecutionState::Finished).unwrap_or(true))
  }

  async fn notify(&mut self, notification: NotificationRequest) -> Result<(), ComponentError> {
    let payload = superplane_bus::NotificationEmailRequested {
      organization_id: self.organization_id,
      title: notification.title,
      body: notification.body,
      url: notification.url,
      url_label: notification.url_label,
      emails: notification.emails,
      groups: notification.groups,
      roles: notification.roles,
    };
    let _ = self.bus.publish(BusMessage::NotificationEmailRequested(payload)).await;
    Ok(())
  }

  fn secrets(&self) -> &dyn SecretReader {
    self.secrets.as_ref()
  }
}
