use std::cell::RefCell;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use superplane_component::{ComponentError, ExecutionMetadataContext, NotificationRequest, SecretReader};
use superplane_core::{Channel, EventId, ExecutionId, ExecutionResult, NodeId, RequestId, ResultReason, WorkflowId};
use superplane_execution::{CanvasEvent, CanvasNodeExecution, CanvasNodeRequest, ExecutionKv};
use superplane_store::{StoreError, StoreTransaction};

fn store_err(err: StoreError) -> ComponentError {
  ComponentError::failed(err.to_string())
}

/// The `ExecutionMetadataContext` the Node Execution Worker builds around
/// its own open claim. Borrows the transaction that
/// already holds this execution's row lock for the whole call to
/// `execute`/`cancel` — nothing here starts a new transaction or outlives
/// the worker's own claim.
///
/// `get_kv`/`is_finished` are `&self` on the trait (components may read
/// their own state without declaring a mutation), but issuing a query
/// still needs `&mut StoreTransaction` in sqlx — hence the `RefCell`
/// around the borrowed transaction; nothing in this type is ever accessed
/// concurrently, so the runtime borrow check never contends.
pub struct ClaimedExecutionContext<'a> {
  tx: RefCell<&'a mut StoreTransaction>,
  execution: CanvasNodeExecution,
  secrets: &'a dyn SecretReader,
  notifications: Vec<NotificationRequest>,
  now: DateTime<Utc>,
}

impl<'a> ClaimedExecutionContext<'a> {
  pub fn new(
    tx: &'a mut StoreTransaction,
    execution: CanvasNodeExecution,
    secrets: &'a dyn SecretReader,
    now: DateTime<Utc>,
  ) -> Self {
    Self { tx: RefCell::new(tx), execution, secrets, notifications: Vec::new(), now }
  }

  pub fn execution(&self) -> &CanvasNodeExecution {
    &self.execution
  }

  /// Hand back the (possibly mutated) execution row and any buffered
  /// notifications, ending this context's borrow of the transaction so the
  /// worker can resume using it directly (e.g. to persist the row and then
  /// commit).
  pub fn into_parts(self) -> (CanvasNodeExecution, Vec<NotificationRequest>) {
    (self.execution, self.notifications)
  }
}

#[async_trait]
impl ExecutionMetadataContext for ClaimedExecutionContext<'_> {
  fn workflow_id(&self) -> WorkflowId {
    self.execution.workflow_id
  }

  fn node_id(&self) -> &NodeId {
    &self.execution.node_id
  }

  fn execution_id(&self) -> ExecutionId {
    self.execution.id
  }

  fn root_event_id(&self) -> EventId {
    self.execution.root_event_id
  }

  fn configuration(&self) -> &Value {
    &self.execution.configuration
  }

  async fn get_metadata(&self) -> Result<Value, ComponentError> {
    Ok(self.execution.metadata.clone())
  }

  async fn set_metadata(&mut self, value: Value) -> Result<(), ComponentError> {
    self.execution.metadata = value;
    Ok(())
  }

  async fn get_kv(&self, key: &str) -> Result<Option<String>, ComponentError> {
    self.tx.borrow_mut().get_kv(self.execution.id, key).await.map_err(store_err)
  }

  async fn set_kv(&mut self, key: &str, value: &str) -> Result<(), ComponentError> {
    let kv = ExecutionKv { execution_id: self.execution.id, key: key.to_string(), value: value.to_string() };
    self.tx.borrow_mut().set_kv(&kv).await.map_err(store_err)
  }

  async fn emit(&mut self, channel: Channel, event_type: &str, payload: Value) -> Result<EventId, ComponentError> {
    let event = CanvasEvent::new_in_chain(
      self.execution.workflow_id,
      self.execution.node_id.clone(),
      channel,
      event_type,
      payload,
      self.execution.root_event_id,
      self.now,
    );
    self.tx.borrow_mut().insert_event(&event).await.map_err(store_err)?;
    Ok(event.id)
  }

  async fn schedule_action_call(
    &mut self,
    action_name: &str,
    parameters: Value,
    delay: Duration,
  ) -> Result<RequestId, ComponentError> {
    let scheduled_at = self.now + chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::zero());
    let request = CanvasNodeRequest::new_invoke_action(
      self.execution.workflow_id,
      self.execution.node_id.clone(),
      Some(self.execution.id),
      action_name,
      parameters,
      scheduled_at,
      self.now,
    );
    self.tx.borrow_mut().insert_request(&request).await.map_err(store_err)?;
    Ok(request.id)
  }

  async fn finish_passed(&mut self) -> Result<(), ComponentError> {
    superplane_execution::finish_execution(&mut self.execution, ExecutionResult::Passed, None, None, self.now)
      .map_err(|err| ComponentError::failed(err.to_string()))
  }

  async fn finish_with_result(
    &mut self,
    result: ExecutionResult,
    reason: Option<ResultReason>,
    message: String,
  ) -> Result<(), ComponentError> {
    superplane_execution::finish_execution(&mut self.execution, result, reason, Some(message), self.now)
      .map_err(|err| ComponentError::failed(err.to_string()))
  }

  async fn is_finished(&self) -> Result<bool, ComponentError> {
    Ok(self.execution.is_finished())
  }

  async fn notify(&mut self, notification: NotificationRequest) -> Result<(), ComponentError> {
    self.notifications.push(notification);
    Ok(())
  }

  fn secrets(&self) -> &dyn SecretReader {
    self.secrets
  }
}
