use chrono::{DateTime, Utc};
use serde_json::Value;

use superplane_core::{EventId, ExecutionId, ExecutionResult, ExecutionState, NodeId, ResultReason, WorkflowId};

/// One activation of a node for a root event. The
/// unit of work the Node Execution Worker drives to a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasNodeExecution {
  pub id: ExecutionId,
  pub workflow_id: WorkflowId,
  pub node_id: NodeId,
  /// Materialised configuration snapshot, built by template evaluation
  /// before the component runs (or, for blueprint child executions,
  /// copied verbatim at instantiation — never re-resolved).
  pub configuration: Value,
  /// Component-owned free-form state.
  pub metadata: Value,
  pub parent_execution_id: Option<ExecutionId>,
  pub root_event_id: EventId,
  pub state: ExecutionState,
  pub result: Option<ExecutionResult>,
  pub result_reason: Option<ResultReason>,
  pub result_message: Option<String>,
  pub created_at: DateTime<Utc>,
  pub started_at: Option<DateTime<Utc>>,
  pub finished_at: Option<DateTime<Utc>>,
  pub scheduled_at: DateTime<Utc>,
}

impl CanvasNodeExecution {
  pub fn new_pending(
    workflow_id: WorkflowId,
    node_id: NodeId,
    root_event_id: EventId,
    parent_execution_id: Option<ExecutionId>,
    configuration: Value,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      id: ExecutionId::new(),
      workflow_id,
      node_id,
      configuration,
      metadata: Value::Null,
      parent_execution_id,
      root_event_id,
      state: ExecutionState::Pending,
      result: None,
      result_reason: None,
      result_message: None,
      created_at: now,
      started_at: None,
      finished_at: None,
      scheduled_at: now,
    }
  }

  pub fn is_finished(&self) -> bool {
    self.state == ExecutionState::Finished
  }

  pub fn is_top_level(&self) -> bool {
    self.parent_execution_id.is_none()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_pending_execution_has_no_result() {
    let exec = CanvasNodeExecution::new_pending(
      WorkflowId::new(),
      NodeId::new("c"),
      EventId::new(),
      None,
      Value::Null,
      Utc::now(),
    );
    assert_eq!(exec.state, ExecutionState::Pending);
    assert!(exec.result.is_none());
    assert!(exec.is_top_level());
  }
}
