use chrono::{DateTime, Utc};

use superplane_core::{Channel, ExecutionResult, NodeId, ResultReason, WorkflowId};
use superplane_execution::CanvasNodeExecution;
use superplane_store::StoreTransaction;
use superplane_workflow::Blueprint;

use crate::error::EngineError;

/// A blueprint node's internal nodes have no row of their own in
/// `canvas_nodes` — they're addressed as `"<blueprint-node-id>:<internal-
/// node-id>"`, scoped to the instantiating parent execution. This is the only place that slug is built,
/// so every other lookup of a blueprint-child's node agrees with it.
pub fn child_node_id(parent_node_id: &NodeId, internal_node_id: &NodeId) -> NodeId {
  NodeId::new(format!("{}:{}", parent_node_id.as_str(), internal_node_id.as_str()))
}

/// Reverse of `child_node_id`: recover the blueprint's own internal node id
/// from a child execution's `node_id`. Only ever called by the request
/// worker dispatching an action against a child execution — blueprints are
/// not nested in this design, so the first `:` is the only one expected.
pub fn split_child_node_id(node_id: &NodeId) -> Option<NodeId> {
  node_id.as_str().split_once(':').map(|(_, internal)| NodeId::new(internal))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn split_recovers_the_internal_node_id() {
    let parent = NodeId::new("fan-out");
    let internal = NodeId::new("notify");
    let child = child_node_id(&parent, &internal);
    assert_eq!(split_child_node_id(&child), Some(internal));
  }
}

/// Instantiate the single child execution for a blueprint node that just
/// transitioned to `started`. Only the blueprint's
/// entry node is instantiated — fan-out across the blueprint's own
/// internal edges is this same worker's job on the child's own tick, once
/// the resolved sub-graph is addressed through `child_node_id`.
pub fn instantiate_entry_child(
  blueprint: &Blueprint,
  parent: &CanvasNodeExecution,
  now: DateTime<Utc>,
) -> Result<CanvasNodeExecution, EngineError> {
  let entry_node_id = blueprint.entry_node().ok_or(EngineError::BlueprintHasNoEntryNode)?;
  let entry_node = blueprint.get_node(entry_node_id).ok_or(EngineError::BlueprintHasNoEntryNode)?;

  Ok(CanvasNodeExecution::new_pending(
    parent.workflow_id,
    child_node_id(&parent.node_id, entry_node_id),
    parent.root_event_id,
    Some(parent.id),
    entry_node.configuration.clone(),
    now,
  ))
}

/// What the worker should do with the parent once a child execution
/// finishes: the parent takes the child's own result, and
/// any of the child's emitted events on a mapped output channel get
/// replayed as the parent's own events on the blueprint's external
/// channel, so downstream edges attached to the blueprint node see them.
pub struct ParentCompletion {
  pub result: ExecutionResult,
  pub reason: Option<ResultReason>,
  pub message: Option<String>,
  pub replayed_events: Vec<(Channel, String, serde_json::Value)>,
}

/// Build the parent's completion from a just-finished child, replaying any
/// of its events that land on a blueprint output channel. `child` must
/// already be `finished`; the entry node id is the blueprint's own
/// first-node, matching whichever one `instantiate_entry_child` used.
pub async fn propagate_child_completion(
  tx: &mut StoreTransaction,
  blueprint: &Blueprint,
  parent_workflow_id: WorkflowId,
  child: &CanvasNodeExecution,
) -> Result<ParentCompletion, EngineError> {
  let entry_node_id = blueprint.entry_node().ok_or(EngineError::BlueprintHasNoEntryNode)?;

  let events = tx.events_emitted_by(parent_workflow_id, &child.node_id, child.root_event_id).await?;
  let mut replayed = Vec::new();
  for event in events {
    if let Some(external) = blueprint.external_channel_for(entry_node_id, &event.channel) {
      replayed.push((external.clone(), event.event_type, event.payload));
    }
  }

  Ok(ParentCompletion {
    result: child.result.unwrap_or(ExecutionResult::Failed),
    reason: child.result_reason.clone(),
    message: child.result_message.clone(),
    replayed_events: replayed,
  })
}

