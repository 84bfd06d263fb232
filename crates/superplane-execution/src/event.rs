use chrono::{DateTime, Utc};
use serde_json::Value;

use superplane_core::{Channel, EventId, NodeId, WorkflowId};

/// An immutable record emitted by a node's output channel.
/// Events are never mutated after creation — there is no `update` method
/// anywhere in this crate for this type.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasEvent {
  pub id: EventId,
  pub workflow_id: WorkflowId,
  pub node_id: NodeId,
  pub channel: Channel,
  pub event_type: String,
  pub payload: Value,
  /// The originating event of this causal chain. Equal to `id` itself for
  /// events emitted by a trigger's `handle-action`.
  pub root_event_id: EventId,
  pub created_at: DateTime<Utc>,
}

impl CanvasEvent {
  /// Construct a root event: one that starts its own causal chain, so its
  /// `root_event_id` equals its own `id`.
  pub fn new_root(
    workflow_id: WorkflowId,
    node_id: NodeId,
    channel: Channel,
    event_type: impl Into<String>,
    payload: Value,
    created_at: DateTime<Utc>,
  ) -> Self {
    let id = EventId::new();
    Self {
      id,
      workflow_id,
      node_id,
      channel,
      event_type: event_type.into(),
      payload,
      root_event_id: id,
      created_at,
    }
  }

  /// Construct an event emitted downstream of an existing causal chain,
  /// inheriting the chain's root-event-id.
  pub fn new_in_chain(
    workflow_id: WorkflowId,
    node_id: NodeId,
    channel: Channel,
    event_type: impl Into<String>,
    payload: Value,
    root_event_id: EventId,
    created_at: DateTime<Utc>,
  ) -> Self {
    Self {
      id: EventId::new(),
      workflow_id,
      node_id,
      channel,
      event_type: event_type.into(),
      payload,
      root_event_id,
      created_at,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn root_event_roots_itself() {
    let event = CanvasEvent::new_root(
      WorkflowId::new(),
      NodeId::new("t"),
      Channel::default_channel(),
      "schedule.fired",
      Value::Null,
      Utc::now(),
    );
    assert_eq!(event.root_event_id, event.id);
  }

  #[test]
  fn chained_event_inherits_root() {
    let root_id = EventId::new();
    let event = CanvasEvent::new_in_chain(
      WorkflowId::new(),
      NodeId::new("c"),
      Channel::default_channel(),
      "output",
      Value::Null,
      root_id,
      Utc::now(),
    );
    assert_eq!(event.root_event_id, root_id);
    assert_ne!(event.id, root_id);
  }
}
