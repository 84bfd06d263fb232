use serde::{Deserialize, Serialize};

use superplane_core::{ExecutionId, NodeId, OrganizationId, WorkflowId};

/// Stable routing keys.
/// `InvitationCreated` is out of core scope but kept as a variant so the
/// enum remains the single source of truth for valid keys on this bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingKey {
  WorkflowExecution,
  NotificationEmailRequested,
  InvitationCreated,
}

impl RoutingKey {
  pub fn as_str(&self) -> &'static str {
    match self {
      RoutingKey::WorkflowExecution => "workflow.execution",
      RoutingKey::NotificationEmailRequested => "workflow.notification-email-requested",
      RoutingKey::InvitationCreated => "workflow.invitation-created",
    }
  }
}

/// Payload for `workflow.notification-email-requested`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEmailRequested {
  pub organization_id: OrganizationId,
  pub title: String,
  pub body: String,
  pub url: Option<String>,
  pub url_label: Option<String>,
  pub emails: Vec<String>,
  pub groups: Vec<String>,
  pub roles: Vec<String>,
}

/// A bus message this core publishes or consumes. Each variant carries its
/// own `RoutingKey` so publishers can't mismatch a payload to the wrong
/// topic.
#[derive(Debug, Clone, PartialEq)]
pub enum BusMessage {
  /// Per-execution wake-up published after a request worker commits a
  /// request scoped to this execution, keyed by workflow+execution so
  /// the execution worker can react on its next tick.
  ExecutionTouched { workflow_id: WorkflowId, execution_id: ExecutionId, node_id: NodeId },
  NotificationEmailRequested(NotificationEmailRequested),
}

impl BusMessage {
  pub fn routing_key(&self) -> RoutingKey {
    match self {
      BusMessage::ExecutionTouched { .. } => RoutingKey::WorkflowExecution,
      BusMessage::NotificationEmailRequested(_) => RoutingKey::NotificationEmailRequested,
    }
  }
}
