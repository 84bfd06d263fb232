use serde::{Deserialize, Serialize};
use serde_json::Value;

use superplane_core::{IntegrationId, NodeId};

use crate::node_ref::NodeRef;

/// The declarative, not-yet-validated shape of a canvas node as authored by
/// a user (or read back from the store prior to resolution).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNodeDef {
  pub node_id: NodeId,
  #[serde(flatten)]
  pub node_ref: NodeRef,
  #[serde(default)]
  pub configuration: Value,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub integration_id: Option<IntegrationId>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn deserializes_a_component_node() {
    let json = serde_json::json!({
      "node_id": "send-email",
      "type": "component",
      "name": "email.send",
      "configuration": {"to": "{{ event.payload.email }}"}
    });
    let node: CanvasNodeDef = serde_json::from_value(json).unwrap();
    assert_eq!(node.node_id.as_str(), "send-email");
    assert!(matches!(node.node_ref, crate::node_ref::NodeRef::Component { .. }));
  }

  #[test]
  fn configuration_defaults_to_null() {
    let json = serde_json::json!({"node_id": "t", "type": "trigger", "name": "schedule"});
    let node: CanvasNodeDef = serde_json::from_value(json).unwrap();
    assert!(node.configuration.is_null());
  }
}
