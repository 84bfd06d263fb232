use serde::{Deserialize, Serialize};

use superplane_core::{OrganizationId, WorkflowId};

use crate::edge::EdgeDef;
use crate::node::CanvasNodeDef;

/// The declarative shape of an entire workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasDef {
  pub workflow_id: WorkflowId,
  pub organization_id: OrganizationId,
  pub name: String,
  pub nodes: Vec<CanvasNodeDef>,
  pub edges: Vec<EdgeDef>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn deserializes_a_minimal_canvas() {
    let json = serde_json::json!({
      "workflow_id": "11111111-1111-1111-1111-111111111111",
      "organization_id": "22222222-2222-2222-2222-222222222222",
      "name": "onboarding",
      "nodes": [
        {"node_id": "t", "type": "trigger", "name": "schedule"},
        {"node_id": "c", "type": "component", "name": "noop"}
      ],
      "edges": [{"from": "t", "to": "c", "channel": "default"}]
    });
    let canvas: CanvasDef = serde_json::from_value(json).unwrap();
    assert_eq!(canvas.nodes.len(), 2);
    assert_eq!(canvas.edges[0].channel.as_str(), "default");
  }
}
