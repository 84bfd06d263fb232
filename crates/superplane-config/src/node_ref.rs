use serde::{Deserialize, Serialize};

use superplane_core::BlueprintId;

/// Which implementation a `CanvasNodeDef` loads. The discriminant mirrors
/// `NodeKind` but each variant carries only the fields that kind needs to
/// resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeRef {
  Trigger { name: String },
  Component { name: String },
  Blueprint { id: BlueprintId },
}

impl NodeRef {
  pub fn kind(&self) -> superplane_core::NodeKind {
    match self {
      NodeRef::Trigger { .. } => superplane_core::NodeKind::Trigger,
      NodeRef::Component { .. } => superplane_core::NodeKind::Component,
      NodeRef::Blueprint { .. } => superplane_core::NodeKind::Blueprint,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn trigger_ref_round_trips_through_json() {
    let r = NodeRef::Trigger { name: "schedule".into() };
    let json = serde_json::to_string(&r).unwrap();
    assert_eq!(json, r#"{"type":"trigger","name":"schedule"}"#);
    let back: NodeRef = serde_json::from_str(&json).unwrap();
    assert_eq!(back, r);
  }

  #[test]
  fn kind_matches_variant() {
    assert_eq!(
      NodeRef::Component { name: "noop".into() }.kind(),
      superplane_core::NodeKind::Component
    );
  }
}
