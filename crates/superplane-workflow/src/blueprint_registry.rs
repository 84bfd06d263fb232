use std::collections::HashMap;

use superplane_core::BlueprintId;

use crate::blueprint::Blueprint;

/// In-process lookup from `ref.blueprint.id` to its resolved sub-graph.
/// Built once at process start alongside the `ComponentRegistry` and
/// read concurrently without locking thereafter — blueprints are data,
/// not pluggable code, but the
/// engine needs the same kind of id → definition lookup to instantiate a
/// blueprint node's child execution.
#[derive(Debug, Default, Clone)]
pub struct BlueprintRegistry {
  blueprints: HashMap<BlueprintId, Blueprint>,
}

impl BlueprintRegistry {
  pub fn new(blueprints: Vec<Blueprint>) -> Self {
    Self { blueprints: blueprints.into_iter().map(|b| (b.id, b)).collect() }
  }

  pub fn get(&self, id: BlueprintId) -> Option<&Blueprint> {
    self.blueprints.get(&id)
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap as Map;

  use super::*;

  fn empty_blueprint(id: BlueprintId) -> Blueprint {
    Blueprint { id, name: "b".into(), nodes: Map::new(), edges: Vec::new(), output_channels: Vec::new() }
  }

  #[test]
  fn looks_up_registered_blueprint_by_id() {
    let id = BlueprintId::new();
    let registry = BlueprintRegistry::new(vec![empty_blueprint(id)]);
    assert!(registry.get(id).is_some());
    assert!(registry.get(BlueprintId::new()).is_none());
  }
}
