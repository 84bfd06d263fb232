use std::collections::HashMap;
use std::sync::Arc;

use crate::contract::{Component, Trigger};

/// Either half of the registry's lookup result.
#[derive(Clone)]
pub enum Implementation {
  Component(Arc<dyn Component>),
  Trigger(Arc<dyn Trigger>),
}

/// In-process lookup from `ref.component.name`/`ref.trigger.name` to its
/// implementation. Built once at process start from a caller-supplied list and
/// read concurrently thereafter without locking.
///
/// Components here are native trait objects registered in memory at
/// start-up, not `.wasm` packages resolved from disk.
pub struct ComponentRegistry {
  components: HashMap<String, Arc<dyn Component>>,
  triggers: HashMap<String, Arc<dyn Trigger>>,
}

impl ComponentRegistry {
  pub fn new(
    components: Vec<Arc<dyn Component>>,
    triggers: Vec<Arc<dyn Trigger>>,
  ) -> Self {
    Self {
      components: components.into_iter().map(|c| (c.name().to_string(), c)).collect(),
      triggers: triggers.into_iter().map(|t| (t.name().to_string(), t)).collect(),
    }
  }

  pub fn component(&self, name: &str) -> Option<Arc<dyn Component>> {
    self.components.get(name).cloned()
  }

  pub fn trigger(&self, name: &str) -> Option<Arc<dyn Trigger>> {
    self.triggers.get(name).cloned()
  }

  pub fn lookup(&self, kind: superplane_core::NodeKind, name: &str) -> Option<Implementation> {
    match kind {
      superplane_core::NodeKind::Component => self.component(name).map(Implementation::Component),
      superplane_core::NodeKind::Trigger => self.trigger(name).map(Implementation::Trigger),
      superplane_core::NodeKind::Blueprint => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use async_trait::async_trait;
  use serde_json::Value;

  use super::*;
  use crate::context::ExecutionMetadataContext;
  use crate::error::ComponentError;

  struct Noop;

  #[async_trait]
  impl Component for Noop {
    fn name(&self) -> &str {
      "noop"
    }

    fn configuration_schema(&self) -> Vec<crate::ConfigurationField> {
      Vec::new()
    }

    fn output_channels(&self, _config: &Value) -> Vec<superplane_core::Channel> {
      vec![superplane_core::Channel::default_channel()]
    }

    async fn execute(&self, ctx: &mut dyn ExecutionMetadataContext) -> Result<(), ComponentError> {
      ctx.finish_passed().await
    }
  }

  #[test]
  fn looks_up_registered_component_by_name() {
    let registry = ComponentRegistry::new(vec![Arc::new(Noop)], vec![]);
    assert!(registry.component("noop").is_some());
    assert!(registry.component("does-not-exist").is_none());
  }

  #[test]
  fn lookup_by_kind_dispatches_to_the_right_map() {
    let registry = ComponentRegistry::new(vec![Arc::new(Noop)], vec![]);
    assert!(matches!(
      registry.lookup(superplane_core::NodeKind::Component, "noop"),
      Some(Implementation::Component(_))
    ));
    assert!(registry.lookup(superplane_core::NodeKind::Trigger, "noop").is_none());
    assert!(registry.lookup(superplane_core::NodeKind::Blueprint, "anything").is_none());
  }
}
