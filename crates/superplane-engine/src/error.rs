use thiserror::Error;

use superplane_component::ComponentError;
use superplane_store::StoreError;
use superplane_template::ConfigBuildError;

/// Worker-boundary error surface. Every variant carries enough
/// structure to be persisted verbatim into `result_reason`/`result_message`
/// without string-matching a `Display` output.
#[derive(Debug, Error)]
pub enum EngineError {
  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Component(#[from] ComponentError),

  #[error(transparent)]
  ConfigBuild(#[from] ConfigBuildError),

  #[error("action not found: {action} for component {component}")]
  ActionNotFound { action: String, component: String },

  #[error("malformed request parameters: {0}")]
  InvalidParameters(String),

  #[error("blueprint not found: {0}")]
  BlueprintNotFound(superplane_core::BlueprintId),

  #[error("blueprint has no entry node")]
  BlueprintHasNoEntryNode,

  #[error("blueprint {0} has no node {1}")]
  BlueprintNodeNotFound(superplane_core::BlueprintId, superplane_core::NodeId),

  #[error("integration lookup failed: {0}")]
  IntegrationLookup(String),

  #[error("not found: {0}")]
  NotFound(String),
}
