use async_trait::async_trait;
use serde_json::Value;

use crate::context::{
  ActionContext, ExecutionMetadataContext, IntegrationMessageContext, NodeRequestContext,
  WebhookContext,
};
use crate::error::ComponentError;

/// A single field in a component/trigger's declared configuration shape.
/// Intentionally coarse — shape enforcement beyond "is this JSON" belongs
/// to the excluded HTTP/CLI surface's validation layer, not the
/// execution core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationField {
  pub name: String,
  pub description: String,
  pub required: bool,
}

/// A named deferred callback a component/trigger can schedule via
/// `schedule-action-call`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpec {
  pub name: String,
  pub description: String,
}

/// A node that reacts to events and performs side effects.
/// Implementations are looked up by name in the `ComponentRegistry` and
/// never hold a database handle of their own — all persistence happens
/// through the context objects passed to each method.
#[async_trait]
pub trait Component: Send + Sync {
  fn name(&self) -> &str;
  fn configuration_schema(&self) -> Vec<ConfigurationField>;
  fn output_channels(&self, config: &Value) -> Vec<superplane_core::Channel>;
  fn actions(&self) -> Vec<ActionSpec> {
    Vec::new()
  }

  /// Called once when a node referencing this component is created or its
  /// configuration changes.
  async fn setup(&self, ctx: &mut dyn NodeRequestContext) -> Result<(), ComponentError> {
    let _ = ctx;
    Ok(())
  }

  /// Called for each pending execution.
  async fn execute(&self, ctx: &mut dyn ExecutionMetadataContext) -> Result<(), ComponentError>;

  /// Invoked by the request worker for one of this component's `actions()`,
  /// for a request scoped to a specific execution.
  async fn handle_action(&self, ctx: &mut dyn ActionContext) -> Result<(), ComponentError> {
    Err(ComponentError::ActionNotFound { action: ctx.action_name().to_string() })
  }

  /// Invoked by the request worker for a request against the *node* itself
  /// rather than one of its executions (no execution-id) — e.g. a
  /// component-level setup callback. Most components never schedule one of
  /// these; the default mirrors `handle_action`'s "unknown action" error.
  async fn handle_node_action(&self, ctx: &mut dyn NodeRequestContext) -> Result<(), ComponentError> {
    Err(ComponentError::ActionNotFound { action: ctx.action_name().to_string() })
  }

  /// Direct HTTP delivery to this node.
  async fn handle_webhook(
    &self,
    ctx: &mut dyn WebhookContext,
  ) -> Result<u16, ComponentError> {
    let _ = ctx;
    Ok(404)
  }

  /// Consume an integration-routed message. Only
  /// components that subscribe to an integration need override this.
  async fn on_integration_message(
    &self,
    ctx: &dyn IntegrationMessageContext,
    payload: Value,
  ) -> Result<(), ComponentError> {
    let _ = (ctx, payload);
    Ok(())
  }

  /// Called when a user cancels a started execution.
  async fn cancel(&self, ctx: &mut dyn ExecutionMetadataContext) -> Result<(), ComponentError> {
    let _ = ctx;
    Ok(())
  }

  /// Called on node deletion.
  async fn cleanup(&self, ctx: &mut dyn NodeRequestContext) -> Result<(), ComponentError> {
    let _ = ctx;
    Ok(())
  }
}

/// A node that creates events from external signals. Same shape as `Component` minus execution ownership — a
/// trigger's `handle_action` typically emits a `CanvasEvent` rather than
/// completing a unit of work it owns.
#[async_trait]
pub trait Trigger: Send + Sync {
  fn name(&self) -> &str;
  fn configuration_schema(&self) -> Vec<ConfigurationField>;
  fn output_channels(&self, config: &Value) -> Vec<superplane_core::Channel>;
  fn actions(&self) -> Vec<ActionSpec> {
    Vec::new()
  }

  async fn setup(&self, ctx: &mut dyn NodeRequestContext) -> Result<(), ComponentError> {
    let _ = ctx;
    Ok(())
  }

  async fn handle_action(&self, ctx: &mut dyn NodeRequestContext) -> Result<(), ComponentError> {
    Err(ComponentError::ActionNotFound { action: ctx.action_name().to_string() })
  }

  async fn handle_webhook(
    &self,
    ctx: &mut dyn WebhookContext,
  ) -> Result<u16, ComponentError> {
    let _ = ctx;
    Ok(404)
  }

  async fn cleanup(&self, ctx: &mut dyn NodeRequestContext) -> Result<(), ComponentError> {
    let _ = ctx;
    Ok(())
  }
}
