use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info_span, warn, Instrument};

use superplane_component::ComponentRegistry;
use superplane_config::NodeRef;
use superplane_core::IntegrationId;
use superplane_store::PgStore;

use crate::context::IntegrationMessageDispatchContext;
use crate::error::EngineError;
use crate::secrets::SecretsBackend;

/// The Integration Event Router (§4.4): fans a single payload delivered for
/// an integration out to every node subscribed to it. Only `Component`
/// nodes implement `on_integration_message` — triggers and blueprints never
/// subscribe directly — and one subscriber's failure never blocks delivery
/// to the rest.
#[derive(Clone)]
pub struct IntegrationRouter {
  store: PgStore,
  bus: Arc<dyn superplane_bus::Bus>,
  registry: Arc<ComponentRegistry>,
  secrets_backend: Arc<dyn SecretsBackend>,
}

impl IntegrationRouter {
  pub fn new(
    store: PgStore,
    bus: Arc<dyn superplane_bus::Bus>,
    registry: Arc<ComponentRegistry>,
    secrets_backend: Arc<dyn SecretsBackend>,
  ) -> Self {
    Self { store, bus, registry, secrets_backend }
  }

  pub async fn deliver(&self, integration_id: IntegrationId, payload: Value) -> Result<(), EngineError> {
    let subscriptions = self.store.subscriptions_for_integration(integration_id).await?;

    for subscription in subscriptions {
      let span = info_span!(
        "integration_message",
        integration_id = %integration_id,
        workflow_id = %subscription.workflow_id,
        node_id = %subscription.node_id,
      );
      let result = self.deliver_one(integration_id, &subscription, payload.clone()).instrument(span).await;
      if let Err(err) = result {
        error!(
          error = %err,
          workflow_id = %subscription.workflow_id,
          node_id = %subscription.node_id,
          "integration message delivery failed for one subscriber"
        );
      }
    }

    Ok(())
  }

  async fn deliver_one(
    &self,
    integration_id: IntegrationId,
    subscription: &superplane_execution::IntegrationSubscription,
    payload: Value,
  ) -> Result<(), EngineError> {
    let Some(node) = self.store.get_live_node(subscription.workflow_id, &subscription.node_id).await? else {
      return Ok(());
    };

    let NodeRef::Component { name } = &node.node_ref else {
      warn!(node_id = %subscription.node_id, "integration subscription on a non-component node, skipping");
      return Ok(());
    };

    let Some(component) = self.registry.component(name) else {
      return Err(EngineError::NotFound(format!("component not registered: {name}")));
    };

    let organization_id = self.store.organization_for_workflow(subscription.workflow_id).await?;
    let ctx = IntegrationMessageDispatchContext::new(
      self.store.clone(),
      self.bus.clone(),
      self.secrets_backend.clone(),
      organization_id,
      subscription.workflow_id,
      subscription.node_id.clone(),
      integration_id,
      subscription.configuration.clone(),
    );

    component.on_integration_message(&ctx, payload).await?;
    Ok(())
  }
}
