use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use superplane_bus::{Bus, BusMessage};
use superplane_component::ComponentRegistry;
use superplane_config::NodeRef;
use superplane_core::{Channel, EventId, ExecutionId, ExecutionResult, NodeId, RequestId, ResultReason, WorkflowId};
use superplane_execution::{CanvasEvent, CanvasNodeExecution, CanvasNodeRequest};
use superplane_store::{Claim, PgStore};

use crate::error::EngineError;
use crate::integration_router::IntegrationRouter;
use crate::secrets::{OrgSecretReader, SecretsBackend};

/// The four inbound contracts the core exposes to its collaborators (§6):
/// the upstream event-routing subsystem that fires executions off edges,
/// the APIs/timers/component contexts that schedule requests, direct event
/// insertion, and user-initiated cancellation. Everything else inbound
/// (webhooks, integration polling) already has its own entry point — this
/// is the thin facade tying them to one store handle.
#[derive(Clone)]
pub struct Core {
  store: PgStore,
  bus: Arc<dyn Bus>,
  registry: Arc<ComponentRegistry>,
  integration_router: IntegrationRouter,
  secrets_backend: Arc<dyn SecretsBackend>,
}

impl Core {
  pub fn new(
    store: PgStore,
    bus: Arc<dyn Bus>,
    registry: Arc<ComponentRegistry>,
    integration_router: IntegrationRouter,
    secrets_backend: Arc<dyn SecretsBackend>,
  ) -> Self {
    Self { store, bus, registry, integration_router, secrets_backend }
  }

  /// Called by the upstream event-routing subsystem when an edge fires.
  /// Without an explicit `config_snapshot`, the node's own configuration
  /// template is copied verbatim — the Node Execution Worker resolves it
  /// against the triggering event at claim time, same as any other
  /// top-level execution.
  pub async fn enqueue_execution(
    &self,
    workflow_id: WorkflowId,
    node_id: NodeId,
    root_event_id: EventId,
    parent_execution_id: Option<ExecutionId>,
    config_snapshot: Option<Value>,
  ) -> Result<ExecutionId, EngineError> {
    let configuration = match config_snapshot {
      Some(value) => value,
      None => {
        let node = self
          .store
          .get_live_node(workflow_id, &node_id)
          .await?
          .ok_or_else(|| EngineError::NotFound(format!("node {node_id} in workflow {workflow_id}")))?;
        node.configuration
      }
    };

    let execution =
      CanvasNodeExecution::new_pending(workflow_id, node_id, root_event_id, parent_execution_id, configuration, Utc::now());
    let mut tx = self.store.begin().await?;
    tx.insert_execution(&execution).await?;
    tx.commit().await?;
    Ok(execution.id)
  }

  /// Called by APIs, timers, and component contexts (via
  /// `schedule-action-call`, which already goes straight through the
  /// context's own transaction — this path is for callers outside one).
  pub async fn enqueue_request(
    &self,
    workflow_id: WorkflowId,
    node_id: NodeId,
    execution_id: Option<ExecutionId>,
    action_name: impl Into<String>,
    params: Value,
    scheduled_at: DateTime<Utc>,
  ) -> Result<RequestId, EngineError> {
    let request =
      CanvasNodeRequest::new_invoke_action(workflow_id, node_id, execution_id, action_name, params, scheduled_at, Utc::now());
    self.store.insert_request(&request).await?;
    Ok(request.id)
  }

  /// Direct event insertion, outside any execution's own causal chain
  /// bookkeeping — the caller supplies `root_event_id` itself (its own id,
  /// for a fresh chain, or an existing chain's root to continue it).
  pub async fn emit_event(
    &self,
    workflow_id: WorkflowId,
    node_id: NodeId,
    channel: Channel,
    event_type: impl Into<String>,
    payload: Value,
    root_event_id: EventId,
  ) -> Result<EventId, EngineError> {
    let event = CanvasEvent::new_in_chain(workflow_id, node_id, channel, event_type, payload, root_event_id, Utc::now());
    self.store.insert_event(&event).await?;
    Ok(event.id)
  }

  /// Called by the integration HTTP/polling layer.
  pub async fn deliver_integration_event(&self, integration_id: superplane_core::IntegrationId, payload: Value) -> Result<(), EngineError> {
    self.integration_router.deliver(integration_id, payload).await
  }

  /// User-initiated cancellation: writes `state=finished, result=cancelled`
  /// and (best-effort) calls the component's `cancel` handler inside the
  /// same transaction — both land in one commit, or neither does. The row
  /// lock is acquired through `claim_execution` (it locks by id regardless
  /// of current state), so a concurrent claim by a worker and a concurrent
  /// cancel serialise on the same row rather than racing independently.
  /// A handler error is logged and swallowed: the cancellation still
  /// commits, since the state transition has already been applied to the
  /// in-memory row before the handler runs.
  pub async fn cancel_execution(&self, execution_id: ExecutionId, _user_id: superplane_core::OrganizationId) -> Result<(), EngineError> {
    let mut tx = self.store.begin().await?;
    let claim = match tx.claim_execution(execution_id).await {
      Ok(claim) => claim,
      Err(superplane_store::StoreError::NotFound(_)) => {
        tx.rollback().await?;
        return Ok(());
      }
      Err(err) => return Err(err.into()),
    };
    let mut execution = match claim {
      Claim::Claimed(execution) => execution,
      Claim::Locked => {
        tx.rollback().await?;
        return Ok(());
      }
    };

    if execution.is_finished() {
      tx.rollback().await?;
      return Ok(());
    }

    let Some(node) = tx.get_live_node(execution.workflow_id, &execution.node_id).await? else {
      tx.rollback().await?;
      return Ok(());
    };

    let now = Utc::now();
    let organization_id = tx.organization_for_workflow(execution.workflow_id).await?;
    superplane_execution::finish_execution(&mut execution, ExecutionResult::Cancelled, Some(ResultReason::CancelledByUser), None, now)
      .map_err(|err| EngineError::InvalidParameters(err.to_string()))?;

    let mut notifications = Vec::new();
    if let NodeRef::Component { name } = &node.node_ref {
      if let Some(component) = self.registry.component(name) {
        let secrets = OrgSecretReader::new(self.secrets_backend.clone(), organization_id);
        let mut ctx = crate::context::ClaimedExecutionContext::new(&mut tx, execution, &secrets, now);
        if let Err(err) = component.cancel(&mut ctx).await {
          tracing::warn!(error = %err, execution_id = %execution_id, "cancel handler failed, cancellation still commits in the same transaction");
        }
        let (updated_execution, ctx_notifications) = ctx.into_parts();
        execution = updated_execution;
        notifications = ctx_notifications;
      }
    }

    tx.update_execution(&execution).await?;
    tx.commit().await?;

    for notification in notifications {
      let message = superplane_bus::NotificationEmailRequested {
        organization_id,
        title: notification.title,
        body: notification.body,
        url: notification.url,
        url_label: notification.url_label,
        emails: notification.emails,
        groups: notification.groups,
        roles: notification.roles,
      };
      let _ = self.bus.publish(BusMessage::NotificationEmailRequested(message)).await;
    }

    Ok(())
  }
}
