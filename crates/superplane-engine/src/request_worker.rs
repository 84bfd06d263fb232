use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

use superplane_bus::{Bus, BusMessage};
use superplane_component::ComponentRegistry;
use superplane_config::NodeRef;
use superplane_core::{ExecutionId, RequestId};
use superplane_execution::{CanvasNodeExecution, CanvasNodeRequest};
use superplane_store::{Claim, PgStore, StoreTransaction};
use superplane_workflow::BlueprintRegistry;

use crate::blueprint::split_child_node_id;
use crate::config::WorkerConfig;
use crate::context::{ActionDispatchContext, LiveExecutionContext, NodeRequestDispatchContext};
use crate::error::EngineError;
use crate::integration::IntegrationLookup;
use crate::secrets::{OrgSecretReader, SecretsBackend};

/// The Node Request Worker: executes deferred actions scheduled against a
/// node or an execution. Same poll/claim/dispatch shape as
/// `ExecutionWorker`, over `canvas_node_requests` instead of executions.
#[derive(Clone)]
pub struct RequestWorker {
  store: PgStore,
  bus: Arc<dyn Bus>,
  registry: Arc<ComponentRegistry>,
  blueprints: Arc<BlueprintRegistry>,
  secrets_backend: Arc<dyn SecretsBackend>,
  integrations: Arc<dyn IntegrationLookup>,
  config: WorkerConfig,
}

impl RequestWorker {
  pub fn new(
    store: PgStore,
    bus: Arc<dyn Bus>,
    registry: Arc<ComponentRegistry>,
    blueprints: Arc<BlueprintRegistry>,
    secrets_backend: Arc<dyn SecretsBackend>,
    integrations: Arc<dyn IntegrationLookup>,
    config: WorkerConfig,
  ) -> Self {
    Self { store, bus, registry, blueprints, secrets_backend, integrations, config }
  }

  pub async fn run(self, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(self.config.poll_interval);
    let semaphore = Arc::new(Semaphore::new(self.config.concurrency));

    info!("starting node request worker");
    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!("node request worker cancelled");
          break;
        }
        _ = ticker.tick() => {
          if let Err(err) = self.poll_once(&semaphore).await {
            error!(error = %err, "request worker poll failed");
          }
        }
      }
    }
  }

  async fn poll_once(&self, semaphore: &Arc<Semaphore>) -> Result<(), EngineError> {
    let ids = self.store.poll_pending_request_ids(Utc::now(), self.config.batch_size).await?;

    let mut handles = Vec::with_capacity(ids.len());
    for id in ids {
      let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
      let worker = self.clone();
      let span = info_span!("request", request_id = %id);
      handles.push(tokio::spawn(
        async move {
          let _permit = permit;
          if let Err(err) = worker.process_one(id).await {
            error!(error = %err, "request processing failed");
          }
        }
        .instrument(span),
      ));
    }

    for handle in handles {
      let _ = handle.await;
    }
    Ok(())
  }

  async fn process_one(&self, id: RequestId) -> Result<(), EngineError> {
    let mut tx = self.store.begin().await?;
    let request = match tx.claim_request(id).await? {
      Claim::Claimed(request) => request,
      Claim::Locked => {
        tx.rollback().await?;
        return Ok(());
      }
    };

    match request.execution_id {
      None => self.dispatch_node_request(tx, request).await,
      Some(execution_id) => self.dispatch_execution_request(tx, request, execution_id).await,
    }
  }

  /// §4.3 "Request on a trigger/component node (no execution-id)": the
  /// request targets the node itself, not one of its executions.
  async fn dispatch_node_request(
    &self,
    mut tx: StoreTransaction,
    mut request: CanvasNodeRequest,
  ) -> Result<(), EngineError> {
    let Some(node) = tx.get_live_node(request.workflow_id, &request.node_id).await? else {
      return self.complete_silently(tx, request).await;
    };

    let mut ctx = NodeRequestDispatchContext::new(
      self.store.clone(),
      request.workflow_id,
      request.node_id.clone(),
      request.spec.action_name.clone(),
      request.spec.parameters.clone(),
      node.configuration.clone(),
      self.secrets_reader(request.workflow_id).await?,
    );

    let outcome = match &node.node_ref {
      NodeRef::Trigger { name } => match self.registry.trigger(name) {
        Some(trigger) => trigger.handle_action(&mut ctx).await,
        None => Err(component_not_registered(name)),
      },
      NodeRef::Component { name } => match self.registry.component(name) {
        Some(component) => component.handle_node_action(&mut ctx).await,
        None => Err(component_not_registered(name)),
      },
      NodeRef::Blueprint { .. } => Err(superplane_component::ComponentError::ActionNotFound {
        action: request.spec.action_name.clone(),
      }),
    };

    self.finish_request_outcome(&mut tx, &mut request, outcome, node.ref_name()).await?;
    tx.commit().await?;
    Ok(())
  }

  /// §4.3 "Request on a component execution" / "Request on a child
  /// execution": the request targets a specific `CanvasNodeExecution`.
  async fn dispatch_execution_request(
    &self,
    mut tx: StoreTransaction,
    mut request: CanvasNodeRequest,
    execution_id: ExecutionId,
  ) -> Result<(), EngineError> {
    let Some(execution) = tx.get_execution(execution_id).await? else {
      return self.complete_silently(tx, request).await;
    };

    let dispatch = match execution.parent_execution_id {
      None => self.resolve_top_level_action(&mut tx, &execution).await?,
      Some(_) => self.resolve_child_action(&mut tx, &execution).await?,
    };

    let Some((component_name, component, integration_id, configuration)) = dispatch else {
      return self.complete_silently(tx, request).await;
    };

    if let Some(integration_id) = integration_id {
      if !self.integration_exists(integration_id).await? {
        return self.complete_silently(tx, request).await;
      }
    }

    let organization_id = tx.organization_for_workflow(execution.workflow_id).await?;
    let secrets = Arc::new(OrgSecretReader::new(self.secrets_backend.clone(), organization_id));
    let inner = LiveExecutionContext::new(
      self.store.clone(),
      self.bus.clone(),
      execution.workflow_id,
      execution.node_id.clone(),
      execution.id,
      execution.root_event_id,
      organization_id,
      configuration,
      secrets,
    );
    let mut ctx = ActionDispatchContext::new(inner, request.spec.action_name.clone(), request.spec.parameters.clone(), integration_id);

    let outcome = component.handle_action(&mut ctx).await;
    self.finish_request_outcome(&mut tx, &mut request, outcome, &component_name).await?;
    tx.commit().await?;

    self
      .bus
      .publish(BusMessage::ExecutionTouched {
        workflow_id: execution.workflow_id,
        execution_id: execution.id,
        node_id: execution.node_id,
      })
      .await
      .ok();

    Ok(())
  }

  /// The request targets a top-level `CanvasNodeExecution` owned directly
  /// by a canvas component node.
  async fn resolve_top_level_action(
    &self,
    tx: &mut StoreTransaction,
    execution: &CanvasNodeExecution,
  ) -> Result<Option<(String, Arc<dyn superplane_component::Component>, Option<superplane_core::IntegrationId>, serde_json::Value)>, EngineError> {
    let Some(node) = tx.get_live_node(execution.workflow_id, &execution.node_id).await? else {
      return Ok(None);
    };
    let NodeRef::Component { name } = &node.node_ref else {
      return Err(EngineError::InvalidParameters(format!(
        "request targets execution of non-component node {}",
        execution.node_id
      )));
    };
    let Some(component) = self.registry.component(name) else {
      return Ok(None);
    };
    Ok(Some((name.clone(), component, node.integration_id, execution.configuration.clone())))
  }

  /// The request targets a blueprint-internal child execution; its
  /// configuration is the snapshot already materialised onto the execution
  /// row, never the blueprint's own node definition (spec §9 "Blueprint
  /// child requests").
  async fn resolve_child_action(
    &self,
    tx: &mut StoreTransaction,
    execution: &CanvasNodeExecution,
  ) -> Result<Option<(String, Arc<dyn superplane_component::Component>, Option<superplane_core::IntegrationId>, serde_json::Value)>, EngineError> {
    let parent_id = execution.parent_execution_id.expect("child execution always has a parent");
    let Some(parent) = tx.get_execution(parent_id).await? else { return Ok(None) };
    let Some(parent_node) = tx.get_live_node(parent.workflow_id, &parent.node_id).await? else {
      return Ok(None);
    };
    let NodeRef::Blueprint { id: blueprint_id } = parent_node.node_ref else {
      return Err(EngineError::InvalidParameters("blueprint child's parent is not a blueprint node".to_string()));
    };
    let blueprint = self.blueprints.get(blueprint_id).ok_or(EngineError::BlueprintNotFound(blueprint_id))?;
    let internal_node_id =
      split_child_node_id(&execution.node_id).ok_or_else(|| EngineError::InvalidParameters(format!("malformed child node id {}", execution.node_id)))?;
    let internal_node = blueprint
      .get_node(&internal_node_id)
      .ok_or_else(|| EngineError::BlueprintNodeNotFound(blueprint_id, internal_node_id.clone()))?;
    let NodeRef::Component { name } = &internal_node.node_ref else {
      return Err(EngineError::InvalidParameters("blueprint entry node must be a component".to_string()));
    };
    let Some(component) = self.registry.component(name) else {
      return Ok(None);
    };
    Ok(Some((name.clone(), component, internal_node.integration_id, execution.configuration.clone())))
  }

  async fn integration_exists(&self, id: superplane_core::IntegrationId) -> Result<bool, EngineError> {
    self.integrations.exists(id).await.map_err(|err| EngineError::IntegrationLookup(err.to_string()))
  }

  async fn secrets_reader(&self, workflow_id: superplane_core::WorkflowId) -> Result<Arc<dyn superplane_component::SecretReader>, EngineError> {
    let organization_id = self.store.organization_for_workflow(workflow_id).await?;
    Ok(Arc::new(OrgSecretReader::new(self.secrets_backend.clone(), organization_id)))
  }

  /// §7 error taxonomy #5/#6: a request whose target no longer exists
  /// (soft-deleted node/workflow, unregistered component/integration gone
  /// missing between schedule and dispatch) completes as a no-op rather
  /// than a failure.
  async fn complete_silently(&self, mut tx: StoreTransaction, mut request: CanvasNodeRequest) -> Result<(), EngineError> {
    superplane_execution::finish_request(&mut request).map_err(|err| EngineError::InvalidParameters(err.to_string()))?;
    tx.update_request(&request).await?;
    tx.commit().await?;
    Ok(())
  }

  /// §7 error taxonomy #7: an unknown action name fails the request with a
  /// descriptive message naming both the action and the component/trigger.
  /// Any other handler error is likewise terminal — this worker does not
  /// implement a retry-with-backoff policy for request handler errors
  /// (spec §9's "may retry" is left to the component, via its own
  /// `schedule_action_call`).
  async fn finish_request_outcome(
    &self,
    tx: &mut StoreTransaction,
    request: &mut CanvasNodeRequest,
    outcome: Result<(), superplane_component::ComponentError>,
    implementation_name: &str,
  ) -> Result<(), EngineError> {
    match outcome {
      Ok(()) => {
        superplane_execution::finish_request(request).map_err(|err| EngineError::InvalidParameters(err.to_string()))?;
      }
      Err(superplane_component::ComponentError::ActionNotFound { action }) => {
        let message = format!("action {action} not found for component {implementation_name}");
        superplane_execution::retry_request(request, message, None)
          .map_err(|err| EngineError::InvalidParameters(err.to_string()))?;
      }
      Err(err) => {
        superplane_execution::retry_request(request, err.to_string(), None)
          .map_err(|err| EngineError::InvalidParameters(err.to_string()))?;
      }
    }
    tx.update_request(request).await?;
    Ok(())
  }
}

fn component_not_registered(name: &str) -> superplane_component::ComponentError {
  superplane_component::ComponentError::failed(format!("component not registered: {name}"))
}

trait RefName {
  fn ref_name(&self) -> &str;
}

impl RefName for superplane_store::StoredNode {
  fn ref_name(&self) -> &str {
    match &self.node_ref {
      NodeRef::Trigger { name } | NodeRef::Component { name } => name.as_str(),
      NodeRef::Blueprint { .. } => "<blueprint>",
    }
  }
}
