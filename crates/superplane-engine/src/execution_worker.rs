use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

use superplane_bus::{Bus, BusMessage};
use superplane_component::ComponentRegistry;
use superplane_config::NodeRef;
use superplane_core::{ExecutionId, ExecutionResult, NodeId, ResultReason};
use superplane_execution::CanvasNodeExecution;
use superplane_store::{Claim, PgStore, StoreTransaction};
use superplane_template::{build_configuration, TemplateContext};
use superplane_workflow::BlueprintRegistry;

use crate::blueprint;
use crate::config::WorkerConfig;
use crate::context::ClaimedExecutionContext;
use crate::error::EngineError;
use crate::secrets::{OrgSecretReader, SecretsBackend};

/// The Node Execution Worker: advances every pending
/// execution to a terminal state through a 1s poll loop, semaphore-bounded
/// concurrent dispatch, and a single transaction per claimed row.
#[derive(Clone)]
pub struct ExecutionWorker {
  store: PgStore,
  bus: Arc<dyn Bus>,
  registry: Arc<ComponentRegistry>,
  blueprints: Arc<BlueprintRegistry>,
  secrets_backend: Arc<dyn SecretsBackend>,
  config: WorkerConfig,
}

impl ExecutionWorker {
  pub fn new(
    store: PgStore,
    bus: Arc<dyn Bus>,
    registry: Arc<ComponentRegistry>,
    blueprints: Arc<BlueprintRegistry>,
    secrets_backend: Arc<dyn SecretsBackend>,
    config: WorkerConfig,
  ) -> Self {
    Self { store, bus, registry, blueprints, secrets_backend, config }
  }

  /// Run until `cancel` fires: a `tokio::select!` over a fixed-interval
  /// poll tick and the cancellation token.
  pub async fn run(self, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(self.config.poll_interval);
    let semaphore = Arc::new(Semaphore::new(self.config.concurrency));

    info!("starting node execution worker");
    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!("node execution worker cancelled");
          break;
        }
        _ = ticker.tick() => {
          if let Err(err) = self.poll_once(&semaphore).await {
            error!(error = %err, "execution worker poll failed");
          }
        }
      }
    }
  }

  async fn poll_once(&self, semaphore: &Arc<Semaphore>) -> Result<(), EngineError> {
    let ids = self.store.poll_pending_execution_ids(Utc::now(), self.config.batch_size).await?;

    let mut handles = Vec::with_capacity(ids.len());
    for id in ids {
      let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
      let worker = self.clone();
      let span = info_span!("execution", execution_id = %id);
      handles.push(tokio::spawn(
        async move {
          let _permit = permit;
          if let Err(err) = worker.process_one(id).await {
            error!(error = %err, "execution processing failed");
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

  async fn process_one(&self, id: ExecutionId) -> Result<(), EngineError> {
    let mut tx = self.store.begin().await?;
    let execution = match tx.claim_execution(id).await? {
      Claim::Claimed(execution) => execution,
      Claim::Locked => {
        tx.rollback().await?;
        return Ok(());
      }
    };

    if execution.is_top_level() {
      self.process_top_level(tx, execution).await
    } else {
      self.process_blueprint_child(tx, execution).await
    }
  }

  async fn process_top_level(
    &self,
    mut tx: StoreTransaction,
    mut execution: CanvasNodeExecution,
  ) -> Result<(), EngineError> {
    let Some(node) = tx.get_live_node(execution.workflow_id, &execution.node_id).await? else {
      tx.rollback().await?;
      return Ok(());
    };

    match &node.node_ref {
      NodeRef::Blueprint { id } => {
        let blueprint_id = *id;
        let blueprint = self.blueprints.get(blueprint_id).ok_or(EngineError::BlueprintNotFound(blueprint_id))?;
        let now = Utc::now();
        let child = blueprint::instantiate_entry_child(blueprint, &execution, now)?;
        tx.insert_execution(&child).await?;
        superplane_execution::start_execution(&mut execution, now).map_err(|err| EngineError::InvalidParameters(err.to_string()))?;
        tx.update_execution(&execution).await?;
        tx.commit().await?;
        Ok(())
      }
      NodeRef::Trigger { .. } => {
        let now = Utc::now();
        superplane_execution::finish_execution(
          &mut execution,
          ExecutionResult::Failed,
          Some(ResultReason::Error),
          Some("trigger nodes do not own executions".to_string()),
          now,
        )
        .map_err(|err| EngineError::InvalidParameters(err.to_string()))?;
        tx.update_execution(&execution).await?;
        tx.commit().await?;
        Ok(())
      }
      NodeRef::Component { name } => {
        let name = name.clone();
        let Some(component) = self.registry.component(&name) else {
          let now = Utc::now();
          superplane_execution::finish_execution(
            &mut execution,
            ExecutionResult::Failed,
            Some(ResultReason::Error),
            Some(format!("component not registered: {name}")),
            now,
          )
          .map_err(|err| EngineError::InvalidParameters(err.to_string()))?;
          tx.update_execution(&execution).await?;
          tx.commit().await?;
          return Ok(());
        };

        let event_payload = tx.get_event(execution.root_event_id).await?.map(|e| e.payload).unwrap_or(Value::Null);
        let upstream = tx.upstream_events(execution.workflow_id, &execution.node_id, execution.root_event_id).await?;
        let template_ctx = TemplateContext { event: &event_payload, upstream: &upstream, node: &node.configuration };

        match build_configuration(&execution.configuration, &template_ctx) {
          Ok(materialized) => {
            execution.configuration = materialized;
            let now = Utc::now();
            superplane_execution::start_execution(&mut execution, now).map_err(|err| EngineError::InvalidParameters(err.to_string()))?;

            let organization_id = tx.organization_for_workflow(execution.workflow_id).await?;
            let secrets = OrgSecretReader::new(self.secrets_backend.clone(), organization_id);
            let mut ctx = ClaimedExecutionContext::new(&mut tx, execution, &secrets, now);
            let outcome = component.execute(&mut ctx).await;
            let (mut execution, notifications) = ctx.into_parts();

            if let Err(err) = outcome {
              if !execution.is_finished() {
                superplane_execution::finish_execution(
                  &mut execution,
                  ExecutionResult::Failed,
                  Some(ResultReason::Error),
                  Some(err.to_string()),
                  Utc::now(),
                )
                .map_err(|err| EngineError::InvalidParameters(err.to_string()))?;
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
          Err(build_err) => {
            let now = Utc::now();
            superplane_execution::finish_execution(
              &mut execution,
              ExecutionResult::Failed,
              Some(ResultReason::Error),
              Some(build_err.to_string()),
              now,
            )
            .map_err(|err| EngineError::InvalidParameters(err.to_string()))?;
            tx.update_execution(&execution).await?;
            tx.commit().await?;
            Ok(())
          }
        }
      }
    }
  }

  /// A blueprint-internal child execution: resolve the blueprint through its parent, run the single
  /// entry node, then — if it finished — propagate the result onto the
  /// parent and replay any output-channel-mapped events.
  async fn process_blueprint_child(
    &self,
    mut tx: StoreTransaction,
    mut execution: CanvasNodeExecution,
  ) -> Result<(), EngineError> {
    let parent_id = execution.parent_execution_id.expect("blueprint child always has a parent");
    let Some(parent) = tx.get_execution(parent_id).await? else {
      tx.rollback().await?;
      return Ok(());
    };
    let Some(parent_node) = tx.get_live_node(parent.workflow_id, &parent.node_id).await? else {
      tx.rollback().await?;
      return Ok(());
    };
    let NodeRef::Blueprint { id: blueprint_id } = parent_node.node_ref else {
      return Err(EngineError::InvalidParameters("blueprint child's parent is not a blueprint node".to_string()));
    };
    let blueprint = self.blueprints.get(blueprint_id).ok_or(EngineError::BlueprintNotFound(blueprint_id))?;
    let entry_node_id = blueprint.entry_node().ok_or(EngineError::BlueprintHasNoEntryNode)?;
    let entry_node = blueprint.get_node(entry_node_id).ok_or(EngineError::BlueprintHasNoEntryNode)?;

    let NodeRef::Component { name } = &entry_node.node_ref else {
      let now = Utc::now();
      superplane_execution::finish_execution(
        &mut execution,
        ExecutionResult::Failed,
        Some(ResultReason::Error),
        Some("blueprint entry node must be a component".to_string()),
        now,
      )
      .map_err(|err| EngineError::InvalidParameters(err.to_string()))?;
      tx.update_execution(&execution).await?;
      tx.commit().await?;
      return Ok(());
    };

    let Some(component) = self.registry.component(name) else {
      let now = Utc::now();
      let message = format!("component not registered: {name}");
      superplane_execution::finish_execution(&mut execution, ExecutionResult::Failed, Some(ResultReason::Error), Some(message), now)
        .map_err(|err| EngineError::InvalidParameters(err.to_string()))?;
      tx.update_execution(&execution).await?;
      tx.commit().await?;
      return self.maybe_propagate(parent_id, execution).await;
    };

    let event_payload = tx.get_event(execution.root_event_id).await?.map(|e| e.payload).unwrap_or(Value::Null);
    let upstream = std::collections::HashMap::new();
    let template_ctx = TemplateContext { event: &event_payload, upstream: &upstream, node: &entry_node.configuration };

    match build_configuration(&execution.configuration, &template_ctx) {
      Ok(materialized) => {
        execution.configuration = materialized;
        let now = Utc::now();
        superplane_execution::start_execution(&mut execution, now).map_err(|err| EngineError::InvalidParameters(err.to_string()))?;

        let organization_id = tx.organization_for_workflow(execution.workflow_id).await?;
        let secrets = OrgSecretReader::new(self.secrets_backend.clone(), organization_id);
        let mut ctx = ClaimedExecutionContext::new(&mut tx, execution, &secrets, now);
        let outcome = component.execute(&mut ctx).await;
        let (mut execution, notifications) = ctx.into_parts();

        if let Err(err) = outcome {
          if !execution.is_finished() {
            superplane_execution::finish_execution(
              &mut execution,
              ExecutionResult::Failed,
              Some(ResultReason::Error),
              Some(err.to_string()),
              Utc::now(),
            )
            .map_err(|err| EngineError::InvalidParameters(err.to_string()))?;
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

        self.maybe_propagate(parent_id, execution).await
      }
      Err(build_err) => {
        let now = Utc::now();
        superplane_execution::finish_execution(
          &mut execution,
          ExecutionResult::Failed,
          Some(ResultReason::Error),
          Some(build_err.to_string()),
          now,
        )
        .map_err(|err| EngineError::InvalidParameters(err.to_string()))?;
        tx.update_execution(&execution).await?;
        tx.commit().await?;
        self.maybe_propagate(parent_id, execution).await
      }
    }
  }

  /// If `child` just reached a terminal state, finish its parent with the
  /// same result and replay any output-channel-mapped events, using the
  /// optimistic `state <> 'finished'` guard rather than a held lock — this
  /// runs after the child's own transaction already committed, so the
  /// parent's row isn't locked by this call.
  async fn maybe_propagate(&self, parent_id: ExecutionId, child: CanvasNodeExecution) -> Result<(), EngineError> {
    if !child.is_finished() {
      return Ok(());
    }

    let Some(parent) = self.store.fetch_execution(parent_id).await? else { return Ok(()) };
    let Some(parent_node) = self.store.get_live_node(parent.workflow_id, &parent.node_id).await? else { return Ok(()) };
    let NodeRef::Blueprint { id: blueprint_id } = parent_node.node_ref else {
      return Err(EngineError::InvalidParameters("blueprint child's parent is not a blueprint node".to_string()));
    };
    let blueprint = self.blueprints.get(blueprint_id).ok_or(EngineError::BlueprintNotFound(blueprint_id))?;

    let mut tx = self.store.begin().await?;
    let completion = blueprint::propagate_child_completion(&mut tx, blueprint, parent.workflow_id, &child).await?;
    tx.commit().await?;

    let now = Utc::now();
    let changed = self
      .store
      .conditional_finish_execution(parent_id, completion.result, completion.reason, completion.message, now)
      .await?;

    if changed {
      for (channel, event_type, payload) in completion.replayed_events {
        let event = superplane_execution::CanvasEvent::new_in_chain(
          parent.workflow_id,
          parent.node_id.clone(),
          channel,
          event_type,
          payload,
          parent.root_event_id,
          now,
        );
        self.store.insert_event(&event).await?;
      }
    }

    Ok(())
  }
}
