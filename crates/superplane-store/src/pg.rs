use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use superplane_config::NodeRef;
use superplane_core::{
  Channel, EventId, ExecutionId, ExecutionResult, ExecutionState, IntegrationId, NodeId, OrganizationId,
  RequestId, RequestState, RequestType, ResultReason, SubscriptionId, WorkflowId,
};
use superplane_execution::{CanvasEvent, CanvasNodeExecution, CanvasNodeRequest, ExecutionKv, IntegrationSubscription, RequestSpec};

use crate::claim::Claim;
use crate::error::StoreError;
use crate::node::StoredNode;

/// PostgreSQL-backed `Store`. Owns the connection pool;
/// every unit of work opens its own `StoreTransaction` via `begin` and is
/// responsible for committing or rolling it back. Cheaply `Clone` (the pool
/// is `Arc`-backed internally), so workers hand out owned copies to
/// capability contexts that must outlive a single claimed transaction.
#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(&self.pool).await
  }

  pub fn pool(&self) -> PgPool {
    self.pool.clone()
  }

  /// Pool-backed transactions are already `'static` in sqlx (each checked-out
  /// connection is independently owned), so `StoreTransaction` carries no
  /// lifetime parameter — it can be owned by a capability context and moved
  /// across an `async fn` boundary without the caller pinning a borrow of
  /// `PgStore` for the duration.
  pub async fn begin(&self) -> Result<StoreTransaction, StoreError> {
    Ok(StoreTransaction { tx: self.pool.begin().await? })
  }

  /// The Node Execution/Request Worker's lightweight poll: candidate ids only, no row lock — the lock is taken
  /// per-row by `StoreTransaction::claim_execution`/`claim_request` so two
  /// workers racing on the same batch don't block each other here.
  pub async fn poll_pending_execution_ids(
    &self,
    now: DateTime<Utc>,
    limit: i64,
  ) -> Result<Vec<ExecutionId>, StoreError> {
    // Blueprint-internal child executions have no row of their own in `canvas_nodes` — their
    // `node_id` is a synthetic `"<blueprint-node-id>:<internal-node-id>"`
    // slug scoped to the parent execution, not a canvas node. The
    // soft-delete filter therefore only applies to top-level executions
    // (`parent_execution_id IS NULL`); a child's liveness rides on its
    // top-level ancestor's node/workflow, checked once at instantiation.
    let rows = sqlx::query(
      r#"
      SELECT e.id
      FROM canvas_node_executions e
      JOIN canvases c ON c.id = e.workflow_id
      LEFT JOIN canvas_nodes n ON n.workflow_id = e.workflow_id AND n.node_id = e.node_id
      WHERE e.state = 'pending' AND e.scheduled_at <= $1
        AND c.deleted_at IS NULL
        AND (e.parent_execution_id IS NOT NULL OR (n.node_id IS NOT NULL AND n.deleted_at IS NULL))
      ORDER BY e.scheduled_at
      LIMIT $2
      "#,
    )
    .bind(now)
    .bind(limit)
    .fetch_all(&self.pool)
    .await?;

    Ok(rows.into_iter().map(|row| ExecutionId(row.get::<Uuid, _>("id"))).collect())
  }

  pub async fn poll_pending_request_ids(
    &self,
    now: DateTime<Utc>,
    limit: i64,
  ) -> Result<Vec<RequestId>, StoreError> {
    let rows = sqlx::query(
      r#"
      SELECT r.id
      FROM canvas_node_requests r
      JOIN canvas_nodes n ON n.workflow_id = r.workflow_id AND n.node_id = r.node_id
      JOIN canvases c ON c.id = r.workflow_id
      WHERE r.state = 'pending' AND r.scheduled_at <= $1
        AND n.deleted_at IS NULL AND c.deleted_at IS NULL
      ORDER BY r.scheduled_at
      LIMIT $2
      "#,
    )
    .bind(now)
    .bind(limit)
    .fetch_all(&self.pool)
    .await?;

    Ok(rows.into_iter().map(|row| RequestId(row.get::<Uuid, _>("id"))).collect())
  }

  /// Autocommit convenience wrappers around a single `StoreTransaction`
  /// call, for capability contexts that mutate an execution without
  /// holding a claim on it for their whole lifetime — the action-handler and
  /// integration-message contexts in `superplane-engine`. Each call opens
  /// its own short-lived transaction and commits before returning.
  pub async fn fetch_execution(&self, id: ExecutionId) -> Result<Option<CanvasNodeExecution>, StoreError> {
    let mut tx = self.begin().await?;
    let result = tx.get_execution(id).await?;
    tx.commit().await?;
    Ok(result)
  }

  pub async fn set_metadata(&self, id: ExecutionId, metadata: &Value) -> Result<(), StoreError> {
    let mut tx = self.begin().await?;
    tx.set_metadata(id, metadata).await?;
    tx.commit().await?;
    Ok(())
  }

  pub async fn get_kv(&self, execution_id: ExecutionId, key: &str) -> Result<Option<String>, StoreError> {
    let mut tx = self.begin().await?;
    let result = tx.get_kv(execution_id, key).await?;
    tx.commit().await?;
    Ok(result)
  }

  pub async fn set_kv(&self, kv: &ExecutionKv) -> Result<(), StoreError> {
    let mut tx = self.begin().await?;
    tx.set_kv(kv).await?;
    tx.commit().await?;
    Ok(())
  }

  pub async fn insert_event(&self, event: &CanvasEvent) -> Result<(), StoreError> {
    let mut tx = self.begin().await?;
    tx.insert_event(event).await?;
    tx.commit().await?;
    Ok(())
  }

  pub async fn insert_request(&self, request: &CanvasNodeRequest) -> Result<(), StoreError> {
    let mut tx = self.begin().await?;
    tx.insert_request(request).await?;
    tx.commit().await?;
    Ok(())
  }

  pub async fn conditional_finish_execution(
    &self,
    id: ExecutionId,
    result: ExecutionResult,
    reason: Option<ResultReason>,
    message: Option<String>,
    now: DateTime<Utc>,
  ) -> Result<bool, StoreError> {
    let mut tx = self.begin().await?;
    let changed = tx.conditional_finish_execution(id, result, reason, message, now).await?;
    tx.commit().await?;
    Ok(changed)
  }

  pub async fn find_execution_by_kv(
    &self,
    node_id: &NodeId,
    key: &str,
    value: &str,
  ) -> Result<Option<CanvasNodeExecution>, StoreError> {
    let mut tx = self.begin().await?;
    let result = tx.find_execution_by_kv(node_id, key, value).await?;
    tx.commit().await?;
    Ok(result)
  }

  pub async fn subscriptions_for_integration(
    &self,
    integration_id: IntegrationId,
  ) -> Result<Vec<IntegrationSubscription>, StoreError> {
    let mut tx = self.begin().await?;
    let result = tx.subscriptions_for_integration(integration_id).await?;
    tx.commit().await?;
    Ok(result)
  }

  pub async fn organization_for_workflow(&self, workflow_id: WorkflowId) -> Result<OrganizationId, StoreError> {
    let mut tx = self.begin().await?;
    let result = tx.organization_for_workflow(workflow_id).await?;
    tx.commit().await?;
    Ok(result)
  }

  pub async fn get_live_node(
    &self,
    workflow_id: WorkflowId,
    node_id: &NodeId,
  ) -> Result<Option<StoredNode>, StoreError> {
    let mut tx = self.begin().await?;
    let result = tx.get_live_node(workflow_id, node_id).await?;
    tx.commit().await?;
    Ok(result)
  }

  pub async fn get_event(&self, id: EventId) -> Result<Option<CanvasEvent>, StoreError> {
    let mut tx = self.begin().await?;
    let result = tx.get_event(id).await?;
    tx.commit().await?;
    Ok(result)
  }

  pub async fn upstream_events(
    &self,
    workflow_id: WorkflowId,
    node_id: &NodeId,
    root_event_id: EventId,
  ) -> Result<HashMap<String, Value>, StoreError> {
    let mut tx = self.begin().await?;
    let result = tx.upstream_events(workflow_id, node_id, root_event_id).await?;
    tx.commit().await?;
    Ok(result)
  }

  pub async fn events_emitted_by(
    &self,
    workflow_id: WorkflowId,
    node_id: &NodeId,
    root_event_id: EventId,
  ) -> Result<Vec<CanvasEvent>, StoreError> {
    let mut tx = self.begin().await?;
    let result = tx.events_emitted_by(workflow_id, node_id, root_event_id).await?;
    tx.commit().await?;
    Ok(result)
  }
}

/// One worker's single-transaction handle over one claimed execution or
/// request. Every
/// method here is a statement issued against the open transaction; nothing
/// commits until `commit` is called explicitly.
pub struct StoreTransaction {
  tx: Transaction<'static, Postgres>,
}

impl StoreTransaction {
  pub async fn commit(self) -> Result<(), StoreError> {
    self.tx.commit().await?;
    Ok(())
  }

  pub async fn rollback(self) -> Result<(), StoreError> {
    self.tx.rollback().await?;
    Ok(())
  }

  /// `SELECT ... FOR UPDATE SKIP LOCKED` on a single known row. A miss is ambiguous between "locked by another worker"
  /// and "no longer pending" (finished, cancelled, or its node/workflow was
  /// soft-deleted underneath it) — the follow-up `SELECT` distinguishes
  /// them so a genuinely-gone row doesn't get reported as contention.
  pub async fn claim_execution(
    &mut self,
    id: ExecutionId,
  ) -> Result<Claim<CanvasNodeExecution>, StoreError> {
    let row = sqlx::query(
      r#"
      SELECT e.id, e.workflow_id, e.node_id, e.configuration, e.metadata,
             e.parent_execution_id, e.root_event_id, e.state, e.result,
             e.result_reason, e.result_message, e.created_at, e.started_at,
             e.finished_at, e.scheduled_at
      FROM canvas_node_executions e
      WHERE e.id = $1
      FOR UPDATE SKIP LOCKED
      "#,
    )
    .bind(id.as_uuid())
    .fetch_optional(&mut *self.tx)
    .await?;

    match row {
      Some(row) => Ok(Claim::Claimed(execution_from_row(row))),
      None => {
        let still_pending = sqlx::query_scalar::<_, bool>(
          "SELECT state = 'pending' FROM canvas_node_executions WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?
        .unwrap_or(false);

        if still_pending {
          Ok(Claim::Locked)
        } else {
          Err(StoreError::NotFound(format!("execution {id} is no longer pending")))
        }
      }
    }
  }

  pub async fn claim_request(&mut self, id: RequestId) -> Result<Claim<CanvasNodeRequest>, StoreError> {
    let row = sqlx::query(
      r#"
      SELECT r.id, r.workflow_id, r.node_id, r.execution_id, r.request_type,
             r.action_name, r.parameters, r.state, r.error, r.created_at,
             r.scheduled_at
      FROM canvas_node_requests r
      WHERE r.id = $1
      FOR UPDATE SKIP LOCKED
      "#,
    )
    .bind(id.as_uuid())
    .fetch_optional(&mut *self.tx)
    .await?;

    match row {
      Some(row) => Ok(Claim::Claimed(request_from_row(row))),
      None => {
        let still_pending =
          sqlx::query_scalar::<_, bool>("SELECT state = 'pending' FROM canvas_node_requests WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?
            .unwrap_or(false);

        if still_pending {
          Ok(Claim::Locked)
        } else {
          Err(StoreError::NotFound(format!("request {id} is no longer pending")))
        }
      }
    }
  }

  /// Resolve a live (non-soft-deleted) node. Returns `None` for a deleted workflow/node rather than an error —
  /// callers complete the unit of work as a no-op in that case.
  pub async fn get_live_node(
    &mut self,
    workflow_id: WorkflowId,
    node_id: &NodeId,
  ) -> Result<Option<StoredNode>, StoreError> {
    let row = sqlx::query(
      r#"
      SELECT n.workflow_id, n.node_id, n.node_ref, n.configuration, n.integration_id
      FROM canvas_nodes n
      JOIN canvases c ON c.id = n.workflow_id
      WHERE n.workflow_id = $1 AND n.node_id = $2
        AND n.deleted_at IS NULL AND c.deleted_at IS NULL
      "#,
    )
    .bind(workflow_id.as_uuid())
    .bind(node_id.as_str())
    .fetch_optional(&mut *self.tx)
    .await?;

    let Some(row) = row else { return Ok(None) };
    let node_ref: NodeRef = serde_json::from_value(row.get("node_ref"))?;

    Ok(Some(StoredNode {
      workflow_id: WorkflowId(row.get("workflow_id")),
      node_id: NodeId(row.get("node_id")),
      node_ref,
      configuration: row.get("configuration"),
      integration_id: row.get::<Option<Uuid>, _>("integration_id").map(IntegrationId),
    }))
  }

  /// The root event itself, fetched by id rather than by its causal chain —
  /// the configuration builder's `event` binding.
  pub async fn get_event(&mut self, id: EventId) -> Result<Option<CanvasEvent>, StoreError> {
    let row = sqlx::query(
      r#"
      SELECT id, workflow_id, node_id, channel, event_type, payload, root_event_id, created_at
      FROM canvas_events
      WHERE id = $1
      "#,
    )
    .bind(id.as_uuid())
    .fetch_optional(&mut *self.tx)
    .await?;

    Ok(row.map(|row| CanvasEvent {
      id: EventId(row.get("id")),
      workflow_id: WorkflowId(row.get("workflow_id")),
      node_id: NodeId(row.get("node_id")),
      channel: Channel(row.get("channel")),
      event_type: row.get("event_type"),
      payload: row.get("payload"),
      root_event_id: EventId(row.get("root_event_id")),
      created_at: row.get("created_at"),
    }))
  }

  pub async fn insert_execution(&mut self, execution: &CanvasNodeExecution) -> Result<(), StoreError> {
    sqlx::query(
      r#"
      INSERT INTO canvas_node_executions
        (id, workflow_id, node_id, configuration, metadata, parent_execution_id,
         root_event_id, state, result, result_reason, result_message,
         created_at, started_at, finished_at, scheduled_at)
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
      "#,
    )
    .bind(execution.id.as_uuid())
    .bind(execution.workflow_id.as_uuid())
    .bind(execution.node_id.as_str())
    .bind(&execution.configuration)
    .bind(&execution.metadata)
    .bind(execution.parent_execution_id.map(|id| id.as_uuid()))
    .bind(execution.root_event_id.as_uuid())
    .bind(execution.state)
    .bind(execution.result)
    .bind(execution.result_reason.as_ref().map(|r| r.as_str().to_string()))
    .bind(&execution.result_message)
    .bind(execution.created_at)
    .bind(execution.started_at)
    .bind(execution.finished_at)
    .bind(execution.scheduled_at)
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  pub async fn update_execution(&mut self, execution: &CanvasNodeExecution) -> Result<(), StoreError> {
    sqlx::query(
      r#"
      UPDATE canvas_node_executions
      SET configuration = $2, metadata = $3, state = $4, result = $5,
          result_reason = $6, result_message = $7, started_at = $8,
          finished_at = $9, scheduled_at = $10
      WHERE id = $1
      "#,
    )
    .bind(execution.id.as_uuid())
    .bind(&execution.configuration)
    .bind(&execution.metadata)
    .bind(execution.state)
    .bind(execution.result)
    .bind(execution.result_reason.as_ref().map(|r| r.as_str().to_string()))
    .bind(&execution.result_message)
    .bind(execution.started_at)
    .bind(execution.finished_at)
    .bind(execution.scheduled_at)
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  pub async fn insert_request(&mut self, request: &CanvasNodeRequest) -> Result<(), StoreError> {
    sqlx::query(
      r#"
      INSERT INTO canvas_node_requests
        (id, workflow_id, node_id, execution_id, request_type, action_name,
         parameters, state, error, created_at, scheduled_at)
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
      "#,
    )
    .bind(request.id.as_uuid())
    .bind(request.workflow_id.as_uuid())
    .bind(request.node_id.as_str())
    .bind(request.execution_id.map(|id| id.as_uuid()))
    .bind(request.request_type)
    .bind(&request.spec.action_name)
    .bind(&request.spec.parameters)
    .bind(request.state)
    .bind(&request.error)
    .bind(request.created_at)
    .bind(request.scheduled_at)
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  pub async fn update_request(&mut self, request: &CanvasNodeRequest) -> Result<(), StoreError> {
    sqlx::query(
      r#"
      UPDATE canvas_node_requests
      SET state = $2, error = $3, scheduled_at = $4
      WHERE id = $1
      "#,
    )
    .bind(request.id.as_uuid())
    .bind(request.state)
    .bind(&request.error)
    .bind(request.scheduled_at)
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  pub async fn insert_event(&mut self, event: &CanvasEvent) -> Result<(), StoreError> {
    sqlx::query(
      r#"
      INSERT INTO canvas_events (id, workflow_id, node_id, channel, event_type, payload, root_event_id, created_at)
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
      "#,
    )
    .bind(event.id.as_uuid())
    .bind(event.workflow_id.as_uuid())
    .bind(event.node_id.as_str())
    .bind(event.channel.as_str())
    .bind(&event.event_type)
    .bind(&event.payload)
    .bind(event.root_event_id.as_uuid())
    .bind(event.created_at)
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  /// The latest payload seen on each inbound edge into `node_id`, within
  /// this execution's causal chain (`root_event_id`) — the `upstream`
  /// context the configuration builder templates against.
  pub async fn upstream_events(
    &mut self,
    workflow_id: WorkflowId,
    node_id: &NodeId,
    root_event_id: EventId,
  ) -> Result<HashMap<String, Value>, StoreError> {
    let rows = sqlx::query(
      r#"
      SELECT DISTINCT ON (edge.source_node_id, edge.channel)
        edge.channel, ev.payload
      FROM canvas_edges edge
      JOIN canvas_events ev
        ON ev.workflow_id = edge.workflow_id
       AND ev.node_id = edge.source_node_id
       AND ev.channel = edge.channel
       AND ev.root_event_id = $3
      WHERE edge.workflow_id = $1 AND edge.target_node_id = $2
      ORDER BY edge.source_node_id, edge.channel, ev.created_at DESC
      "#,
    )
    .bind(workflow_id.as_uuid())
    .bind(node_id.as_str())
    .bind(root_event_id.as_uuid())
    .fetch_all(&mut *self.tx)
    .await?;

    // Keyed by channel (§4.8: "upstream" is channel -> latest event payload), so
    // two inbound edges from the same source node on different channels both
    // survive instead of one clobbering the other under a source-node-only key.
    Ok(
      rows
        .into_iter()
        .map(|row| (row.get::<String, _>("channel"), row.get::<Value, _>("payload")))
        .collect(),
    )
  }

  pub async fn get_kv(&mut self, execution_id: ExecutionId, key: &str) -> Result<Option<String>, StoreError> {
    let value = sqlx::query_scalar::<_, String>(
      "SELECT value FROM execution_kv WHERE execution_id = $1 AND key = $2",
    )
    .bind(execution_id.as_uuid())
    .bind(key)
    .fetch_optional(&mut *self.tx)
    .await?;

    Ok(value)
  }

  pub async fn set_kv(&mut self, kv: &ExecutionKv) -> Result<(), StoreError> {
    sqlx::query(
      r#"
      INSERT INTO execution_kv (execution_id, key, value)
      VALUES ($1, $2, $3)
      ON CONFLICT (execution_id, key) DO UPDATE SET value = EXCLUDED.value
      "#,
    )
    .bind(kv.execution_id.as_uuid())
    .bind(&kv.key)
    .bind(&kv.value)
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  /// `find-execution-by-kv`: the execution under
  /// `node_id` whose `ExecutionKV` carries `(key, value)`.
  pub async fn find_execution_by_kv(
    &mut self,
    node_id: &NodeId,
    key: &str,
    value: &str,
  ) -> Result<Option<CanvasNodeExecution>, StoreError> {
    let row = sqlx::query(
      r#"
      SELECT e.id, e.workflow_id, e.node_id, e.configuration, e.metadata,
             e.parent_execution_id, e.root_event_id, e.state, e.result,
             e.result_reason, e.result_message, e.created_at, e.started_at,
             e.finished_at, e.scheduled_at
      FROM canvas_node_executions e
      JOIN execution_kv kv ON kv.execution_id = e.id
      WHERE e.node_id = $1 AND kv.key = $2 AND kv.value = $3
      "#,
    )
    .bind(node_id.as_str())
    .bind(key)
    .bind(value)
    .fetch_optional(&mut *self.tx)
    .await?;

    Ok(row.map(execution_from_row))
  }

  pub async fn subscriptions_for_integration(
    &mut self,
    integration_id: IntegrationId,
  ) -> Result<Vec<IntegrationSubscription>, StoreError> {
    let rows = sqlx::query(
      r#"
      SELECT s.id, s.integration_id, s.workflow_id, s.node_id, s.configuration
      FROM integration_subscriptions s
      JOIN canvas_nodes n ON n.workflow_id = s.workflow_id AND n.node_id = s.node_id
      JOIN canvases c ON c.id = s.workflow_id
      WHERE s.integration_id = $1 AND n.deleted_at IS NULL AND c.deleted_at IS NULL
      "#,
    )
    .bind(integration_id.as_uuid())
    .fetch_all(&mut *self.tx)
    .await?;

    Ok(
      rows
        .into_iter()
        .map(|row| IntegrationSubscription {
          id: SubscriptionId(row.get("id")),
          integration_id: IntegrationId(row.get("integration_id")),
          workflow_id: WorkflowId(row.get("workflow_id")),
          node_id: NodeId(row.get("node_id")),
          configuration: row.get("configuration"),
        })
        .collect(),
    )
  }

  /// Plain, non-locking read of an execution row — used to resolve a
  /// parent's `node_id` while instantiating/finishing a blueprint child
  ///, not as a claim.
  pub async fn get_execution(&mut self, id: ExecutionId) -> Result<Option<CanvasNodeExecution>, StoreError> {
    let row = sqlx::query(
      r#"
      SELECT id, workflow_id, node_id, configuration, metadata, parent_execution_id,
             root_event_id, state, result, result_reason, result_message,
             created_at, started_at, finished_at, scheduled_at
      FROM canvas_node_executions
      WHERE id = $1
      "#,
    )
    .bind(id.as_uuid())
    .fetch_optional(&mut *self.tx)
    .await?;

    Ok(row.map(execution_from_row))
  }

  pub async fn set_metadata(&mut self, id: ExecutionId, metadata: &Value) -> Result<(), StoreError> {
    sqlx::query("UPDATE canvas_node_executions SET metadata = $2 WHERE id = $1")
      .bind(id.as_uuid())
      .bind(metadata)
      .execute(&mut *self.tx)
      .await?;
    Ok(())
  }

  /// `started|pending → finished`, guarded by `state <> 'finished'` rather
  /// than an open row lock. Used by capability contexts that do not hold a
  /// claim on the execution row for their whole lifetime — action handlers
  /// dispatched by the request worker, and integration-message handlers —
  /// so a racing finish (user cancel, a concurrent handler) is detected by
  /// `rows_affected() == 0` instead of relying on a held lock.
  pub async fn conditional_finish_execution(
    &mut self,
    id: ExecutionId,
    result: ExecutionResult,
    reason: Option<ResultReason>,
    message: Option<String>,
    now: DateTime<Utc>,
  ) -> Result<bool, StoreError> {
    let affected = sqlx::query(
      r#"
      UPDATE canvas_node_executions
      SET state = 'finished', result = $2, result_reason = $3, result_message = $4, finished_at = $5
      WHERE id = $1 AND state <> 'finished'
      "#,
    )
    .bind(id.as_uuid())
    .bind(result)
    .bind(reason.as_ref().map(|r| r.as_str().to_string()))
    .bind(message)
    .bind(now)
    .execute(&mut *self.tx)
    .await?
    .rows_affected();

    Ok(affected > 0)
  }

  /// Every event a node emitted within one causal chain, oldest first — used
  /// to replay a blueprint child's output onto the parent's own node/channel
  /// when the child (and therefore the parent) finishes.
  pub async fn events_emitted_by(
    &mut self,
    workflow_id: WorkflowId,
    node_id: &NodeId,
    root_event_id: EventId,
  ) -> Result<Vec<CanvasEvent>, StoreError> {
    let rows = sqlx::query(
      r#"
      SELECT id, workflow_id, node_id, channel, event_type, payload, root_event_id, created_at
      FROM canvas_events
      WHERE workflow_id = $1 AND node_id = $2 AND root_event_id = $3
      ORDER BY created_at
      "#,
    )
    .bind(workflow_id.as_uuid())
    .bind(node_id.as_str())
    .bind(root_event_id.as_uuid())
    .fetch_all(&mut *self.tx)
    .await?;

    Ok(
      rows
        .into_iter()
        .map(|row| CanvasEvent {
          id: EventId(row.get("id")),
          workflow_id: WorkflowId(row.get("workflow_id")),
          node_id: NodeId(row.get("node_id")),
          channel: Channel(row.get("channel")),
          event_type: row.get("event_type"),
          payload: row.get("payload"),
          root_event_id: EventId(row.get("root_event_id")),
          created_at: row.get("created_at"),
        })
        .collect(),
    )
  }

  pub async fn organization_for_workflow(&mut self, workflow_id: WorkflowId) -> Result<OrganizationId, StoreError> {
    let id = sqlx::query_scalar::<_, Uuid>("SELECT organization_id FROM canvases WHERE id = $1")
      .bind(workflow_id.as_uuid())
      .fetch_optional(&mut *self.tx)
      .await?
      .ok_or_else(|| StoreError::NotFound(format!("workflow {workflow_id}")))?;

    Ok(OrganizationId(id))
  }
}

fn execution_from_row(row: sqlx::postgres::PgRow) -> CanvasNodeExecution {
  CanvasNodeExecution {
    id: ExecutionId(row.get("id")),
    workflow_id: WorkflowId(row.get("workflow_id")),
    node_id: NodeId(row.get("node_id")),
    configuration: row.get("configuration"),
    metadata: row.get("metadata"),
    parent_execution_id: row.get::<Option<Uuid>, _>("parent_execution_id").map(ExecutionId),
    root_event_id: EventId(row.get("root_event_id")),
    state: row.get::<ExecutionState, _>("state"),
    result: row.get::<Option<ExecutionResult>, _>("result"),
    result_reason: row.get::<Option<String>, _>("result_reason").map(|r| ResultReason::parse(&r)),
    result_message: row.get("result_message"),
    created_at: row.get("created_at"),
    started_at: row.get("started_at"),
    finished_at: row.get("finished_at"),
    scheduled_at: row.get("scheduled_at"),
  }
}

fn request_from_row(row: sqlx::postgres::PgRow) -> CanvasNodeRequest {
  CanvasNodeRequest {
    id: RequestId(row.get("id")),
    workflow_id: WorkflowId(row.get("workflow_id")),
    node_id: NodeId(row.get("node_id")),
    execution_id: row.get::<Option<Uuid>, _>("execution_id").map(ExecutionId),
    request_type: row.get::<RequestType, _>("request_type"),
    spec: RequestSpec {
      action_name: row.get("action_name"),
      parameters: row.get("parameters"),
    },
    state: row.get::<RequestState, _>("state"),
    error: row.get("error"),
    created_at: row.get("created_at"),
    scheduled_at: row.get("scheduled_at"),
  }
}
