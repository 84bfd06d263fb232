use superplane_core::ExecutionId;

/// A `(execution-id, key, value)` index row. Components write
/// these to tag their execution so an inbound external event carrying the
/// same `(key, value)` can locate it in O(1) via
/// `find-execution-by-kv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionKv {
  pub execution_id: ExecutionId,
  pub key: String,
  pub value: String,
}
