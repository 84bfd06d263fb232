use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("malformed stored JSON: {0}")]
  Deserialize(#[from] serde_json::Error),
}
