use thiserror::Error;

/// Error surface a component/trigger implementation can return from any of
/// its contract methods. The engine catches
/// these at the worker boundary and converts them into a persisted failure
/// on the execution or request row — it never lets one propagate out of the
/// worker loop.
#[derive(Debug, Error)]
pub enum ComponentError {
  #[error("{0}")]
  Failed(String),

  #[error("action not found: {action}")]
  ActionNotFound { action: String },

  #[error("malformed action parameters: {0}")]
  InvalidParameters(String),
}

impl ComponentError {
  pub fn failed(message: impl Into<String>) -> Self {
    ComponentError::Failed(message.into())
  }
}
