use thiserror::Error;

/// The engine converts this into a `failed`/`error` execution result whose
/// message contains "error building configuration".
#[derive(Debug, Error)]
pub enum ConfigBuildError {
  #[error("error building configuration at {path}: {message}")]
  Render { path: String, message: String },
}

impl ConfigBuildError {
  pub fn path(&self) -> &str {
    match self {
      ConfigBuildError::Render { path, .. } => path,
    }
  }
}
