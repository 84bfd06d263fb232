use thiserror::Error;

/// Failures resolving a notification's recipient set. Every variant is scoped to a single group/role so
/// the consumer can skip that subset and still deliver to the rest.
#[derive(Debug, Error)]
pub enum NotifyError {
  #[error("rbac lookup failed for group {group}: {message}")]
  GroupLookup { group: String, message: String },

  #[error("rbac lookup failed for role {role}: {message}")]
  RoleLookup { role: String, message: String },

  #[error("user directory lookup failed: {0}")]
  Directory(String),

  #[error("email send failed: {0}")]
  Send(String),
}
