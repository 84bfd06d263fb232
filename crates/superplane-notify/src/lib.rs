//! Notification Consumer: resolves a notification request's
//! groups/roles/raw emails into a deduplicated recipient set via RBAC and
//! the user directory, then hands off to the outbound email collaborator.
//!
//! Wiring to the bus lives in `superplane-engine`; this crate only owns the
//! resolution algorithm and the collaborator traits it depends on.

mod consumer;
mod error;
mod rbac;
mod sender;

pub use consumer::NotificationConsumer;
pub use error::NotifyError;
pub use rbac::{InMemoryRbac, InMemoryUserDirectory, RbacLookup, UserDirectory};
pub use sender::{InMemorySender, NotificationSender, SentNotification};
