use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a UUID-backed newtype id with the boilerplate the rest of this
/// crate leans on (Display, FromStr-free `parse`, `new`, sqlx passthrough).
macro_rules! uuid_id {
  ($name:ident, $doc:literal) => {
    #[doc = $doc]
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
    )]
    #[sqlx(transparent)]
    pub struct $name(pub Uuid);

    impl $name {
      /// Generate a fresh random id.
      pub fn new() -> Self {
        Self(Uuid::new_v4())
      }

      pub fn as_uuid(&self) -> Uuid {
        self.0
      }
    }

    impl Default for $name {
      fn default() -> Self {
        Self::new()
      }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
      }
    }

    impl From<Uuid> for $name {
      fn from(id: Uuid) -> Self {
        Self(id)
      }
    }
  };
}

uuid_id!(WorkflowId, "Identifies a Canvas (workflow).");
uuid_id!(ExecutionId, "Identifies a CanvasNodeExecution.");
uuid_id!(RequestId, "Identifies a CanvasNodeRequest.");
uuid_id!(EventId, "Identifies a CanvasEvent.");
uuid_id!(IntegrationId, "Identifies an external integration instance.");
uuid_id!(OrganizationId, "Identifies an owning organisation.");
uuid_id!(BlueprintId, "Identifies a reusable blueprint definition.");
uuid_id!(SubscriptionId, "Identifies an IntegrationSubscription row.");

/// A node id is a user-chosen slug, unique only within its workflow — not
/// a globally unique UUID.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct NodeId(pub String);

impl NodeId {
  pub fn new(slug: impl Into<String>) -> Self {
    Self(slug.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for NodeId {
  fn from(s: &str) -> Self {
    Self(s.to_string())
  }
}

impl From<String> for NodeId {
  fn from(s: String) -> Self {
    Self(s)
  }
}

/// An output-channel name on a node, e.g. `default`, `error`, `timeout`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct Channel(pub String);

impl Channel {
  pub fn new(name: impl Into<String>) -> Self {
    Self(name.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn default_channel() -> Self {
    Self("default".to_string())
  }
}

impl fmt::Display for Channel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for Channel {
  fn from(s: &str) -> Self {
    Self(s.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn uuid_ids_round_trip_through_display() {
    let id = ExecutionId::new();
    let rendered = id.to_string();
    assert_eq!(rendered, id.0.to_string());
  }

  #[test]
  fn node_id_is_not_a_uuid() {
    let id = NodeId::new("send-email");
    assert_eq!(id.as_str(), "send-email");
  }

  #[test]
  fn distinct_ids_are_distinct() {
    assert_ne!(ExecutionId::new(), ExecutionId::new());
  }
}
