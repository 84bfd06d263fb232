use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of implementation a `CanvasNode` references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum NodeKind {
  Trigger,
  Component,
  Blueprint,
}

/// Lifecycle state of a `CanvasNodeExecution`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum ExecutionState {
  Pending,
  Started,
  Finished,
}

/// Terminal outcome of a finished execution. Only meaningful once
/// `state = finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum ExecutionResult {
  Passed,
  Failed,
  Cancelled,
}

/// Why a failed/cancelled execution ended that way. `Other` carries the
/// component-defined reason string for cases not covered by a named variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultReason {
  Error,
  Timeout,
  CancelledByUser,
  Other(String),
}

impl ResultReason {
  pub fn as_str(&self) -> &str {
    match self {
      ResultReason::Error => "error",
      ResultReason::Timeout => "timeout",
      ResultReason::CancelledByUser => "cancelled-by-user",
      ResultReason::Other(s) => s.as_str(),
    }
  }

  pub fn parse(raw: &str) -> Self {
    match raw {
      "error" => ResultReason::Error,
      "timeout" => ResultReason::Timeout,
      "cancelled-by-user" => ResultReason::CancelledByUser,
      other => ResultReason::Other(other.to_string()),
    }
  }
}

impl From<&str> for ResultReason {
  fn from(raw: &str) -> Self {
    ResultReason::parse(raw)
  }
}

impl fmt::Display for ResultReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Lifecycle state of a `CanvasNodeRequest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum RequestState {
  Pending,
  InProgress,
  Completed,
  Failed,
}

/// Only `InvokeAction` exists today; kept as an enum (rather than a bare
/// string) so future request types are a compile-time decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum RequestType {
  InvokeAction,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn result_reason_round_trips_known_values() {
    for raw in ["error", "timeout", "cancelled-by-user"] {
      assert_eq!(ResultReason::parse(raw).as_str(), raw);
    }
  }

  #[test]
  fn result_reason_preserves_component_defined_strings() {
    let reason = ResultReason::parse("rate-limited");
    assert_eq!(reason.as_str(), "rate-limited");
    assert_eq!(reason, ResultReason::Other("rate-limited".to_string()));
  }

  #[test]
  fn node_kind_serializes_snake_case() {
    let json = serde_json::to_string(&NodeKind::Blueprint).unwrap();
    assert_eq!(json, "\"blueprint\"");
  }
}
