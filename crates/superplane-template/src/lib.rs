//! The Configuration Builder: a deterministic function
//! `(template, event-bundle) → (config, error)` evaluated by the Node
//! Execution Worker before invoking a component.
//!
//! Rendered with `minijinja` over arbitrary nested JSON configuration,
//! since a `CanvasNode.configuration` is a full JSON document rather than
//! a fixed input schema.

mod error;

pub use error::ConfigBuildError;

use std::collections::HashMap;

use minijinja::{Environment, UndefinedBehavior, Value as TemplateValue};
use serde_json::Value;

/// Everything a configuration template may reference: the execution's root
/// event payload, the latest payload seen on each inbound channel, and the
/// node's own pre-templating configuration (for self-referential defaults).
pub struct TemplateContext<'a> {
  pub event: &'a Value,
  pub upstream: &'a HashMap<String, Value>,
  pub node: &'a Value,
}

/// Render every string leaf of `template` as a minijinja template against
/// `ctx`, leaving numbers/bools/null/structure untouched. Fails closed: an
/// unbound variable is a `ConfigBuildError`, never a silent empty string.
pub fn build_configuration(template: &Value, ctx: &TemplateContext<'_>) -> Result<Value, ConfigBuildError> {
  let mut env = Environment::new();
  env.set_undefined_behavior(UndefinedBehavior::Strict);

  let context = serde_json::json!({
    "event": ctx.event,
    "upstream": ctx.upstream,
    "node": ctx.node,
  });
  let context = TemplateValue::from_serialize(&context);

  render_value(&env, &context, template, "$")
}

fn render_value(
  env: &Environment<'_>,
  context: &TemplateValue,
  value: &Value,
  path: &str,
) -> Result<Value, ConfigBuildError> {
  match value {
    Value::String(template) => {
      let rendered = env.render_str(template, context.clone()).map_err(|e| ConfigBuildError::Render {
        path: path.to_string(),
        message: e.to_string(),
      })?;
      Ok(Value::String(rendered))
    }
    Value::Array(items) => {
      let mut rendered = Vec::with_capacity(items.len());
      for (i, item) in items.iter().enumerate() {
        rendered.push(render_value(env, context, item, &format!("{path}[{i}]"))?);
      }
      Ok(Value::Array(rendered))
    }
    Value::Object(map) => {
      let mut rendered = serde_json::Map::with_capacity(map.len());
      for (key, item) in map {
        rendered.insert(key.clone(), render_value(env, context, item, &format!("{path}.{key}"))?);
      }
      Ok(Value::Object(rendered))
    }
    other => Ok(other.clone()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn renders_a_nested_template_against_the_root_event() {
    let template = serde_json::json!({
      "to": "{{ event.email }}",
      "subject": "Hello {{ event.name | upper }}",
      "retries": 3,
    });
    let event = serde_json::json!({"email": "a@b.com", "name": "ada"});
    let upstream = HashMap::new();
    let node = Value::Null;
    let ctx = TemplateContext { event: &event, upstream: &upstream, node: &node };

    let config = build_configuration(&template, &ctx).unwrap();
    assert_eq!(config["to"], "a@b.com");
    assert_eq!(config["subject"], "Hello ADA");
    assert_eq!(config["retries"], 3);
  }

  #[test]
  fn reads_upstream_channel_payloads_by_node_id() {
    let template = serde_json::json!({"value": "{{ upstream.fetch_user.id }}"});
    let event = Value::Null;
    let mut upstream = HashMap::new();
    upstream.insert("fetch_user".to_string(), serde_json::json!({"id": 42}));
    let node = Value::Null;
    let ctx = TemplateContext { event: &event, upstream: &upstream, node: &node };

    let config = build_configuration(&template, &ctx).unwrap();
    assert_eq!(config["value"], "42");
  }

  #[test]
  fn unbound_variable_fails_closed() {
    let template = serde_json::json!({"invalid_field": "{{ event.nonexistent }}"});
    let event = serde_json::json!({"present": true});
    let upstream = HashMap::new();
    let node = Value::Null;
    let ctx = TemplateContext { event: &event, upstream: &upstream, node: &node };

    let err = build_configuration(&template, &ctx).unwrap_err();
    assert!(matches!(err, ConfigBuildError::Render { .. }));
    assert_eq!(err.path(), "$.invalid_field");
  }

  #[test]
  fn non_string_leaves_pass_through_unrendered() {
    let template = serde_json::json!({"count": 5, "enabled": true, "tag": null});
    let event = Value::Null;
    let upstream = HashMap::new();
    let node = Value::Null;
    let ctx = TemplateContext { event: &event, upstream: &upstream, node: &node };

    let config = build_configuration(&template, &ctx).unwrap();
    assert_eq!(config, template);
  }
}
