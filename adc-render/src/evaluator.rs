//! ABOUTME: A minimal in-process template evaluator for tests and single-process use
//! ABOUTME: Swappable for a sandboxed evaluator without touching the renderer's contract

use adc_core::{Result, TemplateEvaluator, Value};
use async_trait::async_trait;
use serde_json::Value as Json;

/// Resolves `{{ path.to.param }}` placeholders against a merged
/// params-then-context tree, and evaluates `<path> == <literal>` /
/// `true` / `false` boolean expressions. Not a general-purpose expression
/// language — a production deployment swaps in a real sandboxed evaluator
/// behind the same `TemplateEvaluator` trait.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathTemplateEvaluator;

impl PathTemplateEvaluator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TemplateEvaluator for PathTemplateEvaluator {
    async fn evaluate(&self, template: &Value, params: &Value, context: &Value) -> Result<Value> {
        Ok(Value::from(substitute(template.as_json(), params, context)))
    }

    async fn evaluate_bool(&self, expr: &str, context: &Value) -> Result<bool> {
        Ok(eval_bool(expr, context))
    }
}

fn substitute(node: &Json, params: &Value, context: &Value) -> Json {
    match node {
        Json::String(s) => resolve_placeholder(s, params, context).unwrap_or_else(|| node.clone()),
        Json::Object(map) => Json::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, params, context)))
                .collect(),
        ),
        Json::Array(items) => Json::Array(items.iter().map(|v| substitute(v, params, context)).collect()),
        other => other.clone(),
    }
}

/// Matches a string that is *entirely* `{{ path }}` (optional surrounding
/// whitespace inside the braces) and resolves `path` against `params`,
/// falling back to `context`. Returns `None` for anything else, including
/// strings that merely contain a placeholder among other text.
fn resolve_placeholder(s: &str, params: &Value, context: &Value) -> Option<Json> {
    let inner = s.strip_prefix("{{")?.strip_suffix("}}")?;
    let path = inner.trim();
    params
        .get_path(path)
        .or_else(|| context.get_path(path))
        .cloned()
}

fn eval_bool(expr: &str, context: &Value) -> bool {
    let expr = expr.trim();
    match expr {
        "true" => return true,
        "false" => return false,
        _ => {}
    }

    let Some((lhs, rhs)) = expr.split_once("==") else {
        return false;
    };
    let lhs = lhs.trim();
    let rhs = rhs.trim().trim_matches('"');

    match context.get_path(lhs) {
        Some(Json::String(actual)) => actual == rhs,
        Some(other) => other.to_string().trim_matches('"') == rhs,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn substitutes_a_whole_string_placeholder_from_params() {
        let evaluator = PathTemplateEvaluator::new();
        let template = Value::from(json!({"image": "{{ spec.image }}"}));
        let params = Value::from(json!({"spec": {"image": "busybox"}}));
        let rendered = evaluator
            .evaluate(&template, &params, &Value::null())
            .await
            .unwrap();
        assert_eq!(rendered.get_path("image"), Some(&json!("busybox")));
    }

    #[tokio::test]
    async fn falls_back_to_context_when_params_miss() {
        let evaluator = PathTemplateEvaluator::new();
        let template = Value::from(json!({"name": "{{ name }}"}));
        let context = Value::from(json!({"name": "backend"}));
        let rendered = evaluator
            .evaluate(&template, &Value::null(), &context)
            .await
            .unwrap();
        assert_eq!(rendered.get_path("name"), Some(&json!("backend")));
    }

    #[tokio::test]
    async fn unresolved_placeholder_is_left_untouched() {
        let evaluator = PathTemplateEvaluator::new();
        let template = Value::from(json!({"x": "{{ missing.path }}"}));
        let rendered = evaluator
            .evaluate(&template, &Value::null(), &Value::null())
            .await
            .unwrap();
        assert_eq!(rendered.get_path("x"), Some(&json!("{{ missing.path }}")));
    }

    #[tokio::test]
    async fn boolean_literals_evaluate_directly() {
        let evaluator = PathTemplateEvaluator::new();
        assert!(evaluator.evaluate_bool("true", &Value::null()).await.unwrap());
        assert!(!evaluator.evaluate_bool("false", &Value::null()).await.unwrap());
    }

    #[tokio::test]
    async fn equality_expression_compares_resolved_path() {
        let evaluator = PathTemplateEvaluator::new();
        let context = Value::from(json!({"status": {"phase": "Running"}}));
        assert!(evaluator
            .evaluate_bool("status.phase == \"Running\"", &context)
            .await
            .unwrap());
        assert!(!evaluator
            .evaluate_bool("status.phase == \"Failed\"", &context)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn undecidable_expression_is_false_not_an_error() {
        let evaluator = PathTemplateEvaluator::new();
        assert!(!evaluator
            .evaluate_bool("status.missing == \"x\"", &Value::null())
            .await
            .unwrap());
    }
}
