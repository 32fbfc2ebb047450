//! ABOUTME: Template Renderer: evaluates a capability template against params and context
//! ABOUTME: Conventional labels are stamped onto every resource the template produces

use adc_core::{CapabilityDefinition, CapabilityKind, ControllerError, RenderContext, Result, TemplateEvaluator, Value};

/// A template's evaluated output: the primary resource it renders (absent
/// for traits that contribute only auxiliary resources) plus any number of
/// sibling resources.
#[derive(Debug, Clone, Default)]
pub struct RenderOutput {
    pub primary_resource: Option<Value>,
    pub auxiliary_resources: Vec<Value>,
}

/// Render one capability definition against its resolved parameters and
/// the current request context, per the contract `Render(definition,
/// params, ctx) -> {primaryResource, auxiliaryResources[]}`.
///
/// The template body is expected to evaluate to an object with an
/// optional `primary` resource and an optional `auxiliary` array; any
/// other shape is treated as a single primary resource with no
/// auxiliaries. Every resource produced receives the conventional labels
/// (`app.oam.dev/component`, `/name`, `/namespace`, `/appRevision`,
/// `/resourceType`, and `workload.oam.dev/type`/`trait.oam.dev/type` as
/// applicable).
///
/// # Errors
/// Returns `ControllerError::Render` when template evaluation fails.
pub async fn render(
    evaluator: &dyn TemplateEvaluator,
    definition: &CapabilityDefinition,
    component_name: &str,
    workload_type: &str,
    params: &Value,
    ctx: &RenderContext,
) -> Result<RenderOutput> {
    let context_value = Value::from(
        serde_json::to_value(ctx).map_err(|e| ControllerError::Render {
            component: component_name.to_string(),
            message: "failed to serialise render context".to_string(),
            source: Some(e.into()),
        })?,
    );

    let evaluated = evaluator
        .evaluate(&definition.template, params, &context_value)
        .await
        .map_err(|e| ControllerError::Render {
            component: component_name.to_string(),
            message: format!("template evaluation failed for {}", definition.type_name),
            source: Some(anyhow::anyhow!(e.to_string())),
        })?;

    let mut output = split_output(evaluated);

    let resource_type = match definition.kind {
        CapabilityKind::Trait => "TRAIT",
        _ => "WORKLOAD",
    };
    let trait_type = matches!(definition.kind, CapabilityKind::Trait).then_some(definition.type_name.as_str());
    let labels = ctx.conventional_labels(component_name, resource_type, Some(workload_type), trait_type);

    if let Some(primary) = output.primary_resource.as_mut() {
        stamp_labels(primary, &labels);
    }
    for aux in &mut output.auxiliary_resources {
        stamp_labels(aux, &labels);
    }

    Ok(output)
}

fn split_output(evaluated: Value) -> RenderOutput {
    let json = evaluated.as_json();
    let Some(obj) = json.as_object() else {
        return RenderOutput {
            primary_resource: Some(evaluated),
            auxiliary_resources: Vec::new(),
        };
    };

    match (obj.get("primary"), obj.get("auxiliary")) {
        (None, None) => RenderOutput {
            primary_resource: Some(evaluated),
            auxiliary_resources: Vec::new(),
        },
        (primary, auxiliary) => RenderOutput {
            primary_resource: primary.cloned().map(Value::from),
            auxiliary_resources: auxiliary
                .and_then(|v| v.as_array())
                .map(|items| items.iter().cloned().map(Value::from).collect())
                .unwrap_or_default(),
        },
    }
}

/// Conventional label keys (e.g. `app.oam.dev/component`) contain literal
/// dots, so they cannot be written through the dot/bracket path syntax
/// `Value::set_path` parses — this inserts directly into the
/// `metadata.labels` object instead, creating it if absent.
fn stamp_labels(resource: &mut Value, labels: &[(String, String)]) {
    let json = &mut resource.0;
    if !json.is_object() {
        *json = serde_json::json!({});
    }
    let root = json.as_object_mut().expect("just ensured object");
    let metadata = root
        .entry("metadata")
        .or_insert_with(|| serde_json::json!({}));
    if !metadata.is_object() {
        *metadata = serde_json::json!({});
    }
    let metadata_map = metadata.as_object_mut().expect("just ensured object");
    let label_map = metadata_map
        .entry("labels")
        .or_insert_with(|| serde_json::json!({}));
    if !label_map.is_object() {
        *label_map = serde_json::json!({});
    }
    let label_obj = label_map.as_object_mut().expect("just ensured object");
    for (key, value) in labels {
        label_obj.insert(key.clone(), serde_json::Value::String(value.clone()));
    }
}
