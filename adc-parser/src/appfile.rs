//! ABOUTME: Parser / AppFile: resolves each component+trait+policy into a rendering plan
//! ABOUTME: Validates type references, dependsOn, and input/output bindings before rendering

use crate::loader::CapabilityLoader;
use adc_core::{
    Application, CapabilityDefinition, CapabilityKind, ControllerError, PolicySpec, Result,
    Value, WorkflowMode, WorkflowSpec, WorkflowStepSpec,
};
use std::collections::HashSet;

/// A fully resolved, renderable unit: one component's workload plus its
/// traits, each carrying the capability definition that will render it.
#[derive(Debug, Clone)]
pub struct Workload {
    pub name: String,
    pub component_type: String,
    pub params: Value,
    pub definition: CapabilityDefinition,
    pub traits: Vec<ResolvedTrait>,
    pub scopes: Vec<adc_core::ScopeRef>,
    pub depends_on: Vec<String>,
    pub inputs: Vec<adc_core::InputBinding>,
    pub outputs: Vec<adc_core::OutputBinding>,
    pub external_revision: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedTrait {
    pub trait_type: String,
    pub params: Value,
    pub definition: CapabilityDefinition,
}

/// Output of parsing: the renderable workloads, the engine-interpreted
/// policies, and the effective workflow (user-authored or synthesised).
#[derive(Debug, Clone)]
pub struct AppFile {
    pub workloads: Vec<Workload>,
    pub policies: Vec<PolicySpec>,
    pub workflow: WorkflowSpec,
}

/// Parse an Application against loaded capability definitions into an
/// `AppFile`. Fatal structural problems (unknown type, dangling
/// dependency/binding reference) surface as `ControllerError::Parse`.
///
/// # Errors
/// Returns `ControllerError::Parse` for any structural validation failure,
/// or whatever the capability loader returns for an unresolvable type.
pub async fn parse(app: &Application, loader: &CapabilityLoader<'_>) -> Result<AppFile> {
    let component_names: HashSet<&str> = app.components.iter().map(|c| c.name.as_str()).collect();
    let output_names: HashSet<&str> = app
        .components
        .iter()
        .flat_map(|c| c.outputs.iter().map(|o| o.name.as_str()))
        .collect();

    let mut workloads = Vec::with_capacity(app.components.len());
    for component in &app.components {
        for dep in &component.depends_on {
            if !component_names.contains(dep.as_str()) {
                return Err(ControllerError::parse_in(
                    &component.name,
                    format!("dependsOn references unknown component '{dep}'"),
                ));
            }
        }
        for input in &component.inputs {
            if !output_names.contains(input.from.as_str()) {
                return Err(ControllerError::parse_in(
                    &component.name,
                    format!("input references unknown output '{}'", input.from),
                ));
            }
        }

        let definition = loader
            .load(CapabilityKind::Component, &component.component_type)
            .await?;

        let mut traits = Vec::with_capacity(component.traits.len());
        for t in &component.traits {
            let trait_def = loader.load(CapabilityKind::Trait, &t.trait_type).await?;
            if !trait_def.applies_to_workloads.is_empty()
                && !trait_def
                    .applies_to_workloads
                    .iter()
                    .any(|w| w == &component.component_type)
            {
                return Err(ControllerError::parse_in(
                    &component.name,
                    format!(
                        "trait '{}' does not apply to workload type '{}'",
                        t.trait_type, component.component_type
                    ),
                ));
            }
            traits.push(ResolvedTrait {
                trait_type: t.trait_type.clone(),
                params: t.properties.clone(),
                definition: trait_def,
            });
        }

        workloads.push(Workload {
            name: component.name.clone(),
            component_type: component.component_type.clone(),
            params: component.properties.clone(),
            definition,
            traits,
            scopes: component.scopes.clone(),
            depends_on: component.depends_on.clone(),
            inputs: component.inputs.clone(),
            outputs: component.outputs.clone(),
            external_revision: component.external_revision.clone(),
        });
    }

    for policy in &app.policies {
        loader.load(CapabilityKind::Policy, &policy.policy_type).await?;
    }

    let workflow = match &app.workflow {
        Some(spec) => {
            validate_workflow(spec, &component_names)?;
            spec.clone()
        }
        None => synthesize_implicit_workflow(app),
    };

    Ok(AppFile {
        workloads,
        policies: app.policies.clone(),
        workflow,
    })
}

/// When the Application omits a `workflow`, synthesise one `apply-component`
/// step per component, honoring `dependsOn`/`inputs`/`outputs` so the DAG
/// scheduler reconstructs the same ordering the user would have written.
fn synthesize_implicit_workflow(app: &Application) -> WorkflowSpec {
    let steps = app
        .components
        .iter()
        .map(|c| WorkflowStepSpec {
            name: c.name.clone(),
            step_type: "apply-component".to_string(),
            properties: Value::from(serde_json::json!({"component": c.name})),
            depends_on: c.depends_on.clone(),
            inputs: c.inputs.clone(),
            outputs: c.outputs.clone(),
            condition: None,
            timeout_secs: None,
            sub_steps: Vec::new(),
            sub_mode: None,
        })
        .collect();

    WorkflowSpec {
        mode: WorkflowMode::StepByStep,
        sub_mode: WorkflowMode::StepByStep,
        steps,
    }
}

fn validate_workflow(spec: &WorkflowSpec, component_names: &HashSet<&str>) -> Result<()> {
    let step_names: HashSet<&str> = collect_step_names(&spec.steps);
    let output_names: HashSet<&str> = collect_output_names(&spec.steps);
    for step in &spec.steps {
        validate_step(step, &step_names, &output_names, component_names)?;
    }
    Ok(())
}

fn collect_step_names<'a>(steps: &'a [WorkflowStepSpec]) -> HashSet<&'a str> {
    let mut names = HashSet::new();
    for step in steps {
        names.insert(step.name.as_str());
        names.extend(collect_step_names(&step.sub_steps));
    }
    names
}

fn collect_output_names<'a>(steps: &'a [WorkflowStepSpec]) -> HashSet<&'a str> {
    let mut names = HashSet::new();
    for step in steps {
        names.extend(step.outputs.iter().map(|o| o.name.as_str()));
        names.extend(collect_output_names(&step.sub_steps));
    }
    names
}

fn validate_step(
    step: &WorkflowStepSpec,
    step_names: &HashSet<&str>,
    output_names: &HashSet<&str>,
    component_names: &HashSet<&str>,
) -> Result<()> {
    for dep in &step.depends_on {
        if !step_names.contains(dep.as_str()) {
            return Err(ControllerError::parse_in(
                &step.name,
                format!("dependsOn references unknown step '{dep}'"),
            ));
        }
    }
    for input in &step.inputs {
        if !output_names.contains(input.from.as_str()) {
            return Err(ControllerError::parse_in(
                &step.name,
                format!("input references unknown output '{}'", input.from),
            ));
        }
    }
    if step.step_type == "apply-component" {
        let component_name = step
            .properties
            .get_path("component")
            .and_then(|v| v.as_str())
            .unwrap_or(&step.name);
        if !component_names.contains(component_name) {
            return Err(ControllerError::parse_in(
                &step.name,
                format!("apply-component step references unknown component '{component_name}'"),
            ));
        }
    }
    for sub in &step.sub_steps {
        validate_step(sub, step_names, output_names, component_names)?;
    }
    Ok(())
}
