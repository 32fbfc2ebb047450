//! ABOUTME: Boolean `if` expression evaluation for workflow step conditions
//! ABOUTME: Handles `always`, `true`/`false`, `status.<step>.<predicate>` and
//! ABOUTME: `inputs.<name>` atoms composed with `&&`/`||`/`!`

use adc_core::{StepPhase, WorkflowStatus};

/// What a step should do this tick, as decided from its `if` expression and
/// whether any of its gating predecessors has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Run,
    Skip,
    /// A referenced peer step has not reached a terminal phase yet.
    Wait,
}

/// Decide a step's fate for this tick. `upstream_failed` is true when any of
/// the step's gating predecessors is in phase `Failed`; it drives the
/// implicit default (no `if` declared) cascading-skip behaviour.
#[must_use]
pub fn decide(condition: Option<&str>, upstream_failed: bool, status: &WorkflowStatus) -> Decision {
    match condition.map(str::trim) {
        Some("always") => Decision::Run,
        Some(expr) => match eval_expr(expr, status) {
            Some(true) => Decision::Run,
            Some(false) => Decision::Skip,
            None => Decision::Wait,
        },
        None => {
            if upstream_failed {
                Decision::Skip
            } else {
                Decision::Run
            }
        }
    }
}

/// Evaluates an `if` expression of atoms (`true`, `false`,
/// `status.<step>.<predicate>`, `inputs.<name>`) composed with `&&`, `||`,
/// and `!`. `None` propagates from any atom that is itself undecidable
/// (a referenced step hasn't reached a terminal phase yet).
fn eval_expr(expr: &str, status: &WorkflowStatus) -> Option<bool> {
    let tokens = tokenize(expr);
    let mut parser = ExprParser { tokens: &tokens, pos: 0 };
    parser.parse_or(status)
}

fn tokenize(expr: &str) -> Vec<String> {
    expr.replace("&&", " && ")
        .replace("||", " || ")
        .replace('!', " ! ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

struct ExprParser<'a> {
    tokens: &'a [String],
    pos: usize,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn advance(&mut self) -> Option<&str> {
        let token = self.tokens.get(self.pos).map(String::as_str);
        self.pos += 1;
        token
    }

    fn parse_or(&mut self, status: &WorkflowStatus) -> Option<bool> {
        let mut result = self.parse_and(status)?;
        while self.peek() == Some("||") {
            self.advance();
            let rhs = self.parse_and(status)?;
            result = result || rhs;
        }
        Some(result)
    }

    fn parse_and(&mut self, status: &WorkflowStatus) -> Option<bool> {
        let mut result = self.parse_unary(status)?;
        while self.peek() == Some("&&") {
            self.advance();
            let rhs = self.parse_unary(status)?;
            result = result && rhs;
        }
        Some(result)
    }

    fn parse_unary(&mut self, status: &WorkflowStatus) -> Option<bool> {
        if self.peek() == Some("!") {
            self.advance();
            return self.parse_unary(status).map(|v| !v);
        }
        self.parse_atom(status)
    }

    fn parse_atom(&mut self, status: &WorkflowStatus) -> Option<bool> {
        let token = self.advance()?;
        match token {
            "true" => Some(true),
            "false" => Some(false),
            t if t.starts_with("status.") => resolve_status_predicate(t, status),
            t if t.starts_with("inputs.") => Some(resolve_inputs_predicate(t, status)),
            _ => None,
        }
    }
}

/// Resolves `status.<step>.succeeded|failed|timeout|skipped`. `None` means
/// the referenced step has not yet reached a terminal phase — the condition
/// is undecidable for now, not false.
fn resolve_status_predicate(expr: &str, status: &WorkflowStatus) -> Option<bool> {
    let rest = expr.strip_prefix("status.")?;
    let (step_name, predicate) = rest.rsplit_once('.')?;
    let step = status.step(step_name)?;
    if !step.phase.is_terminal() {
        return None;
    }
    let value = match predicate {
        "succeeded" => step.phase == StepPhase::Succeeded,
        "failed" => step.phase == StepPhase::Failed,
        "timeout" => step
            .reason
            .as_ref()
            .is_some_and(|r| r.0 == adc_core::StepReason::TIMEOUT),
        "skipped" => step.phase == StepPhase::Skipped,
        _ => return None,
    };
    Some(value)
}

/// Resolves `inputs.<name>`: true once any step has produced the named
/// output. By the time `decide` is reached the scheduler has already waited
/// on the producer becoming terminal (`bindings::inputs_settled`), so
/// "absent" here means the producer finished without ever writing it, not
/// that it's still in flight.
fn resolve_inputs_predicate(expr: &str, status: &WorkflowStatus) -> bool {
    let name = expr.strip_prefix("inputs.").unwrap_or(expr);
    status.steps.iter().any(|s| s.outputs.contains_key(name))
}
