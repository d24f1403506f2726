// SPDX-License-Identifier: MIT

use super::schema::{construct_from_props, field_path, index_path, ConditionSchema, Decoder};
use super::types::{ConditionType, FailurePolicy};
use super::Condition;
use crate::sdk::error::ConditionError;
use crate::taco::context::params::ContextParam;

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Fewest entries a sequential condition may hold
pub const MIN_CONDITION_VARIABLES: usize = 2;

/// One step of a sequential condition
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConditionVariable {
    /// Bound as `:varName` for later entries
    pub var_name: String,
    pub condition: Condition,
}

impl ConditionVariable {
    pub fn new(var_name: &str, condition: impl Into<Condition>) -> Self {
        Self {
            var_name: var_name.to_string(),
            condition: condition.into(),
        }
    }

    /// The token later entries use to read this variable
    pub fn token(&self) -> Option<ContextParam> {
        ContextParam::from_name(&self.var_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SequentialProps {
    pub condition_variables: Vec<ConditionVariable>,
    pub failure_policy: FailurePolicy,
}

/// Ordered chain of conditions whose results feed later steps
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SequentialCondition {
    props: SequentialProps,
}

impl SequentialCondition {
    pub fn new(props: SequentialProps) -> Result<Self, ConditionError> {
        construct_from_props(&props)
    }

    /// Entries evaluated in order, halting at the first failure
    pub fn halting(condition_variables: Vec<ConditionVariable>) -> Result<Self, ConditionError> {
        Self::new(SequentialProps {
            condition_variables,
            failure_policy: FailurePolicy::Halt,
        })
    }

    pub(crate) fn resolved(props: SequentialProps) -> Self {
        Self { props }
    }

    pub fn props(&self) -> &SequentialProps {
        &self.props
    }

    pub fn condition_variables(&self) -> &[ConditionVariable] {
        &self.props.condition_variables
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.props.failure_policy
    }

    /// Tokens bound by this node's own entries
    pub fn bound_tokens(&self) -> HashSet<String> {
        self.props
            .condition_variables
            .iter()
            .filter_map(ConditionVariable::token)
            .map(|t| t.as_str().to_string())
            .collect()
    }
}

impl ConditionSchema for SequentialCondition {
    const CONDITION_TYPE: ConditionType = ConditionType::Sequential;

    fn decode(cx: &mut Decoder<'_>, obj: &Map<String, Value>, path: &str) -> Option<Self> {
        let failure_policy: FailurePolicy = cx
            .optional(obj, path, "failurePolicy")
            .unwrap_or_default();

        let vars_path = field_path(path, "conditionVariables");
        let items = match obj.get("conditionVariables") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                cx.issue(&vars_path, format!("must be an array, got {}", other));
                return None;
            }
            None => {
                cx.issue(&vars_path, "is required");
                return None;
            }
        };

        if items.len() < MIN_CONDITION_VARIABLES {
            cx.violation(
                &vars_path,
                format!(
                    "requires at least {} condition variables, got {}",
                    MIN_CONDITION_VARIABLES,
                    items.len()
                ),
            );
        }

        // Names bound so far, in evaluation order
        let mut bound: HashSet<String> = HashSet::new();
        let mut all_names: HashSet<String> = HashSet::new();
        for raw in items {
            if let Some(name) = raw.get("varName").and_then(Value::as_str) {
                all_names.insert(name.to_string());
            }
        }

        let mark = cx.visible_mark();
        let mut condition_variables = Vec::with_capacity(items.len());
        for (i, raw) in items.iter().enumerate() {
            let entry_path = index_path(&vars_path, i);
            let Some(entry) = raw.as_object() else {
                cx.issue(&entry_path, format!("must be an object, got {}", raw));
                continue;
            };

            let var_name: Option<String> = cx.required(entry, &entry_path, "varName");
            if let Some(name) = &var_name {
                check_var_name(cx, name, &bound, &field_path(&entry_path, "varName"));
            }

            let condition = cx.child(entry, &entry_path, "condition");
            if let Some(condition) = &condition {
                check_forward_references(
                    cx,
                    condition,
                    &all_names,
                    &field_path(&entry_path, "condition"),
                );
            }

            if let Some(name) = &var_name {
                bound.insert(name.clone());
                cx.bind_visible(name);
            }
            if let (Some(var_name), Some(condition)) = (var_name, condition) {
                condition_variables.push(ConditionVariable { var_name, condition });
            }
        }
        cx.restore_visible(mark);

        Some(Self {
            props: SequentialProps {
                condition_variables,
                failure_policy,
            },
        })
    }
}

fn check_var_name(cx: &mut Decoder<'_>, name: &str, seen: &HashSet<String>, path: &str) {
    match ContextParam::from_name(name) {
        None => cx.issue(path, format!("'{}' is not a valid identifier", name)),
        Some(token) if token.is_reserved() => cx.issue(
            path,
            format!("'{}' is a reserved context parameter name", name),
        ),
        Some(_) => {}
    }
    if seen.contains(name) {
        cx.violation(path, format!("duplicate varName '{}'", name));
    }
}

/// An entry may only read variables already visible: bound by an earlier
/// entry of this node or of an enclosing sequential
fn check_forward_references(
    cx: &mut Decoder<'_>,
    condition: &Condition,
    all_names: &HashSet<String>,
    path: &str,
) {
    for param in condition.requested_parameters() {
        let name = param.name();
        if all_names.contains(name) && !cx.is_visible(name) {
            cx.violation(path, format!("references '{}' before it is bound", param));
        }
    }
}

/// True when `name` is usable as a `varName`
pub fn is_valid_var_name(name: &str) -> bool {
    ContextParam::from_name(name).is_some_and(|t| !t.is_reserved())
}
