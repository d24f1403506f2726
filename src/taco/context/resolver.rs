// SPDX-License-Identifier: MIT

//! Context parameter substitution
//!
//! Only parameter-bearing fields are scanned: call parameters, the return
//! value test's value, `authorizationToken` and `jwtToken`. Substituted
//! values are inserted as-is and never rescanned.

use super::params::{collect_params, ContextParam};
use super::scope::{Binding, Scope};
use crate::sdk::error::ConditionError;
use crate::taco::conditions::schema::{field_path, index_path};
use crate::taco::conditions::{
    CompoundCondition, CompoundProps, Condition, ConditionVariable, ContractCondition,
    IfThenElseCondition, IfThenElseProps, JsonApiCondition, JsonRpcCondition, JwtCondition,
    ReturnValueTest, RpcCondition, SequentialCondition, SequentialProps, TimeCondition,
};

use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Look up a single token
pub fn resolve_token(token: &str, scope: &Scope<'_>, path: &str) -> Result<Value, ConditionError> {
    match scope.lookup(token) {
        Some(Binding::Value(value)) => Ok(value.clone()),
        Some(Binding::Absent) => Err(ConditionError::AbsentVariable {
            name: token.to_string(),
            path: path.to_string(),
        }),
        None => Err(ConditionError::unresolved(token, path)),
    }
}

/// Replace every token inside `value`; object keys are left untouched
pub fn resolve_value(
    value: &Value,
    scope: &Scope<'_>,
    path: &str,
) -> Result<Value, ConditionError> {
    match value {
        Value::String(s) if ContextParam::parse(s).is_some() => resolve_token(s, scope, path),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| resolve_value(item, scope, &index_path(path, i)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => resolve_map(map, scope, path).map(Value::Object),
        other => Ok(other.clone()),
    }
}

fn resolve_map(
    map: &Map<String, Value>,
    scope: &Scope<'_>,
    path: &str,
) -> Result<Map<String, Value>, ConditionError> {
    map.iter()
        .map(|(key, item)| -> Result<_, ConditionError> {
            Ok((key.clone(), resolve_value(item, scope, &field_path(path, key))?))
        })
        .collect()
}

fn resolve_values(
    values: &[Value],
    scope: &Scope<'_>,
    path: &str,
) -> Result<Vec<Value>, ConditionError> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| resolve_value(v, scope, &index_path(path, i)))
        .collect()
}

fn resolve_test(
    test: &ReturnValueTest,
    scope: &Scope<'_>,
    path: &str,
) -> Result<ReturnValueTest, ConditionError> {
    Ok(ReturnValueTest {
        index: test.index,
        comparator: test.comparator,
        value: resolve_value(
            &test.value,
            scope,
            &field_path(&field_path(path, "returnValueTest"), "value"),
        )?,
    })
}

/// Resolve a token field whose value must be a string
fn resolve_string(token: &str, scope: &Scope<'_>, path: &str) -> Result<String, ConditionError> {
    match resolve_token(token, scope, path)? {
        Value::String(s) => Ok(s),
        _ => Err(ConditionError::ContextValueType {
            token: token.to_string(),
            path: path.to_string(),
            expected: "a string".to_string(),
        }),
    }
}

/// A copy of `leaf` with every context parameter substituted.
///
/// Combinators are returned unchanged; use [`resolve_condition`] for trees.
pub fn resolve_leaf(
    leaf: &Condition,
    scope: &Scope<'_>,
    path: &str,
) -> Result<Condition, ConditionError> {
    let resolved = match leaf {
        Condition::Rpc(c) => {
            let mut props = c.props().clone();
            props.parameters =
                resolve_values(&props.parameters, scope, &field_path(path, "parameters"))?;
            if let Some(first) = props.parameters.first() {
                if !first.is_string() {
                    let token = c.props().parameters[0].as_str().unwrap_or_default();
                    return Err(ConditionError::ContextValueType {
                        token: token.to_string(),
                        path: index_path(&field_path(path, "parameters"), 0),
                        expected: "an address string".to_string(),
                    });
                }
            }
            props.return_value_test = resolve_test(&props.return_value_test, scope, path)?;
            Condition::Rpc(RpcCondition::resolved(props))
        }
        Condition::Time(c) => {
            let mut props = c.props().clone();
            props.return_value_test = resolve_test(&props.return_value_test, scope, path)?;
            Condition::Time(TimeCondition::resolved(props))
        }
        Condition::Contract(c) => {
            let mut props = c.props().clone();
            props.parameters =
                resolve_values(&props.parameters, scope, &field_path(path, "parameters"))?;
            props.return_value_test = resolve_test(&props.return_value_test, scope, path)?;
            Condition::Contract(ContractCondition::resolved(props))
        }
        Condition::JsonApi(c) => {
            let mut props = c.props().clone();
            if let Some(parameters) = &props.parameters {
                props.parameters = Some(resolve_map(
                    parameters,
                    scope,
                    &field_path(path, "parameters"),
                )?);
            }
            if let Some(token) = &props.authorization_token {
                props.authorization_token =
                    Some(resolve_string(token, scope, &field_path(path, "authorizationToken"))?);
            }
            props.return_value_test = resolve_test(&props.return_value_test, scope, path)?;
            Condition::JsonApi(JsonApiCondition::resolved(props))
        }
        Condition::JsonRpc(c) => {
            let mut props = c.props().clone();
            if let Some(params) = &props.params {
                props.params = Some(resolve_value(params, scope, &field_path(path, "params"))?);
            }
            if let Some(token) = &props.authorization_token {
                props.authorization_token =
                    Some(resolve_string(token, scope, &field_path(path, "authorizationToken"))?);
            }
            props.return_value_test = resolve_test(&props.return_value_test, scope, path)?;
            Condition::JsonRpc(JsonRpcCondition::resolved(props))
        }
        Condition::Jwt(c) => {
            let mut props = c.props().clone();
            props.jwt_token =
                resolve_string(&props.jwt_token, scope, &field_path(path, "jwtToken"))?;
            Condition::Jwt(JwtCondition::resolved(props))
        }
        combinator => combinator.clone(),
    };
    Ok(resolved)
}

/// Resolve a whole tree against one scope.
///
/// Sequential variables are only known during evaluation, so a tree that
/// references them fails here with `UnresolvedParameter`.
pub fn resolve_condition(
    condition: &Condition,
    scope: &Scope<'_>,
    path: &str,
) -> Result<Condition, ConditionError> {
    match condition {
        Condition::Compound(c) => {
            let operands = condition
                .children(path)
                .into_iter()
                .map(|(child_path, child)| resolve_condition(child, scope, &child_path))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Condition::Compound(CompoundCondition::resolved(CompoundProps {
                operator: c.operator(),
                operands,
            })))
        }
        Condition::Sequential(c) => {
            let condition_variables = condition
                .children(path)
                .into_iter()
                .zip(c.condition_variables())
                .map(|((child_path, child), var)| -> Result<_, ConditionError> {
                    Ok(ConditionVariable {
                        var_name: var.var_name.clone(),
                        condition: resolve_condition(child, scope, &child_path)?,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Condition::Sequential(SequentialCondition::resolved(SequentialProps {
                condition_variables,
                failure_policy: c.failure_policy(),
            })))
        }
        Condition::IfThenElse(c) => Ok(Condition::IfThenElse(IfThenElseCondition::resolved(
            IfThenElseProps {
                if_condition: Box::new(resolve_condition(
                    c.if_condition(),
                    scope,
                    &field_path(path, "ifCondition"),
                )?),
                then_condition: Box::new(resolve_condition(
                    c.then_condition(),
                    scope,
                    &field_path(path, "thenCondition"),
                )?),
                else_condition: Box::new(resolve_condition(
                    c.else_condition(),
                    scope,
                    &field_path(path, "elseCondition"),
                )?),
            },
        ))),
        leaf => resolve_leaf(leaf, scope, path),
    }
}

/// Collect the tokens a leaf's parameter-bearing fields reference
pub fn collect_leaf_params(leaf: &Condition, out: &mut BTreeSet<ContextParam>) {
    match leaf {
        Condition::Rpc(c) => {
            c.props().parameters.iter().for_each(|v| collect_params(v, out));
            collect_params(&c.props().return_value_test.value, out);
        }
        Condition::Time(c) => collect_params(&c.props().return_value_test.value, out),
        Condition::Contract(c) => {
            c.props().parameters.iter().for_each(|v| collect_params(v, out));
            collect_params(&c.props().return_value_test.value, out);
        }
        Condition::JsonApi(c) => {
            let props = c.props();
            for value in props.parameters.iter().flat_map(|m| m.values()) {
                collect_params(value, out);
            }
            collect_token(props.authorization_token.as_deref(), out);
            collect_params(&props.return_value_test.value, out);
        }
        Condition::JsonRpc(c) => {
            let props = c.props();
            if let Some(params) = &props.params {
                collect_params(params, out);
            }
            collect_token(props.authorization_token.as_deref(), out);
            collect_params(&props.return_value_test.value, out);
        }
        Condition::Jwt(c) => collect_token(Some(&c.props().jwt_token), out),
        Condition::Compound(_) | Condition::Sequential(_) | Condition::IfThenElse(_) => {}
    }
}

fn collect_token(token: Option<&str>, out: &mut BTreeSet<ContextParam>) {
    if let Some(param) = token.and_then(ContextParam::parse) {
        out.insert(param);
    }
}
