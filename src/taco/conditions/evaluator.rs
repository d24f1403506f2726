// SPDX-License-Identifier: MIT

//! Reference evaluator
//!
//! Folds a condition tree over a [`LeafExecutor`]. Leaves are resolved
//! against the current scope right before they run; combinators decide
//! which children run at all.

use super::query::JsonQuery;
use super::schema::{field_path, ROOT_PATH};
use super::{
    CompoundCondition, CompoundOperator, Condition, FailurePolicy, IfThenElseCondition,
    JwtCondition, SequentialCondition,
};
use crate::sdk::error::ConditionError;
use crate::sdk::executor::LeafExecutor;
use crate::taco::config::EvaluatorConfig;
use crate::taco::context::params::CONTEXT_PARAM_PREFIX;
use crate::taco::context::resolver;
use crate::taco::context::{ConditionContext, Scope};

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::sync::Arc;

/// Result of evaluating one node
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub passed: bool,
    /// The observed value for leaves; the verdict as a boolean for combinators
    pub value: Value,
}

impl Outcome {
    fn verdict(passed: bool) -> Self {
        Self {
            passed,
            value: Value::Bool(passed),
        }
    }
}

/// Evaluates condition trees against live data
pub struct Evaluator {
    executor: Arc<dyn LeafExecutor>,
    config: EvaluatorConfig,
}

impl Evaluator {
    pub fn new(executor: Arc<dyn LeafExecutor>) -> Self {
        Self::with_config(executor, EvaluatorConfig::default())
    }

    pub fn with_config(executor: Arc<dyn LeafExecutor>, config: EvaluatorConfig) -> Self {
        Self { executor, config }
    }

    /// Evaluate `condition` with the runtime values bound in `context`
    pub async fn evaluate(
        &self,
        condition: &Condition,
        context: &ConditionContext,
    ) -> Result<Outcome, ConditionError> {
        let scope = context.scope();
        let outcome = self.eval(condition, &scope, ROOT_PATH.to_string()).await?;
        log::debug!(
            "Evaluated {} condition: passed={}",
            condition.condition_type(),
            outcome.passed
        );
        Ok(outcome)
    }

    fn eval<'a>(
        &'a self,
        condition: &'a Condition,
        scope: &'a Scope<'a>,
        path: String,
    ) -> BoxFuture<'a, Result<Outcome, ConditionError>> {
        async move {
            match condition {
                Condition::Compound(c) => self.eval_compound(c, scope, &path).await,
                Condition::Sequential(c) => self.eval_sequential(c, scope, &path).await,
                Condition::IfThenElse(c) => self.eval_if_then_else(c, scope, &path).await,
                leaf => self.eval_leaf(leaf, scope, &path).await,
            }
        }
        .boxed()
    }

    async fn eval_compound(
        &self,
        compound: &CompoundCondition,
        scope: &Scope<'_>,
        path: &str,
    ) -> Result<Outcome, ConditionError> {
        let operands_path = field_path(path, "operands");
        let operand_path = |i: usize| format!("{}[{}]", operands_path, i);

        match compound.operator() {
            CompoundOperator::And => {
                for (i, operand) in compound.operands().iter().enumerate() {
                    if !self.eval(operand, scope, operand_path(i)).await?.passed {
                        return Ok(Outcome::verdict(false));
                    }
                }
                Ok(Outcome::verdict(true))
            }
            CompoundOperator::Or => {
                for (i, operand) in compound.operands().iter().enumerate() {
                    if self.eval(operand, scope, operand_path(i)).await?.passed {
                        return Ok(Outcome::verdict(true));
                    }
                }
                Ok(Outcome::verdict(false))
            }
            CompoundOperator::Not => {
                let mut passed = true;
                for (i, operand) in compound.operands().iter().enumerate() {
                    passed = !self.eval(operand, scope, operand_path(i)).await?.passed;
                }
                Ok(Outcome::verdict(passed))
            }
        }
    }

    async fn eval_sequential(
        &self,
        sequential: &SequentialCondition,
        scope: &Scope<'_>,
        path: &str,
    ) -> Result<Outcome, ConditionError> {
        let policy = sequential.failure_policy();
        let mut local = scope.child();
        let mut last = None;

        for (i, var) in sequential.condition_variables().iter().enumerate() {
            let entry_path = format!("{}.conditionVariables[{}].condition", path, i);
            let token = format!("{}{}", CONTEXT_PARAM_PREFIX, var.var_name);
            let result = self.eval(&var.condition, &local, entry_path.clone()).await;

            match (policy, result) {
                (_, Ok(outcome)) if outcome.passed => {
                    local.bind(token, outcome.value.clone());
                    last = Some(outcome);
                }
                (FailurePolicy::Halt, Ok(_)) => {
                    log::debug!("Sequential entry '{}' failed, halting", var.var_name);
                    return Ok(Outcome::verdict(false));
                }
                (FailurePolicy::Halt, Err(e)) => return Err(e),
                (FailurePolicy::Continue, Ok(outcome)) => {
                    log::warn!(
                        "Sequential entry '{}' at {} failed, continuing",
                        var.var_name,
                        entry_path
                    );
                    local.bind_absent(token);
                    last = Some(outcome);
                }
                (FailurePolicy::Continue, Err(e)) => {
                    log::warn!(
                        "Sequential entry '{}' at {} errored, continuing: {}",
                        var.var_name,
                        entry_path,
                        e
                    );
                    local.bind_absent(token);
                    last = Some(Outcome::verdict(false));
                }
            }
        }

        Ok(last.unwrap_or_else(|| Outcome::verdict(true)))
    }

    async fn eval_if_then_else(
        &self,
        ite: &IfThenElseCondition,
        scope: &Scope<'_>,
        path: &str,
    ) -> Result<Outcome, ConditionError> {
        let test = self
            .eval(ite.if_condition(), scope, field_path(path, "ifCondition"))
            .await?;
        if test.passed {
            self.eval(ite.then_condition(), scope, field_path(path, "thenCondition"))
                .await
        } else {
            self.eval(ite.else_condition(), scope, field_path(path, "elseCondition"))
                .await
        }
    }

    async fn eval_leaf(
        &self,
        leaf: &Condition,
        scope: &Scope<'_>,
        path: &str,
    ) -> Result<Outcome, ConditionError> {
        let resolved = resolver::resolve_leaf(leaf, scope, path)?;
        let observed = self.execute(&resolved, path).await?;

        if let Condition::Jwt(jwt) = &resolved {
            return check_claims(jwt, observed, path);
        }

        let value = apply_query(&resolved, observed, path)?;
        let test = resolved.return_value_test().ok_or_else(|| {
            ConditionError::comparison(path, "leaf has no return value test")
        })?;
        let passed = test.test(&value, &field_path(path, "returnValueTest"))?;
        Ok(Outcome { passed, value })
    }

    async fn execute(&self, leaf: &Condition, path: &str) -> Result<Value, ConditionError> {
        let kind = leaf.condition_type();
        log::debug!("Executing {} condition at {}", kind, path);

        match tokio::time::timeout(self.config.leaf_timeout, self.executor.execute(leaf)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ConditionError::Execution {
                condition_type: kind.to_string(),
                path: path.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(ConditionError::Timeout {
                path: path.to_string(),
                after_ms: self.config.leaf_timeout.as_millis() as u64,
            }),
        }
    }
}

fn apply_query(leaf: &Condition, observed: Value, path: &str) -> Result<Value, ConditionError> {
    let query = match leaf {
        Condition::JsonApi(c) => c.props().query.as_deref(),
        Condition::JsonRpc(c) => c.props().query.as_deref(),
        _ => None,
    };
    let Some(query) = query else {
        return Ok(observed);
    };

    let query_path = field_path(path, "query");
    let parsed =
        JsonQuery::parse(query).map_err(|e| ConditionError::comparison(&query_path, e))?;
    parsed.select(&observed).ok_or_else(|| {
        ConditionError::comparison(
            query_path,
            format!("query '{}' matched nothing in the response", parsed),
        )
    })
}

fn check_claims(jwt: &JwtCondition, claims: Value, path: &str) -> Result<Outcome, ConditionError> {
    if !claims.is_object() {
        return Err(ConditionError::comparison(
            path,
            format!("expected verified claims as an object, got {}", claims),
        ));
    }

    let props = jwt.props();
    let claim_matches = |claim: &str, expected: &Option<String>| match expected {
        Some(expected) => claims.get(claim).and_then(Value::as_str) == Some(expected.as_str()),
        None => true,
    };
    let passed = claim_matches("iss", &props.expected_issuer)
        && claim_matches("sub", &props.expected_subject);

    Ok(Outcome {
        passed,
        value: claims,
    })
}
