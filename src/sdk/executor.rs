// SPDX-License-Identifier: MIT

use crate::taco::conditions::Condition;
use async_trait::async_trait;
use serde_json::Value;
use std::error::Error;

/// Trait for the external engine that executes leaf conditions.
///
/// The evaluator only hands over leaves whose context parameters are already
/// resolved. Implementations return the raw observation:
/// - `rpc`/`contract`: the call result
/// - `time`: the observed block timestamp
/// - `json-api`/`json-rpc`: the full JSON response (the query is applied afterwards)
/// - `jwt`: the verified token claims
///
/// Implementations must be idempotent for identical input and must not
/// leave side effects behind when they fail.
#[async_trait]
pub trait LeafExecutor: Send + Sync {
    async fn execute(&self, leaf: &Condition) -> Result<Value, Box<dyn Error + Send + Sync>>;
}
