// SPDX-License-Identifier: MIT

//! Versioned envelope shipped next to the ciphertext

use crate::sdk::error::ConditionError;
use crate::taco::conditions::{Condition, ConditionFactory};
use crate::taco::context::params::ContextParam;
use crate::taco::context::ConditionContext;

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// Version stamped on newly built expressions
pub const EXPRESSION_VERSION: &str = "1.0.0";

/// A condition tree with its format version
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionExpression {
    version: String,
    condition: Condition,
}

impl ConditionExpression {
    pub fn new(condition: Condition) -> Self {
        Self {
            version: EXPRESSION_VERSION.to_string(),
            condition,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn into_condition(self) -> Condition {
        self.condition
    }

    pub fn to_json(&self) -> Result<Value, ConditionError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json_string(&self) -> Result<String, ConditionError> {
        let json = serde_json::to_string(self)?;
        ConditionFactory::default().check_size(json.len())?;
        Ok(json)
    }

    /// Decode with default codec limits
    pub fn from_json(raw: &Value) -> Result<Self, ConditionError> {
        Self::from_json_with(raw, &ConditionFactory::default())
    }

    /// Decode, validating the version before the condition
    pub fn from_json_with(raw: &Value, factory: &ConditionFactory) -> Result<Self, ConditionError> {
        let version = raw
            .get("version")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ConditionError::schema("$.version", "is required and must be a string")
            })?;
        check_version(version)?;

        let condition = raw
            .get("condition")
            .ok_or_else(|| ConditionError::schema("$.condition", "is required"))?;

        Ok(Self {
            version: version.to_string(),
            condition: factory.from_wire(condition)?,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConditionError> {
        let factory = ConditionFactory::default();
        factory.check_size(json.len())?;
        let raw: Value = serde_json::from_str(json)?;
        Self::from_json_with(&raw, &factory)
    }

    /// Context parameters the requester must supply
    pub fn requested_parameters(&self) -> BTreeSet<ContextParam> {
        self.condition.requested_parameters()
    }

    /// An empty runtime context expecting this expression's parameters
    pub fn build_context(&self) -> ConditionContext {
        ConditionContext::for_condition(&self.condition)
    }
}

/// Accept any version sharing the current major component
fn check_version(found: &str) -> Result<(), ConditionError> {
    let incompatible = || ConditionError::IncompatibleVersion {
        found: found.to_string(),
        expected: EXPRESSION_VERSION.to_string(),
    };

    let parts: Vec<&str> = found.split('.').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || p.parse::<u64>().is_err()) {
        return Err(incompatible());
    }
    let current_major = EXPRESSION_VERSION.split('.').next().unwrap_or_default();
    if parts[0] != current_major {
        return Err(incompatible());
    }
    Ok(())
}
