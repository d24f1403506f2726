// SPDX-License-Identifier: MIT

//! Wire-level enumerations and small value types shared by condition kinds
//!
//! Every tag and symbol in this module is part of the compatibility surface
//! and must not be renamed.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Discriminator carried by every node in the `conditionType` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ConditionType {
    #[serde(rename = "rpc")]
    Rpc,
    #[serde(rename = "time")]
    Time,
    #[serde(rename = "contract")]
    Contract,
    #[serde(rename = "json-api")]
    JsonApi,
    #[serde(rename = "json-rpc")]
    JsonRpc,
    #[serde(rename = "jwt")]
    Jwt,
    #[serde(rename = "compound")]
    Compound,
    #[serde(rename = "sequential")]
    Sequential,
    #[serde(rename = "if-then-else")]
    IfThenElse,
}

impl ConditionType {
    pub const ALL: [ConditionType; 9] = [
        ConditionType::Rpc,
        ConditionType::Time,
        ConditionType::Contract,
        ConditionType::JsonApi,
        ConditionType::JsonRpc,
        ConditionType::Jwt,
        ConditionType::Compound,
        ConditionType::Sequential,
        ConditionType::IfThenElse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionType::Rpc => "rpc",
            ConditionType::Time => "time",
            ConditionType::Contract => "contract",
            ConditionType::JsonApi => "json-api",
            ConditionType::JsonRpc => "json-rpc",
            ConditionType::Jwt => "jwt",
            ConditionType::Compound => "compound",
            ConditionType::Sequential => "sequential",
            ConditionType::IfThenElse => "if-then-else",
        }
    }

    /// Look up a kind by its wire tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(
            self,
            ConditionType::Compound | ConditionType::Sequential | ConditionType::IfThenElse
        )
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operators for return value tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Comparator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
}

impl Comparator {
    /// Ordering comparators need both sides to be numeric
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Comparator::Eq | Comparator::NotEq)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::Eq => write!(f, "=="),
            Comparator::NotEq => write!(f, "!="),
            Comparator::Gt => write!(f, ">"),
            Comparator::Gte => write!(f, ">="),
            Comparator::Lt => write!(f, "<"),
            Comparator::Lte => write!(f, "<="),
        }
    }
}

/// Expected-value test applied to a leaf's raw result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReturnValueTest {
    /// Selects one element of an array result before comparing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    pub comparator: Comparator,
    /// Literal or context parameter token
    pub value: Value,
}

impl ReturnValueTest {
    pub fn new(comparator: Comparator, value: impl Into<Value>) -> Self {
        Self {
            index: None,
            comparator,
            value: value.into(),
        }
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }
}

/// Boolean operator of a compound condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CompoundOperator {
    And,
    Or,
    Not,
}

impl fmt::Display for CompoundOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompoundOperator::And => write!(f, "and"),
            CompoundOperator::Or => write!(f, "or"),
            CompoundOperator::Not => write!(f, "not"),
        }
    }
}

/// What a sequential condition does when one of its entries fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failing entry (default)
    #[default]
    Halt,
    /// Bind the failed entry's variable as absent and keep going
    Continue,
}
