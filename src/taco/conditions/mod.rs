// SPDX-License-Identifier: MIT

//! The condition expression model
//!
//! A [`Condition`] is a closed tree of nine node kinds. Every node is built
//! through its kind's schema, so a value of this type is always valid.
//! Deserializing one runs the same validation as [`ConditionFactory`].

pub mod abi;
pub mod compare;
pub mod compound;
pub mod evaluator;
pub mod factory;
pub mod if_then_else;
pub mod leaf;
pub mod query;
pub mod schema;
pub mod sequential;
pub mod types;

pub use abi::{AbiParameter, FunctionAbi, StandardContractType};
pub use compound::{CompoundCondition, CompoundProps};
pub use evaluator::{Evaluator, Outcome};
pub use factory::ConditionFactory;
pub use if_then_else::{IfThenElseCondition, IfThenElseProps};
pub use leaf::{
    ContractCondition, ContractProps, JsonApiCondition, JsonApiProps, JsonRpcCondition,
    JsonRpcProps, JwtCondition, JwtProps, RpcCondition, RpcProps, TimeCondition, TimeProps,
};
pub use schema::{construct, json_schema_for, ConditionSchema, Decoder, ROOT_PATH};
pub use sequential::{ConditionVariable, SequentialCondition, SequentialProps};
pub use types::{Comparator, CompoundOperator, ConditionType, FailurePolicy, ReturnValueTest};

use crate::sdk::error::ConditionError;
use crate::sdk::provider::ChainProvider;
use crate::taco::context::params::ContextParam;
use crate::taco::context::resolver;

use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Any node of a condition tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "conditionType")]
pub enum Condition {
    #[serde(rename = "rpc")]
    Rpc(RpcCondition),
    #[serde(rename = "time")]
    Time(TimeCondition),
    #[serde(rename = "contract")]
    Contract(ContractCondition),
    #[serde(rename = "json-api")]
    JsonApi(JsonApiCondition),
    #[serde(rename = "json-rpc")]
    JsonRpc(JsonRpcCondition),
    #[serde(rename = "jwt")]
    Jwt(JwtCondition),
    #[serde(rename = "compound")]
    Compound(CompoundCondition),
    #[serde(rename = "sequential")]
    Sequential(SequentialCondition),
    #[serde(rename = "if-then-else")]
    IfThenElse(IfThenElseCondition),
}

impl Condition {
    pub fn condition_type(&self) -> ConditionType {
        match self {
            Condition::Rpc(_) => ConditionType::Rpc,
            Condition::Time(_) => ConditionType::Time,
            Condition::Contract(_) => ConditionType::Contract,
            Condition::JsonApi(_) => ConditionType::JsonApi,
            Condition::JsonRpc(_) => ConditionType::JsonRpc,
            Condition::Jwt(_) => ConditionType::Jwt,
            Condition::Compound(_) => ConditionType::Compound,
            Condition::Sequential(_) => ConditionType::Sequential,
            Condition::IfThenElse(_) => ConditionType::IfThenElse,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.condition_type().is_leaf()
    }

    /// Chain id of chain-reading leaves
    pub fn chain(&self) -> Option<u64> {
        match self {
            Condition::Rpc(c) => Some(c.props().chain),
            Condition::Time(c) => Some(c.props().chain),
            Condition::Contract(c) => Some(c.props().chain),
            _ => None,
        }
    }

    /// The leaf's expected-value test; `jwt` and combinators have none
    pub fn return_value_test(&self) -> Option<&ReturnValueTest> {
        match self {
            Condition::Rpc(c) => Some(&c.props().return_value_test),
            Condition::Time(c) => Some(&c.props().return_value_test),
            Condition::Contract(c) => Some(&c.props().return_value_test),
            Condition::JsonApi(c) => Some(&c.props().return_value_test),
            Condition::JsonRpc(c) => Some(&c.props().return_value_test),
            _ => None,
        }
    }

    /// Direct children, each with its wire path relative to `path`
    pub fn children(&self, path: &str) -> Vec<(String, &Condition)> {
        match self {
            Condition::Compound(c) => c
                .operands()
                .iter()
                .enumerate()
                .map(|(i, op)| (format!("{}.operands[{}]", path, i), op))
                .collect(),
            Condition::Sequential(c) => c
                .condition_variables()
                .iter()
                .enumerate()
                .map(|(i, var)| {
                    (
                        format!("{}.conditionVariables[{}].condition", path, i),
                        &var.condition,
                    )
                })
                .collect(),
            Condition::IfThenElse(c) => vec![
                (format!("{}.ifCondition", path), c.if_condition()),
                (format!("{}.thenCondition", path), c.then_condition()),
                (format!("{}.elseCondition", path), c.else_condition()),
            ],
            _ => Vec::new(),
        }
    }

    /// Visit every node depth-first, parents before children
    pub fn walk<'c, F>(&'c self, path: &str, visit: &mut F)
    where
        F: FnMut(&'c Condition, &str),
    {
        visit(self, path);
        for (child_path, child) in self.children(path) {
            child.walk(&child_path, visit);
        }
    }

    /// Context parameters the caller must supply.
    ///
    /// Variables bound by an enclosing sequential node are not included.
    pub fn requested_parameters(&self) -> BTreeSet<ContextParam> {
        let mut out = BTreeSet::new();
        self.collect_free_params(&mut out);
        out
    }

    fn collect_free_params(&self, out: &mut BTreeSet<ContextParam>) {
        match self {
            Condition::Compound(c) => {
                for operand in c.operands() {
                    operand.collect_free_params(out);
                }
            }
            Condition::IfThenElse(c) => {
                c.if_condition().collect_free_params(out);
                c.then_condition().collect_free_params(out);
                c.else_condition().collect_free_params(out);
            }
            Condition::Sequential(c) => {
                let mut inner = BTreeSet::new();
                for var in c.condition_variables() {
                    var.condition.collect_free_params(&mut inner);
                }
                let bound = c.bound_tokens();
                out.extend(inner.into_iter().filter(|p| !bound.contains(p.as_str())));
            }
            leaf => resolver::collect_leaf_params(leaf, out),
        }
    }

    /// Encode to the JSON wire form
    pub fn to_wire(&self) -> Result<Value, ConditionError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decode and validate a wire-form value with default limits
    pub fn from_wire(raw: &Value) -> Result<Self, ConditionError> {
        ConditionFactory::default().from_wire(raw)
    }
}

/// Verify every chain-reading leaf targets the provider's chain
pub async fn check_chain_consistency(
    condition: &Condition,
    provider: &dyn ChainProvider,
) -> Result<(), ConditionError> {
    let found = provider
        .get_chain_id()
        .await
        .map_err(|e| ConditionError::Provider {
            message: format!("failed to read chain id: {}", e),
        })?;

    let mut mismatch = None;
    condition.walk(ROOT_PATH, &mut |node, path| {
        if mismatch.is_some() {
            return;
        }
        if let Some(expected) = node.chain() {
            if expected != found {
                mismatch = Some(ConditionError::ChainMismatch {
                    path: path.to_string(),
                    expected,
                    found,
                });
            }
        }
    });

    match mismatch {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

macro_rules! impl_from_kind {
    ($($kind:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$kind> for Condition {
                fn from(condition: $kind) -> Self {
                    Condition::$variant(condition)
                }
            }
        )*
    };
}

impl_from_kind! {
    RpcCondition => Rpc,
    TimeCondition => Time,
    ContractCondition => Contract,
    JsonApiCondition => JsonApi,
    JsonRpcCondition => JsonRpc,
    JwtCondition => Jwt,
    CompoundCondition => Compound,
    SequentialCondition => Sequential,
    IfThenElseCondition => IfThenElse,
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Condition::from_wire(&raw).map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for Condition {
    fn schema_name() -> String {
        "Condition".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        let mut schema = SchemaObject {
            instance_type: Some(InstanceType::Object.into()),
            ..Default::default()
        };
        let object = schema.object();
        object.required.insert(schema::CONDITION_TYPE_FIELD.to_string());
        object.properties.insert(
            schema::CONDITION_TYPE_FIELD.to_string(),
            gen.subschema_for::<ConditionType>(),
        );
        Schema::Object(schema)
    }
}
