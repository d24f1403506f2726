// SPDX-License-Identifier: MIT

//! Polymorphic codec: tag-dispatched decode and size-checked encode

use super::schema::{ConditionSchema, Decoder, ROOT_PATH};
use super::{
    CompoundCondition, Condition, ConditionType, ContractCondition, IfThenElseCondition,
    JsonApiCondition, JsonRpcCondition, JwtCondition, RpcCondition, SequentialCondition,
    TimeCondition,
};
use crate::sdk::error::ConditionError;
use crate::taco::config::CodecConfig;

use serde_json::{Map, Value};

/// Route a tagged object to its kind's schema.
///
/// The match is exhaustive, so adding a kind without registering it here
/// does not compile.
pub(crate) fn dispatch(
    cx: &mut Decoder<'_>,
    kind: ConditionType,
    obj: &Map<String, Value>,
    path: &str,
) -> Option<Condition> {
    match kind {
        ConditionType::Rpc => RpcCondition::decode(cx, obj, path).map(Condition::Rpc),
        ConditionType::Time => TimeCondition::decode(cx, obj, path).map(Condition::Time),
        ConditionType::Contract => {
            ContractCondition::decode(cx, obj, path).map(Condition::Contract)
        }
        ConditionType::JsonApi => JsonApiCondition::decode(cx, obj, path).map(Condition::JsonApi),
        ConditionType::JsonRpc => JsonRpcCondition::decode(cx, obj, path).map(Condition::JsonRpc),
        ConditionType::Jwt => JwtCondition::decode(cx, obj, path).map(Condition::Jwt),
        ConditionType::Compound => {
            CompoundCondition::decode(cx, obj, path).map(Condition::Compound)
        }
        ConditionType::Sequential => {
            SequentialCondition::decode(cx, obj, path).map(Condition::Sequential)
        }
        ConditionType::IfThenElse => {
            IfThenElseCondition::decode(cx, obj, path).map(Condition::IfThenElse)
        }
    }
}

/// Decodes and encodes condition trees under configured limits
#[derive(Debug, Clone, Default)]
pub struct ConditionFactory {
    config: CodecConfig,
}

impl ConditionFactory {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(CodecConfig::from_env())
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decode and validate a wire-form tree.
    ///
    /// An unknown tag anywhere fails fast with `UnknownConditionType`; all
    /// other violations are collected into one report.
    pub fn from_wire(&self, raw: &Value) -> Result<Condition, ConditionError> {
        let mut cx = Decoder::new(&self.config);
        let node = cx.condition(raw, ROOT_PATH);
        let condition = cx.finish(node)?;
        log::debug!(
            "Decoded {} condition with {} requested parameters",
            condition.condition_type(),
            condition.requested_parameters().len()
        );
        Ok(condition)
    }

    /// Parse JSON text, enforcing the payload limit before parsing
    pub fn from_json_str(&self, json: &str) -> Result<Condition, ConditionError> {
        self.check_size(json.len())?;
        let raw: Value = serde_json::from_str(json)?;
        self.from_wire(&raw)
    }

    pub fn to_wire(&self, condition: &Condition) -> Result<Value, ConditionError> {
        condition.to_wire()
    }

    /// Encode to compact JSON text, enforcing the payload limit
    pub fn to_json_string(&self, condition: &Condition) -> Result<String, ConditionError> {
        let json = serde_json::to_string(condition)?;
        self.check_size(json.len())?;
        Ok(json)
    }

    /// Fail when `size` bytes exceed the payload limit
    pub fn check_size(&self, size: usize) -> Result<(), ConditionError> {
        if size > self.config.max_payload_bytes {
            log::warn!(
                "Rejecting condition payload of {} bytes (limit {})",
                size,
                self.config.max_payload_bytes
            );
            return Err(ConditionError::PayloadTooLarge {
                size,
                limit: self.config.max_payload_bytes,
            });
        }
        Ok(())
    }
}
