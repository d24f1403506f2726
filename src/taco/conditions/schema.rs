// SPDX-License-Identifier: MIT

//! Schema registry
//!
//! Each condition kind implements [`ConditionSchema`]: a pure function that
//! reads a raw JSON object, records every violation on a shared [`Decoder`]
//! and yields the typed value object. [`construct`] is the single
//! validate-then-wrap entry point used by all kinds.

use super::factory;
use super::query::JsonQuery;
use super::types::{ConditionType, ReturnValueTest};
use super::{
    CompoundProps, Condition, ContractProps, IfThenElseProps, JsonApiProps, JsonRpcProps,
    JwtProps, RpcProps, SequentialProps, TimeProps,
};
use crate::sdk::error::{ConditionError, ValidationReport};
use crate::taco::config::CodecConfig;
use crate::taco::context::params::{is_context_param, ContextParam};

use schemars::schema::RootSchema;
use schemars::schema_for;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

/// Path of the root node in issue and error reports
pub const ROOT_PATH: &str = "$";

/// Name of the discriminator field carried by every node
pub const CONDITION_TYPE_FIELD: &str = "conditionType";

pub fn field_path(base: &str, key: &str) -> String {
    format!("{}.{}", base, key)
}

pub fn index_path(base: &str, index: usize) -> String {
    format!("{}[{}]", base, index)
}

/// A condition kind's schema: validation plus construction of its value object
pub trait ConditionSchema: Sized {
    /// The tag this schema validates
    const CONDITION_TYPE: ConditionType;

    /// Validate `obj`, reporting every violation on `cx`.
    ///
    /// Returns `None` when a required piece could not be read. A `Some` is
    /// only trusted once the decoder finishes with an empty report.
    fn decode(cx: &mut Decoder<'_>, obj: &Map<String, Value>, path: &str) -> Option<Self>;
}

/// Validate `raw` against the schema of `S` and wrap it.
///
/// A missing `conditionType` defaults to `S`'s tag; a different tag is a
/// schema violation.
pub fn construct<S: ConditionSchema>(
    raw: &Value,
    config: &CodecConfig,
) -> Result<S, ConditionError> {
    let mut cx = Decoder::new(config);
    let node = cx.kind::<S>(raw, ROOT_PATH);
    cx.finish(node)
}

/// Route typed props through the kind's schema
pub fn construct_from_props<S, P>(props: &P) -> Result<S, ConditionError>
where
    S: ConditionSchema,
    P: Serialize,
{
    let raw = serde_json::to_value(props)?;
    construct::<S>(&raw, &CodecConfig::default())
}

/// Shared state of one validation pass
pub struct Decoder<'c> {
    config: &'c CodecConfig,
    report: ValidationReport,
    fatal: Option<ConditionError>,
    depth: usize,
    // Sequential variable names bound by enclosing entries, innermost last
    visible: Vec<String>,
}

impl<'c> Decoder<'c> {
    pub fn new(config: &'c CodecConfig) -> Self {
        Self {
            config,
            report: ValidationReport::new(),
            fatal: None,
            depth: 0,
            visible: Vec::new(),
        }
    }

    /// Decode any tagged condition, dispatching on its `conditionType`
    pub fn condition(&mut self, raw: &Value, path: &str) -> Option<Condition> {
        if self.fatal.is_some() {
            return None;
        }
        let obj = self.object(raw, path)?;

        let tag = match obj.get(CONDITION_TYPE_FIELD) {
            Some(Value::String(tag)) => tag,
            Some(other) => {
                self.issue(
                    field_path(path, CONDITION_TYPE_FIELD),
                    format!("must be a string, got {}", other),
                );
                return None;
            }
            None => {
                self.issue(field_path(path, CONDITION_TYPE_FIELD), "is required");
                return None;
            }
        };

        let Some(kind) = ConditionType::from_tag(tag) else {
            log::debug!("Rejecting unknown condition type '{}' at {}", tag, path);
            self.fatal = Some(ConditionError::unknown_type(tag.as_str(), path));
            return None;
        };

        self.enter(path)?;
        let node = factory::dispatch(self, kind, obj, path);
        self.depth -= 1;
        node
    }

    /// Decode a node whose kind is known statically
    pub fn kind<S: ConditionSchema>(&mut self, raw: &Value, path: &str) -> Option<S> {
        let obj = self.object(raw, path)?;

        match obj.get(CONDITION_TYPE_FIELD) {
            None => {}
            Some(Value::String(tag)) if tag == S::CONDITION_TYPE.as_str() => {}
            Some(other) => self.issue(
                field_path(path, CONDITION_TYPE_FIELD),
                format!("must be '{}', got {}", S::CONDITION_TYPE, other),
            ),
        }

        self.enter(path)?;
        let node = S::decode(self, obj, path);
        self.depth -= 1;
        node
    }

    /// Decode the child condition stored under `key`
    pub fn child(&mut self, obj: &Map<String, Value>, path: &str, key: &str) -> Option<Condition> {
        let child_path = field_path(path, key);
        match obj.get(key) {
            None | Some(Value::Null) => {
                self.issue(child_path, "is required");
                None
            }
            Some(raw) => self.condition(raw, &child_path),
        }
    }

    /// Read and deserialize a required field
    pub fn required<T: DeserializeOwned>(
        &mut self,
        obj: &Map<String, Value>,
        path: &str,
        key: &str,
    ) -> Option<T> {
        match obj.get(key) {
            None | Some(Value::Null) => {
                self.issue(field_path(path, key), "is required");
                None
            }
            Some(raw) => self.parse(raw, &field_path(path, key)),
        }
    }

    /// Read and deserialize an optional field; `null` counts as absent
    pub fn optional<T: DeserializeOwned>(
        &mut self,
        obj: &Map<String, Value>,
        path: &str,
        key: &str,
    ) -> Option<T> {
        match obj.get(key) {
            None | Some(Value::Null) => None,
            Some(raw) => self.parse(raw, &field_path(path, key)),
        }
    }

    /// Record a shape/range violation
    pub fn issue(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.report.schema(path, message);
    }

    /// Record a tree-level rule violation
    pub fn violation(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.report.structural(path, message);
    }

    pub fn config(&self) -> &CodecConfig {
        self.config
    }

    pub(crate) fn visible_mark(&self) -> usize {
        self.visible.len()
    }

    /// Make a sequential variable visible to everything decoded after it
    pub(crate) fn bind_visible(&mut self, name: &str) {
        self.visible.push(name.to_string());
    }

    /// Drop the bindings made since `mark`, when their sequential closes
    pub(crate) fn restore_visible(&mut self, mark: usize) {
        self.visible.truncate(mark);
    }

    pub(crate) fn is_visible(&self, name: &str) -> bool {
        self.visible.iter().any(|v| v == name)
    }

    /// Conclude the pass: the fatal error wins, then the aggregated report
    pub fn finish<T>(self, node: Option<T>) -> Result<T, ConditionError> {
        if let Some(fatal) = self.fatal {
            return Err(fatal);
        }
        self.report.into_result()?;
        node.ok_or_else(|| ConditionError::schema(ROOT_PATH, "condition could not be constructed"))
    }

    fn parse<T: DeserializeOwned>(&mut self, raw: &Value, path: &str) -> Option<T> {
        match serde_json::from_value(raw.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                self.issue(path, format!("invalid value: {}", e));
                None
            }
        }
    }

    fn object<'v>(&mut self, raw: &'v Value, path: &str) -> Option<&'v Map<String, Value>> {
        match raw.as_object() {
            Some(obj) => Some(obj),
            None => {
                self.issue(path, format!("condition must be an object, got {}", raw));
                None
            }
        }
    }

    fn enter(&mut self, path: &str) -> Option<()> {
        if self.depth >= self.config.max_depth {
            self.violation(
                path,
                format!("nesting exceeds the maximum depth of {}", self.config.max_depth),
            );
            return None;
        }
        self.depth += 1;
        Some(())
    }
}

// Field validators shared by the leaf kinds

/// `chain`: a positive integer chain id
pub fn chain(cx: &mut Decoder<'_>, obj: &Map<String, Value>, path: &str) -> Option<u64> {
    let chain: u64 = cx.required(obj, path, "chain")?;
    if chain == 0 {
        cx.issue(field_path(path, "chain"), "must be a positive integer");
    }
    Some(chain)
}

/// `returnValueTest`, including the comparator/value combination check
pub fn return_value_test(
    cx: &mut Decoder<'_>,
    obj: &Map<String, Value>,
    path: &str,
) -> Option<ReturnValueTest> {
    let test: ReturnValueTest = cx.required(obj, path, "returnValueTest")?;
    if test.comparator.is_numeric() && !is_numeric_operand(&test.value) {
        cx.issue(
            field_path(&field_path(path, "returnValueTest"), "value"),
            format!(
                "comparator '{}' requires a numeric value or context parameter, got {}",
                test.comparator, test.value
            ),
        );
    }
    Some(test)
}

fn is_numeric_operand(value: &Value) -> bool {
    is_context_param(value) || super::compare::as_numeric(value).is_some()
}

/// A required, non-empty string field
pub fn non_empty_string(
    cx: &mut Decoder<'_>,
    obj: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Option<String> {
    let value: String = cx.required(obj, path, key)?;
    if value.trim().is_empty() {
        cx.issue(field_path(path, key), "must not be empty");
    }
    Some(value)
}

/// `endpoint`: an absolute https URL
pub fn https_endpoint(
    cx: &mut Decoder<'_>,
    obj: &Map<String, Value>,
    path: &str,
) -> Option<String> {
    let endpoint: String = cx.required(obj, path, "endpoint")?;
    match Url::parse(&endpoint) {
        Ok(url) if url.scheme() == "https" => {}
        Ok(url) => cx.issue(
            field_path(path, "endpoint"),
            format!("must use https, got '{}'", url.scheme()),
        ),
        Err(e) => cx.issue(
            field_path(path, "endpoint"),
            format!("'{}' is not a valid URL: {}", endpoint, e),
        ),
    }
    Some(endpoint)
}

/// An optional field that must hold a context parameter token
pub fn optional_context_param(
    cx: &mut Decoder<'_>,
    obj: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Option<String> {
    let token: String = cx.optional(obj, path, key)?;
    if ContextParam::parse(&token).is_none() {
        cx.issue(
            field_path(path, key),
            format!("must be a context parameter such as ':token', got '{}'", token),
        );
    }
    Some(token)
}

/// An optional `query` expression
pub fn optional_query(
    cx: &mut Decoder<'_>,
    obj: &Map<String, Value>,
    path: &str,
) -> Option<String> {
    let query: String = cx.optional(obj, path, "query")?;
    if let Err(e) = JsonQuery::parse(&query) {
        cx.issue(field_path(path, "query"), e);
    }
    Some(query)
}

/// `0x` followed by 40 hex digits
pub fn is_eth_address(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// JSON Schema of a kind's wire form, for authoring tools
pub fn json_schema_for(kind: ConditionType) -> RootSchema {
    match kind {
        ConditionType::Rpc => schema_for!(RpcProps),
        ConditionType::Time => schema_for!(TimeProps),
        ConditionType::Contract => schema_for!(ContractProps),
        ConditionType::JsonApi => schema_for!(JsonApiProps),
        ConditionType::JsonRpc => schema_for!(JsonRpcProps),
        ConditionType::Jwt => schema_for!(JwtProps),
        ConditionType::Compound => schema_for!(CompoundProps),
        ConditionType::Sequential => schema_for!(SequentialProps),
        ConditionType::IfThenElse => schema_for!(IfThenElseProps),
    }
}
