// SPDX-License-Identifier: MIT

//! Condition loader - JSON and YAML document loading
//!
//! A document is either a full expression envelope (`version` +
//! `condition`) or a bare condition object.

use crate::sdk::error::ConditionError;
use crate::taco::conditions::ConditionFactory;
use crate::taco::expression::ConditionExpression;

use serde_json::Value;
use std::fs;
use std::path::Path;

/// Loads condition expressions from files
pub struct ConditionLoader {
    factory: ConditionFactory,
}

impl ConditionLoader {
    pub fn new(factory: ConditionFactory) -> Self {
        Self { factory }
    }

    /// Load a `.json`, `.yaml` or `.yml` document
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<ConditionExpression, ConditionError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        self.factory.check_size(content.len())?;
        log::debug!("Loading condition document {}", path.display());

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => self.parse_yaml(&content),
            _ => self.parse_json(&content),
        }
    }

    /// Parse a document from a JSON string
    pub fn parse_json(&self, content: &str) -> Result<ConditionExpression, ConditionError> {
        let raw: Value = serde_json::from_str(content)?;
        self.parse_value(&raw)
    }

    /// Parse a document from a YAML string
    pub fn parse_yaml(&self, content: &str) -> Result<ConditionExpression, ConditionError> {
        let raw: Value = serde_yaml::from_str(content)?;
        self.parse_value(&raw)
    }

    fn parse_value(&self, raw: &Value) -> Result<ConditionExpression, ConditionError> {
        if raw.get("version").is_some() && raw.get("condition").is_some() {
            ConditionExpression::from_json_with(raw, &self.factory)
        } else {
            Ok(ConditionExpression::new(self.factory.from_wire(raw)?))
        }
    }
}

impl Default for ConditionLoader {
    fn default() -> Self {
        Self::new(ConditionFactory::default())
    }
}
