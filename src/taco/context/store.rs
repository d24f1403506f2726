// SPDX-License-Identifier: MIT

//! Runtime binding store for condition evaluation

use super::params::{ContextParam, USER_ADDRESS_PARAM};
use super::scope::Scope;
use crate::sdk::error::ConditionError;
use crate::sdk::provider::Signer;
use crate::taco::conditions::schema::is_eth_address;
use crate::taco::conditions::Condition;

use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

/// Context values supplied by the requester, keyed by token
#[derive(Debug, Clone, Default)]
pub struct ConditionContext {
    /// Parameters the condition needs
    requested: BTreeSet<ContextParam>,
    /// Bound values
    values: HashMap<String, Value>,
}

impl ConditionContext {
    /// A context expecting the parameters `condition` requests
    pub fn for_condition(condition: &Condition) -> Self {
        Self {
            requested: condition.requested_parameters(),
            values: HashMap::new(),
        }
    }

    /// Create an empty context
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from a JSON object of bindings.
    ///
    /// Keys may be tokens (`:name`) or bare names. Reserved parameters are
    /// accepted here since the caller speaks for the authentication layer.
    pub fn from_bindings(bindings: &Value) -> Result<Self, ConditionError> {
        let Some(map) = bindings.as_object() else {
            return Err(ConditionError::InvalidContextParameter {
                token: bindings.to_string(),
                reason: "context bindings must be a JSON object".to_string(),
            });
        };

        let mut context = Self::empty();
        for (key, value) in map {
            let param = ContextParam::parse(key)
                .or_else(|| ContextParam::from_name(key))
                .ok_or_else(|| invalid_token(key))?;
            context.values.insert(param.as_str().to_string(), value.clone());
        }
        Ok(context)
    }

    /// Parameters the condition needs
    pub fn requested_parameters(&self) -> &BTreeSet<ContextParam> {
        &self.requested
    }

    /// Bind a non-reserved parameter
    pub fn add_custom_parameter(
        &mut self,
        token: &str,
        value: Value,
    ) -> Result<(), ConditionError> {
        let param = ContextParam::parse(token).ok_or_else(|| invalid_token(token))?;
        if param.is_reserved() {
            return Err(ConditionError::InvalidContextParameter {
                token: token.to_string(),
                reason: "reserved for authentication providers".to_string(),
            });
        }
        log::debug!("Binding custom context parameter {}", param);
        self.values.insert(param.as_str().to_string(), value);
        Ok(())
    }

    /// Bind `:userAddress` from a signer
    pub async fn bind_user_address(&mut self, signer: &dyn Signer) -> Result<(), ConditionError> {
        let address = signer
            .get_address()
            .await
            .map_err(|e| ConditionError::Provider {
                message: format!("failed to read signer address: {}", e),
            })?;
        if !is_eth_address(&address) {
            return Err(ConditionError::Provider {
                message: format!("signer returned an invalid address '{}'", address),
            });
        }
        self.values
            .insert(USER_ADDRESS_PARAM.to_string(), Value::String(address));
        Ok(())
    }

    /// Get a bound value by token
    pub fn get(&self, token: &str) -> Option<&Value> {
        self.values.get(token)
    }

    /// Requested parameters that have no binding yet
    pub fn missing_parameters(&self) -> Vec<&ContextParam> {
        self.requested
            .iter()
            .filter(|p| !self.values.contains_key(p.as_str()))
            .collect()
    }

    /// Fail with the first requested parameter that is still unbound
    pub fn ensure_complete(&self) -> Result<(), ConditionError> {
        match self.missing_parameters().first() {
            Some(param) => Err(ConditionError::unresolved(param.as_str(), "$")),
            None => Ok(()),
        }
    }

    /// The root resolution scope over the bound values
    pub fn scope(&self) -> Scope<'static> {
        Scope::root(self.values.clone())
    }

    /// Convert bindings to a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

fn invalid_token(token: &str) -> ConditionError {
    ConditionError::InvalidContextParameter {
        token: token.to_string(),
        reason: "must be ':' followed by a letter or underscore, then letters, digits or \
                 underscores"
            .to_string(),
    }
}
