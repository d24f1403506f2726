// SPDX-License-Identifier: MIT

//! Context parameter tokens
//!
//! A token is a whole string of the form `:name`, where `name` matches
//! `[A-Za-z_][A-Za-z0-9_]*`. Strings that merely contain a colon are
//! literals.

use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Sigil that introduces a context parameter
pub const CONTEXT_PARAM_PREFIX: char = ':';

/// Bound from the requester's authenticated wallet
pub const USER_ADDRESS_PARAM: &str = ":userAddress";

/// Bound from an externally produced EIP-4361 sign-in message
pub const USER_ADDRESS_EXTERNAL_EIP4361_PARAM: &str = ":userAddressExternalEIP4361";

/// Default token carrying a JWT for `jwt` conditions
pub const JWT_TOKEN_PARAM: &str = ":jwtToken";

/// Parameters whose values are supplied by authentication providers only
pub const RESERVED_CONTEXT_PARAMS: [&str; 2] =
    [USER_ADDRESS_PARAM, USER_ADDRESS_EXTERNAL_EIP4361_PARAM];

/// A validated context parameter token, stored with its leading sigil
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextParam(String);

impl ContextParam {
    /// Parse a token; returns `None` for anything that is not a full match
    pub fn parse(token: &str) -> Option<Self> {
        let name = token.strip_prefix(CONTEXT_PARAM_PREFIX)?;
        if is_identifier(name) {
            Some(Self(token.to_string()))
        } else {
            None
        }
    }

    /// Build a token from a bare name such as a sequential `varName`
    pub fn from_name(name: &str) -> Option<Self> {
        if is_identifier(name) {
            Some(Self(format!("{}{}", CONTEXT_PARAM_PREFIX, name)))
        } else {
            None
        }
    }

    /// The full token, including the sigil
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name without the sigil
    pub fn name(&self) -> &str {
        &self.0[1..]
    }

    pub fn is_reserved(&self) -> bool {
        RESERVED_CONTEXT_PARAMS.contains(&self.0.as_str())
    }
}

impl fmt::Display for ContextParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// True when `value` is a string that is exactly one context parameter token
pub fn is_context_param(value: &Value) -> bool {
    value.as_str().and_then(ContextParam::parse).is_some()
}

/// Check the identifier grammar shared by parameter names and `varName`s
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Collect every token found anywhere inside `value`, depth-first
pub fn collect_params(value: &Value, out: &mut BTreeSet<ContextParam>) {
    match value {
        Value::String(s) => {
            if let Some(param) = ContextParam::parse(s) {
                out.insert(param);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_params(item, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_params(item, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid_tokens() {
        assert!(ContextParam::parse(":userAddress").is_some());
        assert!(ContextParam::parse(":_private9").is_some());
        assert_eq!(ContextParam::parse(":a").unwrap().name(), "a");
    }

    #[test]
    fn test_parse_rejects_non_tokens() {
        assert!(ContextParam::parse("userAddress").is_none());
        assert!(ContextParam::parse(":").is_none());
        assert!(ContextParam::parse(":9lives").is_none());
        assert!(ContextParam::parse(":with space").is_none());
        assert!(ContextParam::parse("Bearer :token").is_none());
        assert!(ContextParam::parse("::double").is_none());
    }

    #[test]
    fn test_reserved() {
        assert!(ContextParam::parse(USER_ADDRESS_PARAM).unwrap().is_reserved());
        assert!(!ContextParam::parse(":balance").unwrap().is_reserved());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(ContextParam::from_name("step1").unwrap().as_str(), ":step1");
        assert!(ContextParam::from_name("1step").is_none());
    }

    #[test]
    fn test_collect_nested() {
        let value = json!([":a", {"inner": [":b", "literal"], "n": 3}, ":a"]);
        let mut found = BTreeSet::new();
        collect_params(&value, &mut found);
        let names: Vec<&str> = found.iter().map(|p| p.as_str()).collect();
        assert_eq!(names, vec![":a", ":b"]);
    }

    #[test]
    fn test_object_keys_are_not_tokens() {
        let value = json!({":key": "value"});
        let mut found = BTreeSet::new();
        collect_params(&value, &mut found);
        assert!(found.is_empty());
    }
}
