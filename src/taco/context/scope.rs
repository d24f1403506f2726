// SPDX-License-Identifier: MIT

//! Lexical scopes for context parameter resolution
//!
//! The root scope holds the caller's runtime context. Each sequential
//! condition opens a child scope; bindings made there are visible only to
//! its later entries and shadow outer bindings of the same name.

use serde_json::Value;
use std::collections::HashMap;

/// What a token is bound to
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Value(Value),
    /// The sequential entry that would have produced this value failed
    Absent,
}

/// A chain of bindings, innermost first
#[derive(Debug, Default)]
pub struct Scope<'a> {
    parent: Option<&'a Scope<'a>>,
    bindings: HashMap<String, Binding>,
}

impl<'a> Scope<'a> {
    /// A root scope over runtime context values keyed by token (`:name`)
    pub fn root(values: HashMap<String, Value>) -> Self {
        Self {
            parent: None,
            bindings: values
                .into_iter()
                .map(|(token, value)| (token, Binding::Value(value)))
                .collect(),
        }
    }

    /// Open a nested scope
    pub fn child(&'a self) -> Scope<'a> {
        Scope {
            parent: Some(self),
            bindings: HashMap::new(),
        }
    }

    /// Bind `token` in this scope
    pub fn bind(&mut self, token: impl Into<String>, value: Value) {
        self.bindings.insert(token.into(), Binding::Value(value));
    }

    /// Mark `token` as absent in this scope
    pub fn bind_absent(&mut self, token: impl Into<String>) {
        self.bindings.insert(token.into(), Binding::Absent);
    }

    /// Find the innermost binding for `token`
    pub fn lookup(&self, token: &str) -> Option<&Binding> {
        match self.bindings.get(token) {
            Some(binding) => Some(binding),
            None => self.parent.and_then(|parent| parent.lookup(token)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn root_with(pairs: Vec<(&str, Value)>) -> Scope<'static> {
        Scope::root(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn test_root_lookup() {
        let scope = root_with(vec![(":userAddress", json!("0xabc"))]);
        assert_eq!(
            scope.lookup(":userAddress"),
            Some(&Binding::Value(json!("0xabc")))
        );
        assert_eq!(scope.lookup(":other"), None);
    }

    #[test]
    fn test_child_shadows_parent() {
        let root = root_with(vec![(":balance", json!(1))]);
        let mut child = root.child();
        assert_eq!(child.lookup(":balance"), Some(&Binding::Value(json!(1))));

        child.bind(":balance", json!(2));
        assert_eq!(child.lookup(":balance"), Some(&Binding::Value(json!(2))));
        assert_eq!(root.lookup(":balance"), Some(&Binding::Value(json!(1))));
    }

    #[test]
    fn test_child_bindings_do_not_leak() {
        let root = root_with(vec![]);
        {
            let mut child = root.child();
            child.bind(":step", json!(true));
            child.bind_absent(":failed");
            assert_eq!(child.lookup(":failed"), Some(&Binding::Absent));
        }
        assert_eq!(root.lookup(":step"), None);
    }
}
