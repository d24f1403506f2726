// SPDX-License-Identifier: MIT

//! Context parameters: grammar, scopes, resolution and the runtime store

pub mod params;
pub mod resolver;
pub mod scope;
pub mod store;

pub use params::{
    ContextParam, JWT_TOKEN_PARAM, RESERVED_CONTEXT_PARAMS, USER_ADDRESS_EXTERNAL_EIP4361_PARAM,
    USER_ADDRESS_PARAM,
};
pub use resolver::{resolve_condition, resolve_leaf, resolve_value};
pub use scope::{Binding, Scope};
pub use store::ConditionContext;
