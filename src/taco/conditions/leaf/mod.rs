// SPDX-License-Identifier: MIT

//! Leaf condition kinds
//!
//! A leaf reads one external fact (chain state, an HTTP resource, a token)
//! and tests it. Execution itself is delegated to a
//! [`LeafExecutor`](crate::sdk::LeafExecutor).

pub mod contract;
pub mod json_api;
pub mod json_rpc;
pub mod jwt;
pub mod rpc;
pub mod time;

pub use contract::{ContractCondition, ContractProps};
pub use json_api::{JsonApiCondition, JsonApiProps};
pub use json_rpc::{JsonRpcCondition, JsonRpcProps};
pub use jwt::{JwtCondition, JwtProps};
pub use rpc::{RpcCondition, RpcProps, RPC_METHODS};
pub use time::{TimeCondition, TimeProps, BLOCKTIME_METHOD};
