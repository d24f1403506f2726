// SPDX-License-Identifier: MIT

//! Shared kit - error types and the capability traits the condition model
//! consumes from the outside world.

pub mod error;
pub mod executor;
pub mod provider;

pub use error::{ConditionError, ValidationIssue, ValidationReport};
pub use executor::LeafExecutor;
pub use provider::{CallRequest, ChainProvider, Signer};
