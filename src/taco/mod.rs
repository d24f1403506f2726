// SPDX-License-Identifier: MIT

//! Threshold access-control conditions

pub mod conditions;
pub mod config;
pub mod context;
pub mod expression;
pub mod loader;

pub use conditions::{check_chain_consistency, Condition, ConditionFactory, Evaluator, Outcome};
pub use config::{CodecConfig, EvaluatorConfig};
pub use context::ConditionContext;
pub use expression::{ConditionExpression, EXPRESSION_VERSION};
pub use loader::ConditionLoader;
