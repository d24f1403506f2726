// SPDX-License-Identifier: MIT

//! Capability interfaces consumed from wallet/provider adapters
//!
//! The condition model never talks to a chain client directly. Adapters for
//! concrete client libraries implement these two traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;

/// A read-only call against chain state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    /// Target contract address
    pub to: String,
    /// ABI-encoded call data, hex with `0x` prefix
    pub data: String,
    /// Block tag or number, `latest` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_tag: Option<String>,
}

/// Trait for adapters that can read chain state
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Returns the numeric id of the chain this provider is connected to
    async fn get_chain_id(&self) -> Result<u64, Box<dyn Error + Send + Sync>>;

    /// Execute a read-only call and return the raw result bytes
    async fn call(&self, request: &CallRequest) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>>;

    /// Returns the balance of `address` in wei, as a decimal string
    async fn get_balance(
        &self,
        address: &str,
        block_tag: Option<&str>,
    ) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// Trait for adapters that hold a signing key
#[async_trait]
pub trait Signer: Send + Sync {
    /// Returns the signer's address
    async fn get_address(&self) -> Result<String, Box<dyn Error + Send + Sync>>;

    /// Sign an arbitrary message and return the signature bytes
    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>>;
}
