// SPDX-License-Identifier: MIT

//! Codec and evaluator limits, read from the environment

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Limits applied when decoding or encoding condition payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Largest serialized payload accepted or produced, in bytes
    pub max_payload_bytes: usize,
    /// Deepest combinator nesting accepted while decoding
    pub max_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 64 * 1024,
            max_depth: 32,
        }
    }
}

impl CodecConfig {
    /// Read `TACO_MAX_PAYLOAD_BYTES` and `TACO_MAX_CONDITION_DEPTH`, falling
    /// back to the defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_payload_bytes: env_or("TACO_MAX_PAYLOAD_BYTES", defaults.max_payload_bytes),
            max_depth: env_or("TACO_MAX_CONDITION_DEPTH", defaults.max_depth),
        }
    }
}

/// Settings for the condition evaluator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatorConfig {
    /// Budget for a single leaf execution
    pub leaf_timeout: Duration,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            leaf_timeout: Duration::from_millis(10_000),
        }
    }
}

impl EvaluatorConfig {
    /// Read `TACO_LEAF_TIMEOUT_MS`, falling back to the default
    pub fn from_env() -> Self {
        let default_ms = Self::default().leaf_timeout.as_millis() as u64;
        Self {
            leaf_timeout: Duration::from_millis(env_or("TACO_LEAF_TIMEOUT_MS", default_ms)),
        }
    }
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("Ignoring invalid value '{}' for {}", raw, key);
                default
            }
        },
        Err(_) => default,
    }
}
