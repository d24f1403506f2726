// SPDX-License-Identifier: MIT

//! Access-condition expression model for threshold decryption.
//!
//! Conditions are built and validated client-side, shipped as JSON next to
//! the ciphertext, then decoded and re-validated by evaluator nodes.

pub mod sdk;
pub mod taco;
