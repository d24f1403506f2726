// SPDX-License-Identifier: MIT

//! Contract ABI fragments and the standard-contract shorthand tables

use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single input or output of a function fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AbiParameter {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_type: Option<String>,
}

impl AbiParameter {
    pub fn new(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            internal_type: None,
        }
    }
}

/// A function entry of a contract ABI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunctionAbi {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiParameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<AbiParameter>,
    pub state_mutability: String,
}

impl FunctionAbi {
    /// A `view` function fragment
    pub fn view(name: &str, inputs: Vec<AbiParameter>, outputs: Vec<AbiParameter>) -> Self {
        Self {
            kind: "function".to_string(),
            name: name.to_string(),
            inputs,
            outputs,
            state_mutability: "view".to_string(),
        }
    }

    /// Canonical signature, e.g. `balanceOf(address)`
    pub fn signature(&self) -> String {
        let inputs: Vec<&str> = self.inputs.iter().map(|p| p.kind.as_str()).collect();
        format!("{}({})", self.name, inputs.join(","))
    }

    /// Check the fragment against the method name and parameter count it is used with
    pub fn problems(&self, method: &str, parameter_count: usize) -> Vec<String> {
        let mut problems = Vec::new();

        if self.kind != "function" {
            problems.push(format!("type must be 'function', got '{}'", self.kind));
        }
        if self.state_mutability != "view" && self.state_mutability != "pure" {
            problems.push(format!(
                "stateMutability must be 'view' or 'pure', got '{}'",
                self.state_mutability
            ));
        }
        if self.name != method {
            problems.push(format!(
                "name '{}' does not match method '{}'",
                self.name, method
            ));
        }
        if self.inputs.len() != parameter_count {
            problems.push(format!(
                "declares {} inputs but {} parameters were given",
                self.inputs.len(),
                parameter_count
            ));
        }
        for param in self.inputs.iter().chain(&self.outputs) {
            if !is_solidity_type(&param.kind) {
                problems.push(format!("'{}' is not a valid Solidity type", param.kind));
            }
        }

        problems
    }
}

/// Well-known token standards usable instead of a full ABI fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum StandardContractType {
    ERC20,
    ERC721,
}

impl StandardContractType {
    /// Functions of the standard that conditions may call
    pub fn functions(&self) -> &'static [FunctionAbi] {
        match self {
            StandardContractType::ERC20 => ERC20_FUNCTIONS.as_slice(),
            StandardContractType::ERC721 => ERC721_FUNCTIONS.as_slice(),
        }
    }

    pub fn function(&self, method: &str) -> Option<&'static FunctionAbi> {
        self.functions().iter().find(|f| f.name == method)
    }
}

static ERC20_FUNCTIONS: Lazy<Vec<FunctionAbi>> = Lazy::new(|| {
    vec![
        FunctionAbi::view(
            "balanceOf",
            vec![AbiParameter::new("account", "address")],
            vec![AbiParameter::new("", "uint256")],
        ),
        FunctionAbi::view("totalSupply", vec![], vec![AbiParameter::new("", "uint256")]),
        FunctionAbi::view(
            "allowance",
            vec![
                AbiParameter::new("owner", "address"),
                AbiParameter::new("spender", "address"),
            ],
            vec![AbiParameter::new("", "uint256")],
        ),
    ]
});

static ERC721_FUNCTIONS: Lazy<Vec<FunctionAbi>> = Lazy::new(|| {
    vec![
        FunctionAbi::view(
            "balanceOf",
            vec![AbiParameter::new("owner", "address")],
            vec![AbiParameter::new("balance", "uint256")],
        ),
        FunctionAbi::view(
            "ownerOf",
            vec![AbiParameter::new("tokenId", "uint256")],
            vec![AbiParameter::new("owner", "address")],
        ),
        FunctionAbi::view(
            "getApproved",
            vec![AbiParameter::new("tokenId", "uint256")],
            vec![AbiParameter::new("operator", "address")],
        ),
    ]
});

/// Accepts elementary Solidity types, optionally as fixed or dynamic arrays
pub fn is_solidity_type(kind: &str) -> bool {
    let mut base = kind;
    while let Some(stripped) = base.strip_suffix(']') {
        let Some(open) = stripped.rfind('[') else {
            return false;
        };
        let size = &stripped[open + 1..];
        if !size.is_empty() && !size.parse::<usize>().is_ok_and(|n| n > 0) {
            return false;
        }
        base = &stripped[..open];
    }

    match base {
        "address" | "bool" | "string" | "bytes" | "tuple" | "function" => true,
        _ => {
            if let Some(bits) = base.strip_prefix("uint").or_else(|| base.strip_prefix("int")) {
                bits.is_empty()
                    || bits
                        .parse::<u16>()
                        .is_ok_and(|n| n > 0 && n <= 256 && n % 8 == 0)
            } else if let Some(len) = base.strip_prefix("bytes") {
                len.parse::<u8>().is_ok_and(|n| (1..=32).contains(&n))
            } else {
                false
            }
        }
    }
}
