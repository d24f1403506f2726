// SPDX-License-Identifier: MIT

use crate::sdk::error::ConditionError;
use crate::taco::conditions::schema::{
    self, construct_from_props, field_path, index_path, is_eth_address, ConditionSchema, Decoder,
};
use crate::taco::conditions::types::{ConditionType, ReturnValueTest};
use crate::taco::context::params::is_context_param;

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};

/// RPC methods a condition may call
pub const RPC_METHODS: [&str; 1] = ["eth_getBalance"];

/// Block identifiers accepted as the optional second `eth_getBalance` parameter
const BLOCK_TAGS: [&str; 5] = ["latest", "earliest", "pending", "safe", "finalized"];

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RpcProps {
    pub chain: u64,
    pub method: String,
    pub parameters: Vec<Value>,
    pub return_value_test: ReturnValueTest,
}

/// Reads chain state through a JSON-RPC method of the node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RpcCondition {
    props: RpcProps,
}

impl RpcCondition {
    pub fn new(props: RpcProps) -> Result<Self, ConditionError> {
        construct_from_props(&props)
    }

    /// `eth_getBalance` of `address` (a literal or a context parameter)
    pub fn get_balance(
        chain: u64,
        address: &str,
        return_value_test: ReturnValueTest,
    ) -> Result<Self, ConditionError> {
        Self::new(RpcProps {
            chain,
            method: "eth_getBalance".to_string(),
            parameters: vec![Value::String(address.to_string()), Value::from("latest")],
            return_value_test,
        })
    }

    pub(crate) fn resolved(props: RpcProps) -> Self {
        Self { props }
    }

    pub fn props(&self) -> &RpcProps {
        &self.props
    }
}

impl ConditionSchema for RpcCondition {
    const CONDITION_TYPE: ConditionType = ConditionType::Rpc;

    fn decode(cx: &mut Decoder<'_>, obj: &Map<String, Value>, path: &str) -> Option<Self> {
        let chain = schema::chain(cx, obj, path);

        let method: Option<String> = cx.required(obj, path, "method");
        if let Some(method) = &method {
            if !RPC_METHODS.contains(&method.as_str()) {
                cx.issue(
                    field_path(path, "method"),
                    format!(
                        "'{}' is not a supported RPC method, expected one of {}",
                        method,
                        RPC_METHODS.join(", ")
                    ),
                );
            }
        }

        let parameters: Option<Vec<Value>> = cx.required(obj, path, "parameters");
        if let Some(parameters) = &parameters {
            check_balance_parameters(cx, parameters, &field_path(path, "parameters"));
        }

        let return_value_test = schema::return_value_test(cx, obj, path);

        Some(Self {
            props: RpcProps {
                chain: chain?,
                method: method?,
                parameters: parameters?,
                return_value_test: return_value_test?,
            },
        })
    }
}

fn check_balance_parameters(cx: &mut Decoder<'_>, parameters: &[Value], path: &str) {
    if parameters.is_empty() || parameters.len() > 2 {
        cx.issue(
            path,
            format!(
                "expects an address and an optional block identifier, got {} parameters",
                parameters.len()
            ),
        );
        return;
    }

    let address = &parameters[0];
    let valid_address =
        is_context_param(address) || address.as_str().is_some_and(is_eth_address);
    if !valid_address {
        cx.issue(
            index_path(path, 0),
            format!("must be an address or context parameter, got {}", address),
        );
    }

    if let Some(block) = parameters.get(1) {
        let valid_block = is_context_param(block)
            || block.as_str().is_some_and(|tag| {
                BLOCK_TAGS.contains(&tag)
                    || tag.strip_prefix("0x").is_some_and(|hex| {
                        !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit())
                    })
            });
        if !valid_block {
            cx.issue(
                index_path(path, 1),
                format!("must be a block tag or hex block number, got {}", block),
            );
        }
    }
}
