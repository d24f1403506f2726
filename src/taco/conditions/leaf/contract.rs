// SPDX-License-Identifier: MIT

use crate::sdk::error::ConditionError;
use crate::taco::conditions::abi::{FunctionAbi, StandardContractType};
use crate::taco::conditions::schema::{
    self, construct_from_props, field_path, is_eth_address, ConditionSchema, Decoder,
};
use crate::taco::conditions::types::{ConditionType, ReturnValueTest};

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContractProps {
    pub chain: u64,
    pub method: String,
    pub parameters: Vec<Value>,
    pub return_value_test: ReturnValueTest,
    pub contract_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_contract_type: Option<StandardContractType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_abi: Option<FunctionAbi>,
}

/// Calls a read-only contract method and tests its result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ContractCondition {
    props: ContractProps,
}

impl ContractCondition {
    pub fn new(props: ContractProps) -> Result<Self, ConditionError> {
        construct_from_props(&props)
    }

    pub(crate) fn resolved(props: ContractProps) -> Self {
        Self { props }
    }

    pub fn props(&self) -> &ContractProps {
        &self.props
    }

    /// The function fragment to call: the explicit ABI, or the standard's entry.
    ///
    /// Always present for a validated condition.
    pub fn resolved_abi(&self) -> Option<&FunctionAbi> {
        match (&self.props.function_abi, self.props.standard_contract_type) {
            (Some(abi), _) => Some(abi),
            (None, Some(standard)) => standard.function(&self.props.method),
            (None, None) => None,
        }
    }
}

impl ConditionSchema for ContractCondition {
    const CONDITION_TYPE: ConditionType = ConditionType::Contract;

    fn decode(cx: &mut Decoder<'_>, obj: &Map<String, Value>, path: &str) -> Option<Self> {
        let chain = schema::chain(cx, obj, path);
        let method = schema::non_empty_string(cx, obj, path, "method");
        let parameters: Option<Vec<Value>> = cx.required(obj, path, "parameters");
        let return_value_test = schema::return_value_test(cx, obj, path);

        let contract_address: Option<String> = cx.required(obj, path, "contractAddress");
        if let Some(address) = &contract_address {
            if !is_eth_address(address) {
                cx.issue(
                    field_path(path, "contractAddress"),
                    format!("'{}' is not a 0x-prefixed 20-byte hex address", address),
                );
            }
        }

        let standard: Option<StandardContractType> =
            cx.optional(obj, path, "standardContractType");
        let function_abi: Option<FunctionAbi> = cx.optional(obj, path, "functionAbi");

        if let (Some(method), Some(parameters)) = (&method, &parameters) {
            match (standard, &function_abi) {
                (Some(_), Some(_)) => cx.issue(
                    path,
                    "only one of 'standardContractType' or 'functionAbi' may be set",
                ),
                (None, None) if !obj.contains_key("standardContractType")
                    && !obj.contains_key("functionAbi") =>
                {
                    cx.issue(path, "one of 'standardContractType' or 'functionAbi' is required")
                }
                (Some(standard), None) => match standard.function(method) {
                    Some(abi) if abi.inputs.len() != parameters.len() => cx.issue(
                        field_path(path, "parameters"),
                        format!(
                            "{} takes {} parameters, got {}",
                            abi.signature(),
                            abi.inputs.len(),
                            parameters.len()
                        ),
                    ),
                    Some(_) => {}
                    None => cx.issue(
                        field_path(path, "method"),
                        format!("'{}' is not a supported {:?} method", method, standard),
                    ),
                },
                (None, Some(abi)) => {
                    for problem in abi.problems(method, parameters.len()) {
                        cx.issue(field_path(path, "functionAbi"), problem);
                    }
                }
                // Present but unreadable; already reported
                (None, None) => {}
            }
        }

        Some(Self {
            props: ContractProps {
                chain: chain?,
                method: method?,
                parameters: parameters?,
                return_value_test: return_value_test?,
                contract_address: contract_address?,
                standard_contract_type: standard,
                function_abi,
            },
        })
    }
}
