// SPDX-License-Identifier: MIT

use crate::sdk::error::ConditionError;
use crate::taco::conditions::schema::{
    self, construct_from_props, field_path, ConditionSchema, Decoder,
};
use crate::taco::conditions::types::{ConditionType, ReturnValueTest};

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JsonRpcProps {
    /// https URL of the JSON-RPC 2.0 server
    pub endpoint: String,
    pub method: String,
    /// Positional (array) or named (object) params
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Selects the tested value from the call result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_token: Option<String>,
    pub return_value_test: ReturnValueTest,
}

/// Calls a method on an arbitrary JSON-RPC 2.0 server
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct JsonRpcCondition {
    props: JsonRpcProps,
}

impl JsonRpcCondition {
    pub fn new(props: JsonRpcProps) -> Result<Self, ConditionError> {
        construct_from_props(&props)
    }

    pub(crate) fn resolved(props: JsonRpcProps) -> Self {
        Self { props }
    }

    pub fn props(&self) -> &JsonRpcProps {
        &self.props
    }
}

impl ConditionSchema for JsonRpcCondition {
    const CONDITION_TYPE: ConditionType = ConditionType::JsonRpc;

    fn decode(cx: &mut Decoder<'_>, obj: &Map<String, Value>, path: &str) -> Option<Self> {
        let endpoint = schema::https_endpoint(cx, obj, path);
        let method = schema::non_empty_string(cx, obj, path, "method");

        let params: Option<Value> = cx.optional(obj, path, "params");
        if let Some(params) = &params {
            if !params.is_array() && !params.is_object() {
                cx.issue(
                    field_path(path, "params"),
                    format!("must be an array or an object, got {}", params),
                );
            }
        }

        let query = schema::optional_query(cx, obj, path);
        let authorization_token =
            schema::optional_context_param(cx, obj, path, "authorizationToken");
        let return_value_test = schema::return_value_test(cx, obj, path);

        Some(Self {
            props: JsonRpcProps {
                endpoint: endpoint?,
                method: method?,
                params,
                query,
                authorization_token,
                return_value_test: return_value_test?,
            },
        })
    }
}
