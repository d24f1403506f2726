// SPDX-License-Identifier: MIT

use crate::sdk::error::ConditionError;
use crate::taco::conditions::schema::{self, construct_from_props, ConditionSchema, Decoder};
use crate::taco::conditions::types::{ConditionType, ReturnValueTest};

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JsonApiProps {
    /// https URL fetched with GET
    pub endpoint: String,
    /// Query-string parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
    /// Selects the tested value from the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Context parameter holding a bearer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_token: Option<String>,
    pub return_value_test: ReturnValueTest,
}

/// Fetches a JSON document over https and tests a value inside it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct JsonApiCondition {
    props: JsonApiProps,
}

impl JsonApiCondition {
    pub fn new(props: JsonApiProps) -> Result<Self, ConditionError> {
        construct_from_props(&props)
    }

    pub(crate) fn resolved(props: JsonApiProps) -> Self {
        Self { props }
    }

    pub fn props(&self) -> &JsonApiProps {
        &self.props
    }
}

impl ConditionSchema for JsonApiCondition {
    const CONDITION_TYPE: ConditionType = ConditionType::JsonApi;

    fn decode(cx: &mut Decoder<'_>, obj: &Map<String, Value>, path: &str) -> Option<Self> {
        let endpoint = schema::https_endpoint(cx, obj, path);
        let parameters: Option<Map<String, Value>> = cx.optional(obj, path, "parameters");
        let query = schema::optional_query(cx, obj, path);
        let authorization_token =
            schema::optional_context_param(cx, obj, path, "authorizationToken");
        let return_value_test = schema::return_value_test(cx, obj, path);

        Some(Self {
            props: JsonApiProps {
                endpoint: endpoint?,
                parameters,
                query,
                authorization_token,
                return_value_test: return_value_test?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taco::conditions::schema::construct;
    use crate::taco::config::CodecConfig;
    use serde_json::json;

    #[test]
    fn test_valid_api_condition() {
        let raw = json!({
            "conditionType": "json-api",
            "endpoint": "https://api.coingecko.com/api/v3/simple/price",
            "parameters": {"ids": "ethereum", "vs_currencies": "usd"},
            "query": "$.ethereum.usd",
            "authorizationToken": ":authToken",
            "returnValueTest": {"comparator": ">", "value": 1000}
        });
        let condition = construct::<JsonApiCondition>(&raw, &CodecConfig::default()).unwrap();
        assert_eq!(condition.props().query.as_deref(), Some("$.ethereum.usd"));
        assert_eq!(serde_json::to_value(&condition).unwrap(), {
            let mut expected = raw.clone();
            expected.as_object_mut().unwrap().remove("conditionType");
            expected
        });
    }

    #[test]
    fn test_rejects_http_and_bad_fields() {
        let raw = json!({
            "endpoint": "http://api.example.com/data",
            "parameters": ["not", "an", "object"],
            "query": "$.",
            "authorizationToken": "Bearer abc",
            "returnValueTest": {"comparator": "==", "value": true}
        });
        let err = construct::<JsonApiCondition>(&raw, &CodecConfig::default()).unwrap_err();
        let report = err.report().unwrap();
        for path in ["$.endpoint", "$.parameters", "$.query", "$.authorizationToken"] {
            assert!(report.has_path(path), "missing issue at {}", path);
        }
    }
}
