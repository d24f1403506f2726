// SPDX-License-Identifier: MIT

use crate::sdk::error::ConditionError;
use crate::taco::conditions::schema::{
    self, construct_from_props, field_path, ConditionSchema, Decoder,
};
use crate::taco::conditions::types::ConditionType;
use crate::taco::context::params::JWT_TOKEN_PARAM;

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JwtProps {
    /// Context parameter carrying the token; `:jwtToken` when omitted
    pub jwt_token: String,
    /// PEM-encoded verification key
    pub public_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_subject: Option<String>,
}

/// Verifies a JSON Web Token and optionally its issuer and subject
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct JwtCondition {
    props: JwtProps,
}

impl JwtCondition {
    pub fn new(props: JwtProps) -> Result<Self, ConditionError> {
        construct_from_props(&props)
    }

    /// A condition reading the token from `:jwtToken`
    pub fn with_public_key(public_key: &str) -> Result<Self, ConditionError> {
        Self::new(JwtProps {
            jwt_token: JWT_TOKEN_PARAM.to_string(),
            public_key: public_key.to_string(),
            expected_issuer: None,
            expected_subject: None,
        })
    }

    pub(crate) fn resolved(props: JwtProps) -> Self {
        Self { props }
    }

    pub fn props(&self) -> &JwtProps {
        &self.props
    }
}

impl ConditionSchema for JwtCondition {
    const CONDITION_TYPE: ConditionType = ConditionType::Jwt;

    fn decode(cx: &mut Decoder<'_>, obj: &Map<String, Value>, path: &str) -> Option<Self> {
        let jwt_token = schema::optional_context_param(cx, obj, path, "jwtToken")
            .unwrap_or_else(|| JWT_TOKEN_PARAM.to_string());

        let public_key = schema::non_empty_string(cx, obj, path, "publicKey");
        if let Some(key) = &public_key {
            if !is_pem(key) {
                cx.issue(
                    field_path(path, "publicKey"),
                    "must be a PEM-encoded public key",
                );
            }
        }

        let expected_issuer: Option<String> = cx.optional(obj, path, "expectedIssuer");
        let expected_subject: Option<String> = cx.optional(obj, path, "expectedSubject");

        Some(Self {
            props: JwtProps {
                jwt_token,
                public_key: public_key?,
                expected_issuer,
                expected_subject,
            },
        })
    }
}

fn is_pem(key: &str) -> bool {
    let key = key.trim();
    key.starts_with("-----BEGIN ") && key.ends_with("-----") && key.contains("-----END ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taco::conditions::schema::construct;
    use crate::taco::config::CodecConfig;
    use serde_json::json;

    const PUBLIC_KEY: &str = concat!(
        "-----BEGIN PUBLIC KEY-----\n",
        "MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAE\n",
        "-----END PUBLIC KEY-----"
    );

    #[test]
    fn test_token_defaults() {
        let raw = json!({"publicKey": PUBLIC_KEY, "expectedIssuer": "auth.example.com"});
        let condition = construct::<JwtCondition>(&raw, &CodecConfig::default()).unwrap();
        assert_eq!(condition.props().jwt_token, ":jwtToken");
        assert_eq!(
            condition.props().expected_issuer.as_deref(),
            Some("auth.example.com")
        );
    }

    #[test]
    fn test_rejects_literal_token_and_bad_key() {
        let raw = json!({"jwtToken": "eyJhbGciOi", "publicKey": "abc"});
        let err = construct::<JwtCondition>(&raw, &CodecConfig::default()).unwrap_err();
        let report = err.report().unwrap();
        assert!(report.has_path("$.jwtToken"));
        assert!(report.has_path("$.publicKey"));
    }

    #[test]
    fn test_with_public_key() {
        let condition = JwtCondition::with_public_key(PUBLIC_KEY).unwrap();
        let wire = serde_json::to_value(&condition).unwrap();
        assert_eq!(wire["jwtToken"], json!(":jwtToken"));
        assert!(wire.get("expectedSubject").is_none());
    }
}
