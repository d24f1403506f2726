// SPDX-License-Identifier: MIT

use crate::sdk::error::ConditionError;
use crate::taco::conditions::schema::{
    self, construct_from_props, field_path, ConditionSchema, Decoder,
};
use crate::taco::conditions::types::{Comparator, ConditionType, ReturnValueTest};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};

/// The only method a time condition supports
pub const BLOCKTIME_METHOD: &str = "blocktime";

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeProps {
    pub chain: u64,
    /// Always `blocktime`; filled in when omitted
    pub method: String,
    pub return_value_test: ReturnValueTest,
}

/// Compares the latest block timestamp of a chain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TimeCondition {
    props: TimeProps,
}

impl TimeCondition {
    pub fn new(props: TimeProps) -> Result<Self, ConditionError> {
        construct_from_props(&props)
    }

    /// Passes once the block time reaches `at`
    pub fn after(chain: u64, at: DateTime<Utc>) -> Result<Self, ConditionError> {
        Self::blocktime(chain, ReturnValueTest::new(Comparator::Gte, at.timestamp()))
    }

    /// Passes while the block time is earlier than `at`
    pub fn before(chain: u64, at: DateTime<Utc>) -> Result<Self, ConditionError> {
        Self::blocktime(chain, ReturnValueTest::new(Comparator::Lt, at.timestamp()))
    }

    pub fn blocktime(
        chain: u64,
        return_value_test: ReturnValueTest,
    ) -> Result<Self, ConditionError> {
        Self::new(TimeProps {
            chain,
            method: BLOCKTIME_METHOD.to_string(),
            return_value_test,
        })
    }

    pub(crate) fn resolved(props: TimeProps) -> Self {
        Self { props }
    }

    pub fn props(&self) -> &TimeProps {
        &self.props
    }
}

impl ConditionSchema for TimeCondition {
    const CONDITION_TYPE: ConditionType = ConditionType::Time;

    fn decode(cx: &mut Decoder<'_>, obj: &Map<String, Value>, path: &str) -> Option<Self> {
        let chain = schema::chain(cx, obj, path);

        let method = cx
            .optional::<String>(obj, path, "method")
            .unwrap_or_else(|| BLOCKTIME_METHOD.to_string());
        if method != BLOCKTIME_METHOD {
            cx.issue(
                field_path(path, "method"),
                format!("must be '{}', got '{}'", BLOCKTIME_METHOD, method),
            );
        }

        let return_value_test = schema::return_value_test(cx, obj, path);

        Some(Self {
            props: TimeProps {
                chain: chain?,
                method,
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
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_method_defaults_to_blocktime() {
        let raw = json!({
            "chain": 1,
            "returnValueTest": {"comparator": ">", "value": 100}
        });
        let condition = construct::<TimeCondition>(&raw, &CodecConfig::default()).unwrap();
        assert_eq!(condition.props().method, "blocktime");

        let wire = serde_json::to_value(&condition).unwrap();
        assert_eq!(wire["method"], json!("blocktime"));
    }

    #[test]
    fn test_rejects_other_methods() {
        let raw = json!({
            "chain": 1,
            "method": "timestamp",
            "returnValueTest": {"comparator": ">", "value": 100}
        });
        let err = construct::<TimeCondition>(&raw, &CodecConfig::default()).unwrap_err();
        assert!(err.report().unwrap().has_path("$.method"));
    }

    #[test]
    fn test_after_and_before() {
        let at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let after = TimeCondition::after(1, at).unwrap();
        assert_eq!(after.props().return_value_test.comparator, Comparator::Gte);
        assert_eq!(after.props().return_value_test.value, json!(1893456000));

        let before = TimeCondition::before(1, at).unwrap();
        assert_eq!(before.props().return_value_test.comparator, Comparator::Lt);
    }
}
