// SPDX-License-Identifier: MIT

use super::schema::{construct_from_props, ConditionSchema, Decoder};
use super::types::ConditionType;
use super::Condition;
use crate::sdk::error::ConditionError;

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IfThenElseProps {
    pub if_condition: Box<Condition>,
    pub then_condition: Box<Condition>,
    pub else_condition: Box<Condition>,
}

/// Evaluates `then` or `else` depending on `if`; never both
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct IfThenElseCondition {
    props: IfThenElseProps,
}

impl IfThenElseCondition {
    pub fn new(props: IfThenElseProps) -> Result<Self, ConditionError> {
        construct_from_props(&props)
    }

    pub fn branches(
        if_condition: impl Into<Condition>,
        then_condition: impl Into<Condition>,
        else_condition: impl Into<Condition>,
    ) -> Result<Self, ConditionError> {
        Self::new(IfThenElseProps {
            if_condition: Box::new(if_condition.into()),
            then_condition: Box::new(then_condition.into()),
            else_condition: Box::new(else_condition.into()),
        })
    }

    pub(crate) fn resolved(props: IfThenElseProps) -> Self {
        Self { props }
    }

    pub fn props(&self) -> &IfThenElseProps {
        &self.props
    }

    pub fn if_condition(&self) -> &Condition {
        &self.props.if_condition
    }

    pub fn then_condition(&self) -> &Condition {
        &self.props.then_condition
    }

    pub fn else_condition(&self) -> &Condition {
        &self.props.else_condition
    }
}

impl ConditionSchema for IfThenElseCondition {
    const CONDITION_TYPE: ConditionType = ConditionType::IfThenElse;

    fn decode(cx: &mut Decoder<'_>, obj: &Map<String, Value>, path: &str) -> Option<Self> {
        let if_condition = cx.child(obj, path, "ifCondition");
        let then_condition = cx.child(obj, path, "thenCondition");
        let else_condition = cx.child(obj, path, "elseCondition");

        Some(Self {
            props: IfThenElseProps {
                if_condition: Box::new(if_condition?),
                then_condition: Box::new(then_condition?),
                else_condition: Box::new(else_condition?),
            },
        })
    }
}
