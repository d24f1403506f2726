// SPDX-License-Identifier: MIT

use super::schema::{construct_from_props, field_path, index_path, ConditionSchema, Decoder};
use super::types::{CompoundOperator, ConditionType};
use super::Condition;
use crate::sdk::error::ConditionError;

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompoundProps {
    pub operator: CompoundOperator,
    pub operands: Vec<Condition>,
}

/// Boolean combination of child conditions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CompoundCondition {
    props: CompoundProps,
}

impl CompoundCondition {
    pub fn new(props: CompoundProps) -> Result<Self, ConditionError> {
        construct_from_props(&props)
    }

    pub fn and(operands: Vec<Condition>) -> Result<Self, ConditionError> {
        Self::new(CompoundProps {
            operator: CompoundOperator::And,
            operands,
        })
    }

    pub fn or(operands: Vec<Condition>) -> Result<Self, ConditionError> {
        Self::new(CompoundProps {
            operator: CompoundOperator::Or,
            operands,
        })
    }

    pub fn not(operand: Condition) -> Result<Self, ConditionError> {
        Self::new(CompoundProps {
            operator: CompoundOperator::Not,
            operands: vec![operand],
        })
    }

    pub(crate) fn resolved(props: CompoundProps) -> Self {
        Self { props }
    }

    pub fn props(&self) -> &CompoundProps {
        &self.props
    }

    pub fn operator(&self) -> CompoundOperator {
        self.props.operator
    }

    pub fn operands(&self) -> &[Condition] {
        &self.props.operands
    }
}

impl ConditionSchema for CompoundCondition {
    const CONDITION_TYPE: ConditionType = ConditionType::Compound;

    fn decode(cx: &mut Decoder<'_>, obj: &Map<String, Value>, path: &str) -> Option<Self> {
        let operator: Option<CompoundOperator> = cx.required(obj, path, "operator");

        let operands_path = field_path(path, "operands");
        let raw_operands = match obj.get("operands") {
            Some(Value::Array(items)) => Some(items),
            Some(other) => {
                cx.issue(&operands_path, format!("must be an array, got {}", other));
                None
            }
            None => {
                cx.issue(&operands_path, "is required");
                None
            }
        };

        let mut operands = Vec::new();
        if let Some(items) = raw_operands {
            for (i, raw) in items.iter().enumerate() {
                if let Some(operand) = cx.condition(raw, &index_path(&operands_path, i)) {
                    operands.push(operand);
                }
            }

            if let Some(operator) = operator {
                check_arity(cx, operator, items.len(), &operands_path);
            }
        }

        Some(Self {
            props: CompoundProps {
                operator: operator?,
                operands,
            },
        })
    }
}

fn check_arity(cx: &mut Decoder<'_>, operator: CompoundOperator, count: usize, path: &str) {
    match operator {
        CompoundOperator::Not if count != 1 => cx.violation(
            path,
            format!("'not' takes exactly one operand, got {}", count),
        ),
        CompoundOperator::And | CompoundOperator::Or if count < 2 => cx.violation(
            path,
            format!("'{}' takes at least two operands, got {}", operator, count),
        ),
        _ => {}
    }
}
