// SPDX-License-Identifier: MIT

//! Return value test evaluation
//!
//! Ordering comparators coerce both sides to numbers: JSON numbers, decimal
//! strings and `0x` hex strings (chain calls usually report big integers as
//! strings). Equality is structural, with numbers compared by value.

use super::types::{Comparator, ReturnValueTest};
use crate::sdk::error::ConditionError;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};
use serde_json::Value;
use std::cmp::Ordering;

/// A value coerced for numeric comparison.
///
/// Integers are arbitrary precision so uint256 results compare exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum Numeric {
    Int(BigInt),
    Float(f64),
}

impl Numeric {
    fn compare(&self, other: &Numeric) -> Option<Ordering> {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => Some(a.cmp(b)),
            (Numeric::Int(a), Numeric::Float(b)) => compare_mixed(a, *b),
            (Numeric::Float(a), Numeric::Int(b)) => compare_mixed(b, *a).map(Ordering::reverse),
            (Numeric::Float(a), Numeric::Float(b)) => a.partial_cmp(b),
        }
    }
}

/// Integral floats compare exactly; fractional ones through `f64`
fn compare_mixed(int: &BigInt, float: f64) -> Option<Ordering> {
    if float.fract() == 0.0 {
        BigInt::from_f64(float).map(|f| int.cmp(&f))
    } else {
        int.to_f64()?.partial_cmp(&float)
    }
}

/// Coerce a JSON value to a number, if it has a numeric reading
pub fn as_numeric(value: &Value) -> Option<Numeric> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Numeric::Int(BigInt::from(i)))
            } else if let Some(u) = n.as_u64() {
                Some(Numeric::Int(BigInt::from(u)))
            } else {
                n.as_f64().map(Numeric::Float)
            }
        }
        Value::String(s) => parse_numeral(s),
        _ => None,
    }
}

fn parse_numeral(s: &str) -> Option<Numeric> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        return BigInt::parse_bytes(hex.as_bytes(), 16).map(Numeric::Int);
    }
    if is_integer_literal(s) {
        return s.parse::<BigInt>().ok().map(Numeric::Int);
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Numeric::Float)
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

impl ReturnValueTest {
    /// Test an observed result. `path` names the node for error reporting.
    pub fn test(&self, observed: &Value, path: &str) -> Result<bool, ConditionError> {
        let observed = self.select(observed, path)?;

        match self.comparator {
            Comparator::Eq => Ok(values_equal(observed, &self.value)),
            Comparator::NotEq => Ok(!values_equal(observed, &self.value)),
            Comparator::Gt => self.ordered(observed, path, |o| o == Ordering::Greater),
            Comparator::Gte => self.ordered(observed, path, |o| o != Ordering::Less),
            Comparator::Lt => self.ordered(observed, path, |o| o == Ordering::Less),
            Comparator::Lte => self.ordered(observed, path, |o| o != Ordering::Greater),
        }
    }

    fn ordered(
        &self,
        observed: &Value,
        path: &str,
        accept: fn(Ordering) -> bool,
    ) -> Result<bool, ConditionError> {
        compare_numbers(observed, &self.value)
            .map(accept)
            .ok_or_else(|| {
                ConditionError::comparison(
                    path,
                    format!(
                        "cannot compare {} {} {} numerically",
                        observed, self.comparator, self.value
                    ),
                )
            })
    }

    fn select<'v>(&self, observed: &'v Value, path: &str) -> Result<&'v Value, ConditionError> {
        match self.index {
            None => Ok(observed),
            Some(index) => match observed {
                Value::Array(items) => items.get(index as usize).ok_or_else(|| {
                    ConditionError::comparison(
                        path,
                        format!("index {} out of range for {} results", index, items.len()),
                    )
                }),
                other => Err(ConditionError::comparison(
                    path,
                    format!("index {} requires an array result, got {}", index, other),
                )),
            },
        }
    }
}

fn compare_numbers(left: &Value, right: &Value) -> Option<Ordering> {
    as_numeric(left)?.compare(&as_numeric(right)?)
}

/// Deep structural equality.
///
/// Numbers and numeral strings are equal when their numeric readings are,
/// so `==` agrees with the ordering comparators on the same pair.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(_), Value::Number(_))
        | (Value::Number(_), Value::String(_))
        | (Value::String(_), Value::Number(_)) => numerically_equal(left, right).unwrap_or(false),
        (Value::String(a), Value::String(b)) => {
            numerically_equal(left, right).unwrap_or_else(|| a == b)
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(k, v)| b.get(k).is_some_and(|other| values_equal(v, other)))
        }
        _ => left == right,
    }
}

fn numerically_equal(left: &Value, right: &Value) -> Option<bool> {
    let ordering = as_numeric(left)?.compare(&as_numeric(right)?)?;
    Some(ordering == Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rvt(comparator: Comparator, value: Value) -> ReturnValueTest {
        ReturnValueTest::new(comparator, value)
    }

    #[test]
    fn test_number_comparison() {
        let observed = json!(7.5);
        assert!(rvt(Comparator::Gt, json!(5)).test(&observed, "$").unwrap());
        assert!(!rvt(Comparator::Gt, json!(10)).test(&observed, "$").unwrap());
        assert!(rvt(Comparator::Gte, json!(7.5)).test(&observed, "$").unwrap());
        assert!(rvt(Comparator::Lt, json!(10)).test(&observed, "$").unwrap());
        assert!(rvt(Comparator::Lte, json!(7.5)).test(&observed, "$").unwrap());
        assert!(!rvt(Comparator::Lte, json!(7)).test(&observed, "$").unwrap());
    }

    #[test]
    fn test_big_integer_strings() {
        let balance = json!("1000000000000000000000");
        assert!(rvt(Comparator::Gte, json!("1000000000000000000000"))
            .test(&balance, "$")
            .unwrap());
        assert!(rvt(Comparator::Gt, json!(0)).test(&balance, "$").unwrap());
        assert!(rvt(Comparator::Eq, json!("0x3635c9adc5dea00000"))
            .test(&balance, "$")
            .unwrap());
        assert!(!rvt(Comparator::NotEq, json!("0x3635c9adc5dea00000"))
            .test(&balance, "$")
            .unwrap());
    }

    #[test]
    fn test_uint256_boundary() {
        let max = format!("0x{}", "f".repeat(64));
        assert!(rvt(Comparator::Gt, json!(0)).test(&json!(max), "$").unwrap());
        let max_decimal =
            "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert!(rvt(Comparator::Eq, json!(max_decimal))
            .test(&json!(max), "$")
            .unwrap());

        let above_i128 = json!("100000000000000000000000000000000000000001");
        assert!(rvt(Comparator::Gt, json!("100000000000000000000000000000000000000000"))
            .test(&above_i128, "$")
            .unwrap());
        assert!(!rvt(Comparator::Lte, json!("100000000000000000000000000000000000000000"))
            .test(&above_i128, "$")
            .unwrap());
    }

    #[test]
    fn test_mixed_integer_and_float() {
        assert!(rvt(Comparator::Eq, json!(2.0)).test(&json!("2"), "$").unwrap());
        assert!(rvt(Comparator::Lt, json!(2.5)).test(&json!("0x2"), "$").unwrap());
        assert!(rvt(Comparator::Gt, json!(1.5e20))
            .test(&json!("0x3635c9adc5dea00000"), "$")
            .unwrap());
    }

    #[test]
    fn test_hex_numbers() {
        assert!(rvt(Comparator::Eq, json!(255)).test(&json!("0xff"), "$").unwrap());
        assert!(rvt(Comparator::Eq, json!("255")).test(&json!("0xff"), "$").unwrap());
        assert!(rvt(Comparator::Lt, json!("0x100")).test(&json!(255), "$").unwrap());
        assert!(as_numeric(&json!("0x")).is_none());
        assert!(as_numeric(&json!("0xzz")).is_none());
    }

    #[test]
    fn test_numeric_comparator_rejects_non_numbers() {
        let err = rvt(Comparator::Gt, json!(1))
            .test(&json!("not a number"), "$.operands[0]")
            .unwrap_err();
        assert!(matches!(
            err,
            ConditionError::Comparison { ref path, .. } if path == "$.operands[0]"
        ));

        assert!(rvt(Comparator::Lt, json!(true)).test(&json!(1), "$").is_err());
    }

    #[test]
    fn test_structural_equality() {
        let observed = json!({"owner": "0xabc", "ids": [1, 2.0, 3]});
        assert!(rvt(Comparator::Eq, json!({"ids": [1, 2, 3], "owner": "0xabc"}))
            .test(&observed, "$")
            .unwrap());
        assert!(rvt(Comparator::NotEq, json!({"ids": [1, 2], "owner": "0xabc"}))
            .test(&observed, "$")
            .unwrap());
    }

    #[test]
    fn test_string_and_bool_equality() {
        assert!(rvt(Comparator::Eq, json!("search")).test(&json!("search"), "$").unwrap());
        assert!(!rvt(Comparator::Eq, json!("Search")).test(&json!("search"), "$").unwrap());
        assert!(rvt(Comparator::Eq, json!(true)).test(&json!(true), "$").unwrap());
        assert!(rvt(Comparator::Eq, Value::Null).test(&Value::Null, "$").unwrap());
        assert!(!rvt(Comparator::Eq, json!("true")).test(&json!(true), "$").unwrap());
    }

    #[test]
    fn test_index_selection() {
        let observed = json!([10, 20, 30]);
        let test = rvt(Comparator::Eq, json!(20)).with_index(1);
        assert!(test.test(&observed, "$").unwrap());

        let out_of_range = rvt(Comparator::Eq, json!(20)).with_index(5);
        assert!(out_of_range.test(&observed, "$").is_err());

        let not_array = rvt(Comparator::Eq, json!(20)).with_index(0);
        assert!(not_array.test(&json!(20), "$").is_err());
    }

    #[test]
    fn test_as_numeric() {
        assert_eq!(as_numeric(&json!(3)), Some(Numeric::Int(BigInt::from(3))));
        assert_eq!(as_numeric(&json!("-12")), Some(Numeric::Int(BigInt::from(-12))));
        assert_eq!(as_numeric(&json!("1.5")), Some(Numeric::Float(1.5)));
        assert_eq!(as_numeric(&json!("abc")), None);
        assert_eq!(as_numeric(&json!("NaN")), None);
        assert_eq!(as_numeric(&json!(null)), None);
    }
}
