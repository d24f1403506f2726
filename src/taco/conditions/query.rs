// SPDX-License-Identifier: MIT

//! Path queries applied to JSON responses
//!
//! Supports a small JSONPath subset:
//! - `$.data.price`
//! - `$.items[0].owner`
//! - `$['odd key'].value`
//! - `$.items[*].owner` (collects every match into an array)
//! - `data.price` (leading `$` is optional)

use serde_json::Value;
use std::fmt;

/// One step of a query
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Key(String),
    Index(usize),
    Wildcard,
}

/// A parsed query expression
#[derive(Debug, Clone, PartialEq)]
pub struct JsonQuery {
    raw: String,
    segments: Vec<Segment>,
}

impl JsonQuery {
    /// Parse a query string into segments
    pub fn parse(input: &str) -> Result<Self, String> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err("query must not be empty".to_string());
        }

        let chars: Vec<char> = raw.chars().collect();
        let mut segments = Vec::new();

        let mut i = if chars[0] == '$' {
            1
        } else {
            // Bare leading key
            let (key, next) = read_key(&chars, 0);
            if key.is_empty() {
                return Err(format!("query must start with '$' or a key: {}", raw));
            }
            segments.push(Segment::Key(key));
            next
        };

        while i < chars.len() {
            match chars[i] {
                '.' => {
                    let (key, next) = read_key(&chars, i + 1);
                    if key.is_empty() {
                        return Err(format!("empty key at position {} in '{}'", i + 1, raw));
                    }
                    segments.push(Segment::Key(key));
                    i = next;
                }
                '[' => {
                    let close = chars[i..]
                        .iter()
                        .position(|c| *c == ']')
                        .map(|p| p + i)
                        .ok_or_else(|| format!("unclosed '[' in '{}'", raw))?;
                    let inner: String = chars[i + 1..close].iter().collect();
                    segments.push(parse_bracket(inner.trim(), raw)?);
                    i = close + 1;
                }
                c => return Err(format!("unexpected '{}' at position {} in '{}'", c, i, raw)),
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments.contains(&Segment::Wildcard)
    }

    /// Walk `value` along the query; `None` when nothing matches.
    ///
    /// A query with a wildcard yields an array of every match, in document
    /// order.
    pub fn select(&self, value: &Value) -> Option<Value> {
        let mut current = vec![value];
        for segment in &self.segments {
            current = current
                .into_iter()
                .flat_map(|v| step(v, segment))
                .collect();
            if current.is_empty() {
                return None;
            }
        }

        if self.has_wildcard() {
            Some(Value::Array(current.into_iter().cloned().collect()))
        } else {
            current.first().map(|v| (*v).clone())
        }
    }
}

impl fmt::Display for JsonQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn step<'v>(value: &'v Value, segment: &Segment) -> Vec<&'v Value> {
    match segment {
        Segment::Key(key) => value.get(key.as_str()).into_iter().collect(),
        Segment::Index(index) => value
            .as_array()
            .and_then(|items| items.get(*index))
            .into_iter()
            .collect(),
        Segment::Wildcard => match value {
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => map.values().collect(),
            _ => Vec::new(),
        },
    }
}

fn read_key(chars: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len() && chars[end] != '.' && chars[end] != '[' {
        end += 1;
    }
    (chars[start..end].iter().collect(), end)
}

fn parse_bracket(inner: &str, raw: &str) -> Result<Segment, String> {
    let quoted = (inner.starts_with('\'') && inner.ends_with('\''))
        || (inner.starts_with('"') && inner.ends_with('"'));
    if quoted && inner.len() >= 2 {
        return Ok(Segment::Key(inner[1..inner.len() - 1].to_string()));
    }
    if inner == "*" {
        return Ok(Segment::Wildcard);
    }
    inner
        .parse::<usize>()
        .map(Segment::Index)
        .map_err(|_| format!("invalid index '{}' in '{}'", inner, raw))
}
