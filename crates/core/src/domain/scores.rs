use crate::error::{CoreError, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Value shown by a score control that has no score
pub const DEFAULT_SCORE: &str = "0";

/// Form identifier -> score, parsed once from the serialized mapping a row
/// was rendered with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreMap {
    entries: BTreeMap<String, Option<u32>>,
}

impl ScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a serialized score mapping.
    ///
    /// Values may be non-negative integers, numeric strings or `null`; any
    /// other value is kept as an absent score. Input that is not a JSON
    /// object is an error.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(raw).map_err(|source| CoreError::MalformedScoreMap { source })?;

        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(CoreError::ScoreMapNotObject {
                    found: value_kind(&other),
                })
            }
        };

        let entries = object
            .into_iter()
            .map(|(id, value)| {
                let score = score_from_value(&value);
                if score.is_none() && !value.is_null() {
                    debug!("Score for {} is not a non-negative integer: {}", id, value);
                }
                (id, score)
            })
            .collect();

        Ok(Self { entries })
    }

    /// Score for `id`, if present and not null
    pub fn get(&self, id: &str) -> Option<u32> {
        self.entries.get(id).copied().flatten()
    }

    /// Text a selection control should show for `id`
    pub fn display_value(&self, id: &str) -> String {
        self.get(id)
            .map(|score| score.to_string())
            .unwrap_or_else(|| DEFAULT_SCORE.to_string())
    }

    pub fn total(&self) -> u64 {
        self.entries.values().flatten().map(|score| u64::from(*score)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<u32>)> {
        self.entries.iter().map(|(id, score)| (id.as_str(), *score))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn score_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse::<u32>().ok(),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
