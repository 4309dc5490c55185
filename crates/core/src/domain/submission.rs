use super::events::SubmissionEnvelope;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Key used for a field whose identifier cannot be derived
pub const UNDEFINED_FIELD_KEY: &str = "undefined";

/// A selection control / field target inside a mounting scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreControl {
    /// Element id, e.g. `year7-boys-sprint-red`
    pub element_id: String,

    /// Explicit identifier of the form this control scores
    pub field_id: Option<String>,

    /// Current textual value
    pub value: String,
}

impl ScoreControl {
    /// A control carrying its identifier explicitly
    pub fn tagged(element_id: impl Into<String>, field_id: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            field_id: Some(field_id.into()),
            value: String::new(),
        }
    }

    /// A control whose identifier is only recoverable from its element id
    pub fn untagged(element_id: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            field_id: None,
            value: String::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Field identifier: the explicit tag, or the 4th `-`/`:` segment of the
    /// element id when the control is untagged
    pub fn identifier(&self) -> Option<&str> {
        self.field_id
            .as_deref()
            .or_else(|| structural_identifier(&self.element_id))
    }
}

/// 4th `-`/`:`-delimited segment of an element id
pub fn structural_identifier(element_id: &str) -> Option<&str> {
    element_id.split(['-', ':']).nth(3)
}

impl SubmissionEnvelope {
    /// Build the envelope for `event_id` from every control in scope
    pub fn collect(event_id: impl Into<String>, controls: &[ScoreControl]) -> Self {
        let event_id = event_id.into();
        let mut scores = BTreeMap::new();

        for control in controls {
            let key = match control.identifier() {
                Some(id) => id.to_string(),
                None => {
                    warn!(
                        "Control {} in {} has no field identifier; submitting under '{}'",
                        control.element_id, event_id, UNDEFINED_FIELD_KEY
                    );
                    UNDEFINED_FIELD_KEY.to_string()
                }
            };

            if let Some(previous) = scores.insert(key.clone(), control.value.clone()) {
                debug!(
                    "Duplicate field {} in {}: '{}' overwritten by '{}'",
                    key, event_id, previous, control.value
                );
            }
        }

        Self { event_id, scores }
    }
}
