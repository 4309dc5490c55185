use crate::domain::events::SubmissionEnvelope;
use anyhow::Result;
use std::collections::HashMap;

/// Persistence for submitted scores, keyed by event row id
pub trait ScoreStore: Send + Sync {
    /// Every stored score map, serialized as it will be rendered into a row
    fn load_all(&self) -> Result<HashMap<String, String>>;

    /// Serialized score map of one row, if any scores were submitted
    fn scores_for(&self, event_id: &str) -> Result<Option<String>> {
        Ok(self.load_all()?.remove(event_id))
    }

    /// Replace the scores of `envelope.event_id`
    fn set_scores(&self, envelope: &SubmissionEnvelope) -> Result<()>;
}
