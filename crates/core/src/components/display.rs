use crate::domain::scores::{ScoreMap, DEFAULT_SCORE};
use crate::domain::submission::ScoreControl;
use tracing::warn;

/// Sets the shown value of a row's selection controls from the score map
/// the row was rendered with
pub struct ScoreDisplay;

impl ScoreDisplay {
    /// Initialize every control in scope.
    ///
    /// Untagged controls and controls without a score show the default. A
    /// score map that fails to parse puts every control at the default; the
    /// error is logged and never surfaced.
    pub fn initialize(controls: &mut [ScoreControl], score_json: &str) {
        let scores = match ScoreMap::parse(score_json) {
            Ok(scores) => scores,
            Err(e) => {
                warn!("Ignoring unreadable score map ({}); showing defaults", e);
                ScoreMap::new()
            }
        };

        for control in controls.iter_mut() {
            control.value = match &control.field_id {
                Some(form_id) => scores.display_value(form_id),
                None => DEFAULT_SCORE.to_string(),
            };
        }
    }
}
