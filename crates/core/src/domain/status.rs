use serde::{Deserialize, Serialize};

/// Lifecycle of a score submission as reflected in the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Completed,
}

impl SubmissionStatus {
    /// A local submit: any state becomes pending
    pub fn begin(&mut self) {
        *self = SubmissionStatus::Pending;
    }

    /// A completion signal: pending becomes completed, completed stays.
    /// Returns whether a transition happened.
    pub fn complete(&mut self) -> bool {
        match self {
            SubmissionStatus::Pending => {
                *self = SubmissionStatus::Completed;
                true
            }
            SubmissionStatus::Completed => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SubmissionStatus::Pending)
    }
}

/// Colour cue shown by a form's status indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCue {
    Pending,
    Confirmed,
}

impl From<SubmissionStatus> for StatusCue {
    fn from(status: SubmissionStatus) -> Self {
        match status {
            SubmissionStatus::Pending => StatusCue::Pending,
            SubmissionStatus::Completed => StatusCue::Confirmed,
        }
    }
}

/// The status-indicating control of a score entry form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusIndicator {
    pub cue: StatusCue,
}

impl StatusIndicator {
    pub fn new(cue: StatusCue) -> Self {
        Self { cue }
    }
}
