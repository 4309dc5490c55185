use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Names under which events are published on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventName {
    /// A score entry form submitted its fields
    Submission,

    /// The backend acknowledged a submission
    Completion,

    /// A pre-rendered fragment for the status banner
    StatusUpdate,

    /// The filter coordinator asks for navigation to a new query
    Redirect,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::Submission => "score:submit",
            EventName::Completion => "score:complete",
            EventName::StatusUpdate => "status:update",
            EventName::Redirect => "filter:redirect",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload built from a score entry form's fields on submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionEnvelope {
    /// Identifier of the submitting form (the event row id)
    pub event_id: String,

    /// Field identifier -> textual field value
    pub scores: BTreeMap<String, String>,
}

/// Backend acknowledgement of a submission.
///
/// An un-keyed signal (`event_id: None`) completes every pending form on the
/// page. A keyed signal only completes the form with the matching id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSignal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl CompletionSignal {
    pub fn any() -> Self {
        Self { event_id: None }
    }

    pub fn for_event(event_id: impl Into<String>) -> Self {
        Self {
            event_id: Some(event_id.into()),
        }
    }

    /// Whether a form with `form_id` should react to this signal
    pub fn applies_to(&self, form_id: &str) -> bool {
        match &self.event_id {
            None => true,
            Some(id) => id == form_id,
        }
    }
}

/// Content fragment that replaces the status banner verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFragment {
    pub html: String,
}

/// Navigation intent produced by the filter coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRequest {
    /// Resulting query string, including the leading `?`
    pub query: String,
}

/// Events delivered on the page bus
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Submission(SubmissionEnvelope),
    Completion(CompletionSignal),
    StatusUpdate(StatusFragment),
    Redirect(RedirectRequest),
}

impl Event {
    pub fn name(&self) -> EventName {
        match self {
            Event::Submission(_) => EventName::Submission,
            Event::Completion(_) => EventName::Completion,
            Event::StatusUpdate(_) => EventName::StatusUpdate,
            Event::Redirect(_) => EventName::Redirect,
        }
    }
}

/// Links a payload type to the single event name it travels under
pub trait Payload: Sized + 'static {
    const NAME: EventName;

    fn extract(event: &Event) -> Option<&Self>;
}

macro_rules! payload {
    ($ty:ty, $variant:ident) => {
        impl Payload for $ty {
            const NAME: EventName = EventName::$variant;

            fn extract(event: &Event) -> Option<&Self> {
                match event {
                    Event::$variant(payload) => Some(payload),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Event {
            fn from(payload: $ty) -> Self {
                Event::$variant(payload)
            }
        }
    };
}

payload!(SubmissionEnvelope, Submission);
payload!(CompletionSignal, Completion);
payload!(StatusFragment, StatusUpdate);
payload!(RedirectRequest, Redirect);
