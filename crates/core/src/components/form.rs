use crate::bus::{EventBus, Subscription};
use crate::domain::events::{CompletionSignal, SubmissionEnvelope};
use crate::domain::status::{StatusCue, StatusIndicator, SubmissionStatus};
use crate::domain::submission::ScoreControl;
use crate::error::{CoreError, Result};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info};

struct FormState {
    form_id: String,
    controls: Vec<ScoreControl>,
    status: SubmissionStatus,
    indicator: Option<StatusIndicator>,
}

impl FormState {
    fn begin(&mut self) {
        self.status.begin();
        if let Some(indicator) = self.indicator.as_mut() {
            indicator.cue = StatusCue::Pending;
        }
    }

    fn complete(&mut self) -> bool {
        if !self.status.complete() {
            return false;
        }
        if let Some(indicator) = self.indicator.as_mut() {
            indicator.cue = StatusCue::Confirmed;
        }
        true
    }
}

/// Collects a row's score controls, submits them on the bus and tracks
/// whether the submission has been acknowledged.
///
/// Completion signals are matched by `CompletionSignal::applies_to`: an
/// un-keyed signal completes every pending form on the page, not only the
/// one that submitted last.
pub struct ScoreEntryForm {
    bus: Rc<EventBus>,
    state: Rc<RefCell<FormState>>,
    subscription: Subscription,
}

impl ScoreEntryForm {
    /// Mount with the status the page was rendered with
    pub fn mount(
        bus: Rc<EventBus>,
        form_id: impl Into<String>,
        controls: Vec<ScoreControl>,
        initial: SubmissionStatus,
        indicator: Option<StatusIndicator>,
    ) -> Self {
        let state = Rc::new(RefCell::new(FormState {
            form_id: form_id.into(),
            controls,
            status: initial,
            indicator,
        }));

        let listener = Rc::clone(&state);
        let subscription = bus.subscribe_to::<CompletionSignal, _>(move |signal| {
            handle_completion(&listener, signal);
            Ok(())
        });

        Self {
            bus,
            state,
            subscription,
        }
    }

    /// Build the envelope from every control, move to pending and publish it.
    ///
    /// The form is pending before the event goes out, so an acknowledgement
    /// published synchronously by a listener is not missed.
    pub fn submit(&self) -> SubmissionEnvelope {
        let envelope = {
            let mut state = self.state.borrow_mut();
            let envelope = SubmissionEnvelope::collect(state.form_id.clone(), &state.controls);
            state.begin();
            envelope
        };

        info!("Submitting {} score(s) for {}", envelope.scores.len(), envelope.event_id);
        self.bus.publish(envelope.clone());
        envelope
    }

    /// Apply a completion signal directly, as the bus would.
    /// Returns whether the form moved from pending to completed.
    pub fn on_completion_signal(&self, signal: &CompletionSignal) -> bool {
        handle_completion(&self.state, signal)
    }

    /// Change the value of the control identified by `field`
    pub fn set_value(&self, field: &str, value: impl Into<String>) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let control = state
            .controls
            .iter_mut()
            .find(|control| control.identifier() == Some(field))
            .ok_or_else(|| CoreError::ControlNotFound {
                field: field.to_string(),
            })?;
        control.value = value.into();
        Ok(())
    }

    pub fn value(&self, field: &str) -> Option<String> {
        self.state
            .borrow()
            .controls
            .iter()
            .find(|control| control.identifier() == Some(field))
            .map(|control| control.value.clone())
    }

    pub fn form_id(&self) -> String {
        self.state.borrow().form_id.clone()
    }

    pub fn status(&self) -> SubmissionStatus {
        self.state.borrow().status
    }

    pub fn cue(&self) -> Option<StatusCue> {
        self.state.borrow().indicator.as_ref().map(|indicator| indicator.cue)
    }

    pub fn controls(&self) -> Vec<ScoreControl> {
        self.state.borrow().controls.clone()
    }

    /// Detach from the bus
    pub fn unmount(self) {}
}

impl Drop for ScoreEntryForm {
    fn drop(&mut self) {
        self.bus.unsubscribe(&self.subscription);
    }
}

fn handle_completion(state: &RefCell<FormState>, signal: &CompletionSignal) -> bool {
    let mut state = state.borrow_mut();
    if !signal.applies_to(&state.form_id) {
        return false;
    }

    let completed = state.complete();
    if completed {
        info!("Submission for {} completed", state.form_id);
    } else {
        debug!("Completion signal ignored by {}: not pending", state.form_id);
    }
    completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::Payload;

    fn controls() -> Vec<ScoreControl> {
        vec![
            ScoreControl::untagged("row-a-b-evt1").with_value("5"),
            ScoreControl::untagged("row-a-b-evt2").with_value("2"),
        ]
    }

    fn mount(bus: &Rc<EventBus>, id: &str, initial: SubmissionStatus) -> ScoreEntryForm {
        ScoreEntryForm::mount(
            Rc::clone(bus),
            id,
            controls(),
            initial,
            Some(StatusIndicator::new(StatusCue::from(initial))),
        )
    }

    #[test]
    fn test_submit_publishes_envelope_and_goes_pending() {
        let bus = EventBus::new();
        let published = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&published);
        bus.subscribe_to::<SubmissionEnvelope, _>(move |envelope| {
            sink.borrow_mut().push(envelope.clone());
            Ok(())
        });

        let form = mount(&bus, "form-1", SubmissionStatus::Completed);
        let envelope = form.submit();

        assert_eq!(envelope.event_id, "form-1");
        assert_eq!(envelope.scores["evt1"], "5");
        assert_eq!(envelope.scores["evt2"], "2");
        assert_eq!(*published.borrow(), vec![envelope]);
        assert_eq!(form.status(), SubmissionStatus::Pending);
        assert_eq!(form.cue(), Some(StatusCue::Pending));
    }

    #[test]
    fn test_completion_moves_pending_to_completed_once() {
        let bus = EventBus::new();
        let form = mount(&bus, "form-1", SubmissionStatus::Pending);

        bus.publish(CompletionSignal::any());
        assert_eq!(form.status(), SubmissionStatus::Completed);
        assert_eq!(form.cue(), Some(StatusCue::Confirmed));

        // Second signal is a no-op
        assert!(!form.on_completion_signal(&CompletionSignal::any()));
        assert_eq!(form.status(), SubmissionStatus::Completed);
    }

    #[test]
    fn test_completed_form_resubmits_to_pending() {
        let bus = EventBus::new();
        let form = mount(&bus, "form-1", SubmissionStatus::Completed);

        form.submit();
        assert_eq!(form.status(), SubmissionStatus::Pending);
        bus.publish(CompletionSignal::any());
        assert_eq!(form.status(), SubmissionStatus::Completed);
    }

    #[test]
    fn test_unkeyed_completion_reaches_every_pending_form() {
        let bus = EventBus::new();
        let first = mount(&bus, "y7-boys-sprint", SubmissionStatus::Completed);
        let second = mount(&bus, "y7-girls-sprint", SubmissionStatus::Completed);
        let idle = mount(&bus, "y8-boys-relay", SubmissionStatus::Completed);

        first.submit();
        second.submit();
        let delivery = bus.publish(CompletionSignal::any());

        assert_eq!(delivery.delivered, 3);
        assert_eq!(first.status(), SubmissionStatus::Completed);
        assert_eq!(second.status(), SubmissionStatus::Completed);
        assert_eq!(idle.status(), SubmissionStatus::Completed);
    }

    #[test]
    fn test_keyed_completion_reaches_only_its_form() {
        let bus = EventBus::new();
        let first = mount(&bus, "y7-boys-sprint", SubmissionStatus::Completed);
        let second = mount(&bus, "y7-girls-sprint", SubmissionStatus::Completed);

        first.submit();
        second.submit();
        bus.publish(CompletionSignal::for_event("y7-girls-sprint"));

        assert_eq!(first.status(), SubmissionStatus::Pending);
        assert_eq!(second.status(), SubmissionStatus::Completed);
    }

    #[test]
    fn test_synchronous_acknowledgement_is_not_lost() {
        let bus = EventBus::new();
        let bus_ref = Rc::clone(&bus);
        bus.subscribe_to::<SubmissionEnvelope, _>(move |_| {
            bus_ref.publish(CompletionSignal::any());
            Ok(())
        });

        let form = mount(&bus, "form-1", SubmissionStatus::Completed);
        form.submit();
        assert_eq!(form.status(), SubmissionStatus::Completed);
    }

    #[test]
    fn test_form_without_indicator_still_tracks_status() {
        let bus = EventBus::new();
        let form = ScoreEntryForm::mount(
            Rc::clone(&bus),
            "form-1",
            controls(),
            SubmissionStatus::Completed,
            None,
        );

        form.submit();
        assert_eq!(form.cue(), None);
        assert_eq!(form.status(), SubmissionStatus::Pending);
    }

    #[test]
    fn test_set_value_by_identifier() {
        let bus = EventBus::new();
        let form = mount(&bus, "form-1", SubmissionStatus::Completed);

        form.set_value("evt2", "10").unwrap();
        assert_eq!(form.value("evt2"), Some("10".to_string()));
        assert!(matches!(
            form.set_value("evt9", "1"),
            Err(CoreError::ControlNotFound { .. })
        ));
        assert_eq!(form.submit().scores["evt2"], "10");
    }

    #[test]
    fn test_unmount_detaches_and_remount_resets() {
        let bus = EventBus::new();
        let form = mount(&bus, "form-1", SubmissionStatus::Completed);
        form.submit();
        form.unmount();
        assert_eq!(bus.listener_count(CompletionSignal::NAME), 0);

        let remounted = mount(&bus, "form-1", SubmissionStatus::Completed);
        assert_eq!(remounted.status(), SubmissionStatus::Completed);
    }
}
