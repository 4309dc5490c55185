use anyhow::Result;
use scoreday_core::domain::{
    CompletionSignal, Event, Scoreboard, SportsDay, StatusFragment, SubmissionEnvelope,
};
use scoreday_core::ports::ScoreStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::BackendConfig;

/// Stands in for the scoring server: persists every submission, then
/// acknowledges it and pushes refreshed standings back to the page.
pub struct LocalBackend {
    store: Arc<dyn ScoreStore>,
    sheet: SportsDay,
    ack_delay: Duration,
    keyed: bool,
}

impl LocalBackend {
    pub fn new(store: Arc<dyn ScoreStore>, sheet: SportsDay, config: &BackendConfig) -> Self {
        Self {
            store,
            sheet,
            ack_delay: Duration::from_millis(config.ack_delay_ms),
            keyed: config.keyed_completions,
        }
    }

    /// Current standings as a status fragment
    pub fn standings(&self) -> Result<StatusFragment> {
        let stored = self.store.load_all()?;
        let board = Scoreboard::tally(&self.sheet.rows(), &stored, &self.sheet.forms);
        Ok(StatusFragment {
            html: board.render_fragment(&self.sheet),
        })
    }

    /// Persist `envelope` and build the events to push back to the page.
    ///
    /// A failed save is reported on the banner only; no completion is sent,
    /// so the form stays pending.
    pub fn acknowledge(&self, envelope: &SubmissionEnvelope) -> Vec<Event> {
        if let Err(e) = self.store.set_scores(envelope) {
            error!("Failed to save scores for {}: {:#}", envelope.event_id, e);
            return vec![Event::from(StatusFragment {
                html: format!("Could not save scores for {}: {}", envelope.event_id, e),
            })];
        }

        let signal = if self.keyed {
            CompletionSignal::for_event(envelope.event_id.clone())
        } else {
            CompletionSignal::any()
        };
        let mut replies = vec![Event::from(signal)];

        match self.standings() {
            Ok(fragment) => replies.push(Event::from(fragment)),
            Err(e) => warn!("Saved {} but could not tally standings: {:#}", envelope.event_id, e),
        }
        replies
    }

    /// Run until the submission channel closes
    pub fn spawn(
        self,
        submissions: mpsc::UnboundedReceiver<SubmissionEnvelope>,
        replies: mpsc::UnboundedSender<Event>,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(submissions, replies))
    }

    pub async fn run(
        self,
        mut submissions: mpsc::UnboundedReceiver<SubmissionEnvelope>,
        replies: mpsc::UnboundedSender<Event>,
    ) {
        info!("Local backend started (keyed completions: {})", self.keyed);
        let backend = Arc::new(self);

        while let Some(envelope) = submissions.recv().await {
            debug!("Backend received {} score(s) for {}", envelope.scores.len(), envelope.event_id);

            // Store access is blocking file I/O
            let worker = Arc::clone(&backend);
            let events = match tokio::task::spawn_blocking(move || worker.acknowledge(&envelope)).await {
                Ok(events) => events,
                Err(e) => {
                    error!("Backend task failed: {}", e);
                    continue;
                }
            };

            if !backend.ack_delay.is_zero() {
                tokio::time::sleep(backend.ack_delay).await;
            }

            for event in events {
                if replies.send(event).is_err() {
                    info!("Page closed, stopping local backend");
                    return;
                }
            }
        }

        info!("Submission channel closed, stopping local backend");
    }
}
