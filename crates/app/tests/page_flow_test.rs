//! End-to-end flow: page -> local backend -> file store -> page

use anyhow::Result;
use scoreday::adapters::{JsonFileScoreStore, LocalBackend};
use scoreday::config::BackendConfig;
use scoreday::services::PageService;
use scoreday_core::domain::{Event, SportsDay, SubmissionStatus, GROUP_KEY, YEAR_KEY};
use scoreday_core::ports::ScoreStore;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct Harness {
    _temp_dir: TempDir,
    store: Arc<dyn ScoreStore>,
    page: PageService,
    inbound_rx: mpsc::UnboundedReceiver<Event>,
    backend: JoinHandle<()>,
}

fn start(keyed: bool, query: &str) -> Result<Harness> {
    let temp_dir = TempDir::new()?;
    let store: Arc<dyn ScoreStore> =
        Arc::new(JsonFileScoreStore::with_path(temp_dir.path().join("scores.json")));

    let config = BackendConfig {
        ack_delay_ms: 0,
        keyed_completions: keyed,
        store_path: None,
    };

    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let backend = LocalBackend::new(Arc::clone(&store), SportsDay::example(), &config)
        .spawn(outbound_rx, inbound_tx);
    let page = PageService::new(SportsDay::example(), Arc::clone(&store), outbound_tx, query)?;

    Ok(Harness {
        _temp_dir: temp_dir,
        store,
        page,
        inbound_rx,
        backend,
    })
}

impl Harness {
    /// Wait for `count` backend replies and publish them on the page
    async fn deliver(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            let event = self
                .inbound_rx
                .recv()
                .await
                .ok_or_else(|| anyhow::anyhow!("backend stopped"))?;
            self.page.handle_inbound(event)?;
        }
        Ok(())
    }

    async fn stop(self) {
        drop(self.page);
        self.backend.await.expect("backend task should finish");
    }
}

#[tokio::test]
async fn test_submission_round_trip() -> Result<()> {
    let mut harness = start(false, "?year=y7&group=boys")?;
    assert_eq!(harness.page.rows().len(), 1);

    harness.page.set_score(0, "red", "10")?;
    harness.page.set_score(0, "gold", "6")?;
    harness.page.submit(0)?;
    assert_eq!(harness.page.rows()[0].form.status(), SubmissionStatus::Pending);

    // Completion, then standings
    harness.deliver(2).await?;

    assert_eq!(harness.page.rows()[0].form.status(), SubmissionStatus::Completed);
    let banner = harness.page.banner();
    let lines: Vec<&str> = banner.lines().collect();
    assert_eq!(lines[0], "Standings: Red 10 | Blue 0 | Gold 6 | Total 16");
    assert_eq!(lines[1], "Year 7: Red 10 | Blue 0 | Gold 6 | Total 16");
    assert!(harness.store.scores_for("y7-boys-sprint")?.is_some());

    // A fresh page shows the stored values
    harness.page.mount_rows()?;
    let snapshot = harness.page.snapshot();
    assert_eq!(snapshot.rows[0].values, vec!["10", "0", "6"]);

    harness.stop().await;
    Ok(())
}

#[tokio::test]
async fn test_unkeyed_acknowledgement_completes_every_pending_row() -> Result<()> {
    let mut harness = start(false, "?year=y8&group=girls")?;
    assert_eq!(harness.page.rows().len(), 2);

    harness.page.submit(0)?;
    harness.page.submit(1)?;
    assert_eq!(harness.page.pending_count(), 2);

    // First submission's completion only
    harness.deliver(1).await?;
    assert_eq!(harness.page.pending_count(), 0);

    harness.stop().await;
    Ok(())
}

#[tokio::test]
async fn test_keyed_acknowledgement_completes_its_row_only() -> Result<()> {
    let mut harness = start(true, "?year=y8&group=girls")?;

    harness.page.submit(0)?;
    harness.page.submit(1)?;

    harness.deliver(1).await?;
    assert_eq!(harness.page.rows()[0].form.status(), SubmissionStatus::Completed);
    assert_eq!(harness.page.rows()[1].form.status(), SubmissionStatus::Pending);

    // Standings for the first, then the second completion
    harness.deliver(2).await?;
    assert_eq!(harness.page.pending_count(), 0);

    harness.stop().await;
    Ok(())
}

#[tokio::test]
async fn test_filters_navigate_between_row_sets() -> Result<()> {
    let harness = start(false, "")?;
    let mut page = harness.page;
    assert_eq!(page.rows().len(), 6);

    page.apply_filter(YEAR_KEY, "y8")?;
    page.apply_filter(GROUP_KEY, "boys")?;
    assert_eq!(page.query(), "?year=y8&group=boys");
    let ids: Vec<_> = page.rows().iter().map(|mounted| mounted.row.id.clone()).collect();
    assert_eq!(ids, vec!["y8-boys-sprint", "y8-boys-relay"]);

    page.apply_filter(YEAR_KEY, "all")?;
    assert_eq!(page.query(), "?group=boys");
    assert_eq!(page.rows().len(), 3);

    drop(page);
    harness.backend.await?;
    Ok(())
}
