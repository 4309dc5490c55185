use anyhow::{Context, Result};
use scoreday_core::domain::SubmissionEnvelope;
use scoreday_core::ports::ScoreStore;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// JSON file store: `{ "<event id>": { "<form id>": "<score>", ... }, ... }`
pub struct JsonFileScoreStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl JsonFileScoreStore {
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, Value>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read score store: {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse score store: {}", self.path.display()))
    }

    fn write(&self, rows: &BTreeMap<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create score store directory")?;
        }

        let contents = serde_json::to_string_pretty(rows).context("Failed to serialize scores")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write score store: {}", self.path.display()))
    }
}

impl ScoreStore for JsonFileScoreStore {
    fn load_all(&self) -> Result<HashMap<String, String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Score store lock poisoned"))?;

        Ok(self
            .read()?
            .into_iter()
            .map(|(event_id, scores)| (event_id, scores.to_string()))
            .collect())
    }

    fn set_scores(&self, envelope: &SubmissionEnvelope) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Score store lock poisoned"))?;

        let mut rows = self.read()?;
        let scores = serde_json::to_value(&envelope.scores).context("Failed to serialize scores")?;
        rows.insert(envelope.event_id.clone(), scores);
        self.write(&rows)?;

        debug!("Stored scores for {} in {}", envelope.event_id, self.path.display());
        Ok(())
    }
}

/// In-memory store, used for tests and throwaway sessions
#[derive(Default)]
pub struct MemoryScoreStore {
    rows: Mutex<HashMap<String, String>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row with an already-serialized score map
    pub fn with_row(self, event_id: impl Into<String>, raw: impl Into<String>) -> Self {
        if let Ok(mut rows) = self.rows.lock() {
            rows.insert(event_id.into(), raw.into());
        }
        self
    }
}

impl ScoreStore for MemoryScoreStore {
    fn load_all(&self) -> Result<HashMap<String, String>> {
        let rows = self
            .rows
            .lock()
            .map_err(|_| anyhow::anyhow!("Score store lock poisoned"))?;
        Ok(rows.clone())
    }

    fn set_scores(&self, envelope: &SubmissionEnvelope) -> Result<()> {
        let raw = serde_json::to_string(&envelope.scores).context("Failed to serialize scores")?;
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| anyhow::anyhow!("Score store lock poisoned"))?;
        rows.insert(envelope.event_id.clone(), raw);
        Ok(())
    }
}
