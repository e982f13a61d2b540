use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{BotError, BotResult};
use crate::models::{BotState, Corpus};

/// Durable storage for the bot state snapshot and the learned corpus.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// `Ok(None)` means nothing was saved yet. A file that exists but cannot
    /// be read or parsed is an error.
    async fn read_state(&self) -> BotResult<Option<BotState>>;

    async fn save_state(&self, state: &BotState) -> BotResult<()>;

    async fn read_corpus(&self) -> BotResult<Corpus>;

    async fn save_corpus(&self, corpus: &Corpus) -> BotResult<()>;
}

pub struct JsonDataStore {
    dir: PathBuf,
}

impl JsonDataStore {
    const STATE_FILE: &'static str = "state.json";
    const CORPUS_FILE: &'static str = "corpus.json";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonDataStore { dir: dir.into() }
    }

    fn state_path(&self) -> PathBuf {
        self.dir.join(Self::STATE_FILE)
    }

    fn corpus_path(&self) -> PathBuf {
        self.dir.join(Self::CORPUS_FILE)
    }

    async fn load<T: DeserializeOwned>(path: &Path) -> BotResult<Option<T>> {
        let data = match tokio::fs::read_to_string(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BotError::Persistence(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&data).map(Some).map_err(|e| {
            BotError::Persistence(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    async fn store<T: Serialize + Sync>(&self, path: &Path, value: &T) -> BotResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let data = serde_json::to_string_pretty(value)?;

        // Write to a sibling file and rename it into place.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data.as_bytes()).await?;
        tokio::fs::rename(&tmp, path).await?;
        debug!("Saved {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl DataStore for JsonDataStore {
    async fn read_state(&self) -> BotResult<Option<BotState>> {
        Self::load(&self.state_path()).await
    }

    async fn save_state(&self, state: &BotState) -> BotResult<()> {
        self.store(&self.state_path(), state).await
    }

    async fn read_corpus(&self) -> BotResult<Corpus> {
        Ok(Self::load(&self.corpus_path()).await?.unwrap_or_default())
    }

    async fn save_corpus(&self, corpus: &Corpus) -> BotResult<()> {
        self.store(&self.corpus_path(), corpus).await
    }
}
