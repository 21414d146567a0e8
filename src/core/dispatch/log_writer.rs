//! Per-request chat log writer
//!
//! Failed-attempt logs are buffered through a bounded channel and written by
//! one background task, so the dispatch loop never waits on the log store.
//! Closing the writer drains everything that was recorded; if the request
//! future is dropped instead, the dangling sender closes the channel and the
//! task still drains on its own.

use crate::storage::{NewChatLog, Repository};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

/// Channel depth; attempts are bounded by max_retry, which is tiny
const LOG_CHANNEL_CAPACITY: usize = 32;

/// Handle to one request's log writer task
pub struct LogWriter {
    tx: mpsc::Sender<NewChatLog>,
    handle: JoinHandle<()>,
}

impl LogWriter {
    /// Spawn the writer task for one request
    pub fn spawn(repo: Arc<dyn Repository>) -> Self {
        let (tx, mut rx) = mpsc::channel::<NewChatLog>(LOG_CHANNEL_CAPACITY);
        let handle = tokio::spawn(async move {
            while let Some(log) = rx.recv().await {
                if let Err(e) = repo.insert_chat_log(log).await {
                    warn!("failed to persist attempt log: {}", e);
                }
            }
        });
        Self { tx, handle }
    }

    /// Queue one failed-attempt log
    pub async fn record(&self, log: NewChatLog) {
        // The writer outlives every sender, so this only fails if the task
        // itself died; nothing useful to do about it mid-dispatch.
        let _ = self.tx.send(log).await;
    }

    /// Close the channel and wait for the backlog to hit the store
    pub async fn close(self) {
        drop(self.tx);
        let _ = self.handle.await;
    }
}
