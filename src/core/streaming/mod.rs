//! Stream tee and accounting
//!
//! On a successful upstream call the response body is forwarded to the
//! client byte-for-byte while a copy of each chunk is pushed into a bounded
//! channel feeding the accounting task. The client path is authoritative:
//! when the accounting side cannot keep up, its copies are dropped and the
//! token totals fall back to zero. The accounting task is detached from the
//! request so the final log update survives a client disconnect.

use crate::core::providers::{Adapter, TokenUsage};
use crate::storage::{ChatLogPatch, Repository};
use crate::utils::error::GatewayError;
use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Upper bound on bytes the accounting side buffers; the tail is kept
/// because usage rides on the final chunks of a stream
pub const ACCOUNTING_BUFFER_BYTES: usize = 64 * 1024;

/// Accounting channel depth in chunks
const ACCOUNTING_CHANNEL_CAPACITY: usize = 64;

/// One message on the accounting side of the tee
#[derive(Debug)]
pub enum TeeEvent {
    /// A chunk forwarded to the client
    Chunk(Bytes),
    /// The forwarding path ended with this error
    Error(String),
}

pin_project! {
    /// Splits an upstream byte stream: items are yielded to the caller
    /// (the client response body) and copied into the accounting channel.
    pub struct TeeStream<S> {
        #[pin]
        inner: S,
        tx: Option<mpsc::Sender<TeeEvent>>,
        lagged: Arc<AtomicBool>,
    }

    impl<S> PinnedDrop for TeeStream<S> {
        fn drop(this: Pin<&mut Self>) {
            // Still holding the sender here means the stream was dropped
            // before EOF: the client went away mid-stream.
            let project = this.project();
            if let Some(tx) = project.tx.take() {
                let _ = tx.try_send(TeeEvent::Error("client disconnected".to_string()));
            }
        }
    }
}

impl<S> TeeStream<S> {
    /// Wrap `inner`, returning the stream plus the accounting receiver and
    /// the shared lag flag
    pub fn new(inner: S) -> (Self, mpsc::Receiver<TeeEvent>, Arc<AtomicBool>) {
        let (tx, rx) = mpsc::channel(ACCOUNTING_CHANNEL_CAPACITY);
        let lagged = Arc::new(AtomicBool::new(false));
        (
            Self {
                inner,
                tx: Some(tx),
                lagged: lagged.clone(),
            },
            rx,
            lagged,
        )
    }
}

impl<S> Stream for TeeStream<S>
where
    S: Stream<Item = reqwest::Result<Bytes>>,
{
    type Item = Result<Bytes, GatewayError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        match this.inner.poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                if let Some(tx) = this.tx.as_ref() {
                    // Never wait on the accounting side: a full channel
                    // means the reader lags and loses this copy.
                    if let Err(mpsc::error::TrySendError::Full(_)) =
                        tx.try_send(TeeEvent::Chunk(chunk.clone()))
                    {
                        this.lagged.store(true, Ordering::Relaxed);
                    }
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                if let Some(tx) = this.tx.take() {
                    let _ = tx.try_send(TeeEvent::Error(e.to_string()));
                }
                Poll::Ready(Some(Err(GatewayError::UpstreamTransport(e.to_string()))))
            }
            Poll::Ready(None) => {
                // Dropping the sender is the EOF signal for accounting.
                this.tx.take();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Everything the accounting task needs besides the byte feed
pub struct AccountingTask {
    /// Repository handle, independent of the request lifetime
    pub repo: Arc<dyn Repository>,
    /// Adapter that issued the call; knows the usage wire shape
    pub adapter: Adapter,
    /// Provisional success row to enrich
    pub log_id: i64,
    /// Whether the upstream response is SSE
    pub was_stream: bool,
    /// Upstream call start, for first-chunk and total latency
    pub call_start: Instant,
}

/// Spawn the detached accounting task.
///
/// Reads the tee side until EOF, then updates the chat log exactly once with
/// timings and token counts. Runs to completion even if the client
/// disconnected.
pub fn spawn_accounting(
    task: AccountingTask,
    mut rx: mpsc::Receiver<TeeEvent>,
    lagged: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tail: Vec<u8> = Vec::new();
        let mut first_chunk_time_ms: i64 = 0;
        let mut stream_error: Option<String> = None;

        while let Some(event) = rx.recv().await {
            match event {
                TeeEvent::Chunk(chunk) => {
                    if first_chunk_time_ms == 0 {
                        first_chunk_time_ms = task.call_start.elapsed().as_millis() as i64;
                    }
                    tail.extend_from_slice(&chunk);
                    if tail.len() > ACCOUNTING_BUFFER_BYTES {
                        let excess = tail.len() - ACCOUNTING_BUFFER_BYTES;
                        tail.drain(..excess);
                    }
                }
                TeeEvent::Error(e) => {
                    stream_error = Some(e);
                }
            }
        }

        let total_time_ms = task.call_start.elapsed().as_millis() as i64;
        let usage = if lagged.load(Ordering::Relaxed) {
            debug!(
                log_id = task.log_id,
                "accounting lagged behind the client; token counts default to 0"
            );
            TokenUsage::default()
        } else {
            task.adapter.parse_usage(&tail, task.was_stream)
        };

        let patch = ChatLogPatch {
            first_chunk_time_ms,
            total_time_ms,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            error: stream_error,
        };
        if let Err(e) = task.repo.update_chat_log(task.log_id, patch).await {
            warn!(log_id = task.log_id, "failed to finalize chat log: {}", e);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    fn upstream(
        chunks: Vec<reqwest::Result<Bytes>>,
    ) -> impl Stream<Item = reqwest::Result<Bytes>> {
        futures::stream::iter(chunks)
    }

    #[tokio::test]
    async fn test_client_side_sees_upstream_bytes_in_order() {
        let (tee, _rx, _lagged) = TeeStream::new(upstream(vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ]));
        let forwarded: Vec<Bytes> = tee.map(|r| r.unwrap()).collect().await;
        assert_eq!(forwarded, vec![Bytes::from_static(b"hello "), Bytes::from_static(b"world")]);
    }

    #[tokio::test]
    async fn test_accounting_side_receives_identical_copy() {
        let (tee, mut rx, _lagged) = TeeStream::new(upstream(vec![
            Ok(Bytes::from_static(b"a")),
            Ok(Bytes::from_static(b"b")),
        ]));
        let _forwarded: Vec<_> = tee.collect().await;

        let mut copied = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                TeeEvent::Chunk(c) => copied.extend_from_slice(&c),
                TeeEvent::Error(e) => panic!("unexpected error event: {}", e),
            }
        }
        assert_eq!(copied, b"ab");
    }

    #[tokio::test]
    async fn test_eof_closes_accounting_channel() {
        let (tee, mut rx, _lagged) = TeeStream::new(upstream(vec![Ok(Bytes::from_static(b"x"))]));
        let _forwarded: Vec<_> = tee.collect().await;
        assert!(matches!(rx.recv().await, Some(TeeEvent::Chunk(_))));
        assert!(rx.recv().await.is_none(), "sender must be dropped at EOF");
    }

    #[tokio::test]
    async fn test_drop_before_eof_reports_disconnect() {
        let (mut tee, mut rx, _lagged) = TeeStream::new(upstream(vec![
            Ok(Bytes::from_static(b"x")),
            Ok(Bytes::from_static(b"y")),
        ]));
        // Consume one chunk, then drop the stream as an aborted client would.
        let first = tee.next().await.unwrap().unwrap();
        assert_eq!(first, Bytes::from_static(b"x"));
        drop(tee);

        let mut saw_error = false;
        while let Some(event) = rx.recv().await {
            if let TeeEvent::Error(e) = event {
                assert!(e.contains("disconnected"));
                saw_error = true;
            }
        }
        assert!(saw_error);
    }

    #[tokio::test]
    async fn test_slow_accounting_never_blocks_client() {
        // More chunks than the channel holds, with nobody reading the
        // accounting side: every byte must still reach the client.
        let chunks: Vec<reqwest::Result<Bytes>> = (0..ACCOUNTING_CHANNEL_CAPACITY + 16)
            .map(|i| Ok(Bytes::from(format!("chunk-{}", i))))
            .collect();
        let total = chunks.len();
        let (tee, rx, lagged) = TeeStream::new(upstream(chunks));
        let forwarded: Vec<_> = tee.collect().await;
        assert_eq!(forwarded.len(), total);
        assert!(lagged.load(Ordering::Relaxed));
        drop(rx);
    }
}
