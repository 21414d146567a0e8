//! Dispatch engine
//!
//! The core state machine: resolve the candidate pool once, then loop
//! {select -> call -> classify -> forward or retry} under the model's
//! attempt and time budget. Weight mutation is adaptive: hard failures
//! remove a candidate, rate limits only shave its weight.

mod log_writer;

use crate::core::balancer::PoolWeights;
use crate::core::introspect::{self, RequestProfile};
use crate::core::providers::{Adapter, ProviderStyle};
use crate::core::resolver::{self, CandidatePool};
use crate::core::streaming::{spawn_accounting, AccountingTask, TeeStream};
use crate::storage::database::entities::chat_log::{STATUS_ERROR, STATUS_SUCCESS};
use crate::storage::database::entities::{model_with_provider, provider};
use crate::storage::{NewChatLog, Repository};
use crate::utils::error::{GatewayError, Result};
use actix_web::http::header;
use actix_web::HttpResponse;
use bytes::Bytes;
use log_writer::LogWriter;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Longest upstream error text echoed into a chat log, in characters
const ERROR_SNIPPET_LEN: usize = 256;

/// Everything a successful attempt hands to the commit step
struct SuccessOutcome {
    response: reqwest::Response,
    adapter: Adapter,
    mapping: model_with_provider::Model,
    provider: provider::Model,
    attempt: u32,
    proxy_time_ms: i64,
    call_start: Instant,
}

/// The dispatch engine; one instance serves the whole process
pub struct DispatchEngine {
    repo: Arc<dyn Repository>,
    http: reqwest::Client,
}

impl DispatchEngine {
    /// Create an engine over a repository with a fresh HTTP client
    pub fn new(repo: Arc<dyn Repository>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { repo, http })
    }

    /// Create an engine with a caller-supplied HTTP client
    pub fn with_client(repo: Arc<dyn Repository>, http: reqwest::Client) -> Self {
        Self { repo, http }
    }

    /// Serve one request: introspect, resolve, retry across the pool,
    /// stream the winning response back
    pub async fn execute(&self, style: ProviderStyle, raw: Bytes) -> Result<HttpResponse> {
        let request_id = Uuid::new_v4();
        self.execute_inner(style, raw)
            .instrument(info_span!("dispatch", %request_id))
            .await
    }

    async fn execute_inner(&self, style: ProviderStyle, raw: Bytes) -> Result<HttpResponse> {
        let start = Instant::now();
        let profile = introspect::inspect(style, raw)?;
        let pool = resolver::resolve(self.repo.as_ref(), &profile.model, style, &profile).await?;

        debug!(
            model = %profile.model,
            style = %style,
            stream = profile.stream,
            candidates = pool.lookup.len(),
            "dispatching"
        );

        // Failed-attempt logs flow through a per-request writer task so the
        // loop never waits on the log store. The writer is always drained
        // before this function returns: either here, or by its sender being
        // dropped if the client goes away and actix drops the future.
        let writer = LogWriter::spawn(self.repo.clone());
        let outcome = self
            .run_attempts(style, &profile, pool, start, &writer)
            .await;
        writer.close().await;

        let success = outcome?;
        self.commit_success(style, &profile, success).await
    }

    /// The attempt loop. Returns the first 2xx outcome, or the terminal
    /// error once the pool, the attempt budget, or the time budget runs out.
    async fn run_attempts(
        &self,
        style: ProviderStyle,
        profile: &RequestProfile,
        pool: CandidatePool,
        start: Instant,
        writer: &LogWriter,
    ) -> Result<SuccessOutcome> {
        let CandidatePool {
            mut weights,
            lookup,
            max_retry,
            timeout_seconds,
        } = pool;
        let budget = Duration::from_secs(timeout_seconds);
        // A transport hang must not eat the whole per-request budget.
        let transport_timeout = Duration::from_secs((timeout_seconds / 3).max(1));
        let mut attempt: u32 = 0;

        loop {
            // The timer gates entering a new attempt; an in-flight call is
            // bounded by the transport timeout instead.
            if attempt > 0 && start.elapsed() >= budget {
                warn!(model = %profile.model, attempt, "retry budget elapsed");
                return Err(GatewayError::RetryTimeout {
                    model: profile.model.clone(),
                    timeout_seconds,
                });
            }

            let mapping_id = match self.pick(&weights) {
                Ok(id) => id,
                Err(GatewayError::EmptyPool) => {
                    warn!(model = %profile.model, attempt, "candidate pool exhausted");
                    return Err(GatewayError::Exhausted(profile.model.clone()));
                }
                Err(e) => return Err(e),
            };
            let (mapping, provider) = lookup
                .get(&mapping_id)
                .cloned()
                .ok_or_else(|| {
                    GatewayError::Internal(format!("mapping {} missing from lookup", mapping_id))
                })?;

            // Adapter construction failures are configuration-level, not
            // retryable against the same table.
            let adapter = Adapter::from_config(style, &provider.config)?;

            let proxy_time_ms = start.elapsed().as_millis() as i64;
            let call_start = Instant::now();
            let result = adapter
                .chat(
                    &self.http,
                    &mapping.provider_model,
                    &profile.raw,
                    transport_timeout,
                )
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    info!(
                        model = %profile.model,
                        provider = %provider.name,
                        upstream_model = %mapping.provider_model,
                        attempt,
                        "upstream accepted request"
                    );
                    return Ok(SuccessOutcome {
                        response,
                        adapter,
                        mapping,
                        provider,
                        attempt,
                        proxy_time_ms,
                        call_start,
                    });
                }
                Ok(response) if response.status().as_u16() == 429 => {
                    warn!(
                        model = %profile.model,
                        provider = %provider.name,
                        attempt,
                        "upstream rate limited; penalizing"
                    );
                    drop(response);
                    writer
                        .record(self.failure_log(
                            profile,
                            style,
                            &mapping,
                            &provider,
                            attempt,
                            proxy_time_ms,
                            "upstream returned 429 (rate limited)".to_string(),
                        ))
                        .await;
                    weights.penalize(mapping_id);
                }
                Ok(response) => {
                    let status = response.status();
                    let snippet = read_snippet(response).await;
                    warn!(
                        model = %profile.model,
                        provider = %provider.name,
                        attempt,
                        status = status.as_u16(),
                        "upstream rejected request; removing from pool"
                    );
                    writer
                        .record(self.failure_log(
                            profile,
                            style,
                            &mapping,
                            &provider,
                            attempt,
                            proxy_time_ms,
                            format!("upstream returned {}: {}", status.as_u16(), snippet),
                        ))
                        .await;
                    weights.remove(mapping_id);
                }
                Err(e) => {
                    warn!(
                        model = %profile.model,
                        provider = %provider.name,
                        attempt,
                        "upstream transport failure: {}; removing from pool",
                        e
                    );
                    writer
                        .record(self.failure_log(
                            profile,
                            style,
                            &mapping,
                            &provider,
                            attempt,
                            proxy_time_ms,
                            e.to_string(),
                        ))
                        .await;
                    weights.remove(mapping_id);
                }
            }

            attempt += 1;
            if attempt == max_retry {
                warn!(model = %profile.model, attempts = attempt, "attempt budget spent");
                return Err(GatewayError::MaxRetriesReached {
                    model: profile.model.clone(),
                    attempts: attempt,
                });
            }
        }
    }

    /// Weighted draw, scoped so the thread-local RNG never crosses an await
    fn pick(&self, weights: &PoolWeights) -> Result<i64> {
        let mut rng = rand::thread_rng();
        weights.pick(&mut rng)
    }

    /// The success commit: runs at most once per request. Inserts the
    /// provisional success row, splits the body through the tee, and hands
    /// the client stream back while accounting runs detached.
    async fn commit_success(
        &self,
        style: ProviderStyle,
        profile: &RequestProfile,
        success: SuccessOutcome,
    ) -> Result<HttpResponse> {
        let log_id = self
            .repo
            .insert_chat_log(NewChatLog {
                name: profile.model.clone(),
                provider_model: success.mapping.provider_model.clone(),
                provider_name: success.provider.name.clone(),
                status: STATUS_SUCCESS.to_string(),
                style: style.to_string(),
                retry: success.attempt as i32,
                error: None,
                proxy_time_ms: success.proxy_time_ms,
            })
            .await?;

        let (tee, rx, lagged) = TeeStream::new(success.response.bytes_stream());
        spawn_accounting(
            AccountingTask {
                repo: self.repo.clone(),
                adapter: success.adapter,
                log_id,
                was_stream: profile.stream,
                call_start: success.call_start,
            },
            rx,
            lagged,
        );

        let mut builder = HttpResponse::Ok();
        if profile.stream {
            builder.content_type("text/event-stream");
            builder.insert_header((header::CACHE_CONTROL, "no-cache"));
        } else {
            builder.content_type("application/json");
        }
        Ok(builder.streaming(tee))
    }

    #[allow(clippy::too_many_arguments)]
    fn failure_log(
        &self,
        profile: &RequestProfile,
        style: ProviderStyle,
        mapping: &model_with_provider::Model,
        provider: &provider::Model,
        attempt: u32,
        proxy_time_ms: i64,
        error: String,
    ) -> NewChatLog {
        NewChatLog {
            name: profile.model.clone(),
            provider_model: mapping.provider_model.clone(),
            provider_name: provider.name.clone(),
            status: STATUS_ERROR.to_string(),
            style: style.to_string(),
            retry: attempt as i32,
            error: Some(error),
            proxy_time_ms,
        }
    }
}

/// Read a truncated error body for the chat log, consuming (and thereby
/// closing) the response
async fn read_snippet(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(text) => {
            let mut snippet: String = text.chars().take(ERROR_SNIPPET_LEN).collect();
            if snippet.len() < text.len() {
                snippet.push_str("...");
            }
            snippet
        }
        Err(_) => String::from("<unreadable body>"),
    }
}
