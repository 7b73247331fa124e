//! Search aggregation module
//!
//! This module fans a single query out to every registered subtitle
//! provider, collects their results and failures independently, and merges
//! them into one outcome. Providers run concurrently, but results are always
//! merged in registration order.

use crate::query::SearchQuery;
use crate::subtitle_search::{SearchError, Subtitle, SubtitleProvider};
use crossbeam_channel::{RecvTimeoutError, unbounded};
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// A provider that failed during a search, with its error
#[derive(Debug)]
pub struct ProviderFailure {
    /// Name of the failing provider
    pub provider: String,
    /// What went wrong
    pub error: SearchError,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.error)
    }
}

/// Every provider failure of one search, combined into a single error
///
/// This error is informational: it accompanies whatever results the other
/// providers returned.
#[derive(Debug, Error)]
#[error("{}", .failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct AggregateError {
    failures: Vec<ProviderFailure>,
}

impl AggregateError {
    /// The individual failures, in provider registration order
    pub fn failures(&self) -> &[ProviderFailure] {
        &self.failures
    }
}

/// Result of searching all providers
#[derive(Debug)]
pub struct SearchOutcome {
    /// Subtitles from every successful provider, in registration order
    pub subtitles: Vec<Subtitle>,
    /// Combined error if at least one provider failed
    pub error: Option<AggregateError>,
}

impl SearchOutcome {
    /// True if some providers failed while others returned results
    pub fn is_partial(&self) -> bool {
        self.error.is_some() && !self.subtitles.is_empty()
    }
}

/// Progress event emitted while providers report back
///
/// Events arrive in completion order, which may differ from the order of
/// the merged results.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    /// A provider returned results
    Succeeded { provider: String, count: usize },
    /// A provider failed; its error will be part of the combined error
    Failed { provider: String, message: String },
}

/// Searches all providers and merges their results.
///
/// Each provider runs on its own thread. The calling thread collects the
/// results until every provider has answered or the optional `deadline`
/// has passed; providers still running at that point are reported as
/// [`SearchError::TimedOut`] and their late results are discarded.
///
/// Results are concatenated in the order of `providers`, regardless of the
/// order in which the providers finished.
///
/// # Arguments
///
/// * `query` - The search query handed to every provider
/// * `providers` - Providers in registration order
/// * `deadline` - Optional overall time limit for the whole search
/// * `on_event` - Closure called once per provider as it finishes
pub fn aggregate<F>(
    query: &SearchQuery,
    providers: &[Arc<dyn SubtitleProvider>],
    deadline: Option<Duration>,
    mut on_event: F,
) -> SearchOutcome
where
    F: FnMut(ProviderEvent),
{
    let started = Instant::now();
    let deadline = deadline.map(|d| started + d);
    debug!(
        show = query.show_name(),
        language = %query.language(),
        providers = providers.len(),
        "starting search"
    );
    let query = Arc::new(query.clone());
    let (tx, rx) = unbounded();

    let mut slots: Vec<Option<Result<Vec<Subtitle>, SearchError>>> =
        providers.iter().map(|_| None).collect();
    let mut pending = 0;

    for (index, provider) in providers.iter().enumerate() {
        let worker_provider = Arc::clone(provider);
        let query = Arc::clone(&query);
        let tx = tx.clone();

        let spawned = thread::Builder::new()
            .name(format!("search-{}", provider.name()))
            .spawn(move || {
                let result = worker_provider.search(&query);
                // The collector may have given up on us already
                let _ = tx.send((index, result));
            });

        match spawned {
            Ok(_) => pending += 1,
            Err(e) => {
                slots[index] = Some(Err(SearchError::RequestError(format!(
                    "failed to start search thread: {}",
                    e
                ))));
            }
        }
    }
    drop(tx);

    let mut timed_out = false;
    while pending > 0 {
        let received = match deadline {
            Some(deadline) => rx.recv_deadline(deadline),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok((index, result)) => {
                pending -= 1;
                let provider = providers[index].name().to_string();
                match &result {
                    Ok(subtitles) => {
                        debug!(%provider, count = subtitles.len(), "provider finished");
                        on_event(ProviderEvent::Succeeded {
                            provider,
                            count: subtitles.len(),
                        });
                    }
                    Err(e) => {
                        debug!(%provider, error = %e, "provider failed");
                        on_event(ProviderEvent::Failed {
                            provider,
                            message: e.to_string(),
                        });
                    }
                }
                slots[index] = Some(result);
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(pending, "search deadline passed with providers still running");
                timed_out = true;
                break;
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!(pending, "search threads stopped without reporting");
                break;
            }
        }
    }

    // Providers that never answered count as failed
    for (provider, slot) in providers.iter().zip(slots.iter_mut()) {
        if slot.is_none() {
            let error = if timed_out {
                SearchError::TimedOut
            } else {
                SearchError::Aborted
            };
            on_event(ProviderEvent::Failed {
                provider: provider.name().to_string(),
                message: error.to_string(),
            });
            *slot = Some(Err(error));
        }
    }

    let outcome = merge(
        providers
            .iter()
            .map(|p| p.name().to_string())
            .zip(slots.into_iter().flatten()),
    );

    info!(
        results = outcome.subtitles.len(),
        failures = outcome.error.as_ref().map_or(0, |e| e.failures().len()),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "search finished"
    );

    outcome
}

/// Merges per-provider results in the order given.
///
/// Successful result lists are concatenated; failures are collected into
/// a single [`AggregateError`]. No failure ever discards results.
pub fn merge<I>(results: I) -> SearchOutcome
where
    I: IntoIterator<Item = (String, Result<Vec<Subtitle>, SearchError>)>,
{
    let mut subtitles = Vec::new();
    let mut failures = Vec::new();

    for (provider, result) in results {
        match result {
            Ok(found) => subtitles.extend(found),
            Err(error) => failures.push(ProviderFailure { provider, error }),
        }
    }

    SearchOutcome {
        subtitles,
        error: if failures.is_empty() {
            None
        } else {
            Some(AggregateError { failures })
        },
    }
}
