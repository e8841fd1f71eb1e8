//! Bounded-concurrency fan-out with a per-item timeout.
//!
//! A fixed number of workers share one atomic cursor into the item list and
//! keep claiming the next unclaimed index until the list is exhausted. All
//! workers are polled on the caller's task, so "concurrent" fetches are
//! interleaved I/O rather than separate threads.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::join_all;
use tracing::debug;

use crate::error::FetchError;

/// Outcome of one item: the mapped value or the reason it failed.
pub type Settled<R> = Result<R, FetchError>;

/// Run `mapper` over `items` with at most `concurrency` calls in flight.
///
/// Returns one outcome per item, in input order. A call that does not finish
/// within `timeout` is dropped and its slot becomes [`FetchError::Timeout`].
/// Failures never stop the remaining items. `concurrency` is clamped to at
/// least 1.
pub async fn map_with_concurrency<'a, T, R, F, Fut>(
    items: &'a [T],
    concurrency: usize,
    timeout: Duration,
    mapper: F,
) -> Vec<Settled<R>>
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = Settled<R>>,
{
    let workers = concurrency.max(1);
    let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    let cursor = AtomicUsize::new(0);

    let cursor = &cursor;
    let mapper = &mapper;
    let batches = join_all((0..workers).map(|worker| async move {
        let mut settled = Vec::new();
        loop {
            let index = cursor.fetch_add(1, Ordering::Relaxed);
            let Some(item) = items.get(index) else {
                break;
            };
            let outcome = match tokio::time::timeout(timeout, mapper(item)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    debug!(worker, index, timeout_ms, "Fetch timed out");
                    Err(FetchError::Timeout { timeout_ms })
                }
            };
            settled.push((index, outcome));
        }
        settled
    }))
    .await;

    let mut slots: Vec<Option<Settled<R>>> = std::iter::repeat_with(|| None)
        .take(items.len())
        .collect();
    for (index, outcome) in batches.into_iter().flatten() {
        slots[index] = Some(outcome);
    }

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Err(FetchError::Other("slot never settled".into()))))
        .collect()
}
