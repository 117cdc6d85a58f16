//! Scheduler for the crawl frontier, admission gate and retry policy
//!
//! This module handles:
//! - The depth-ordered frontier (shallowest first, FIFO within a depth)
//! - Global concurrency limiting via an owned-permit semaphore
//! - The depth gate that keeps discovery depths minimal under concurrency
//! - Retrying retryable fetch failures with exponential backoff

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{fetch, Document, FetchOutcome};
use crate::crawler::page::{CrawlTarget, PageError};
use crate::state::{TargetState, VisitedSet};
use crate::url::NormalizedUrl;
use reqwest::Client;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// A frontier entry
#[derive(Debug, Clone)]
struct QueuedTarget {
    target: CrawlTarget,
    /// Discovery order, for FIFO within a depth
    seq: u64,
}

// BinaryHeap is a max-heap: reverse so the smallest (depth, seq) pops first
impl Ord for QueuedTarget {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .target
            .depth
            .cmp(&self.target.depth)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedTarget {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedTarget {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for QueuedTarget {}

/// A target cleared for dispatch, holding its concurrency permit
///
/// The permit must move into the spawned task; dropping it frees the slot.
pub struct ScheduledTarget {
    pub target: CrawlTarget,
    pub permit: OwnedSemaphorePermit,
}

/// Scheduler manages the frontier queue and admission
///
/// The scheduler coordinates:
/// - Global concurrency limits (max fetch+extract tasks in flight)
/// - The depth gate: a target at depth `d` is only handed out while no in-flight
///   task has depth below `d - 1`
/// - Shallowest-first selection from the frontier
///
/// Re-queued targets leave their older, deeper entry behind; such stale entries
/// are discarded when they reach the front.
pub struct Scheduler {
    semaphore: Arc<Semaphore>,
    frontier: BinaryHeap<QueuedTarget>,
    /// Depth -> number of tasks in flight at that depth
    in_flight: BTreeMap<u32, usize>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new(max_concurrent_requests: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent_requests)),
            frontier: BinaryHeap::new(),
            in_flight: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Adds a target to the frontier
    pub fn push(&mut self, target: CrawlTarget) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.frontier.push(QueuedTarget { target, seq });
    }

    /// Gets the next target that may be dispatched right now
    ///
    /// Returns `None` when the frontier is empty, the depth gate is closed, or
    /// every permit is taken. Call again after an in-flight task finishes.
    pub fn next_ready(&mut self, visited: &VisitedSet) -> Option<ScheduledTarget> {
        loop {
            let head = self.frontier.peek()?;
            if is_stale(&head.target, visited) {
                self.frontier.pop();
                continue;
            }

            if !self.gate_allows(head.target.depth) {
                return None;
            }

            let permit = self.semaphore.clone().try_acquire_owned().ok()?;
            let queued = self.frontier.pop()?;
            *self.in_flight.entry(queued.target.depth).or_default() += 1;

            return Some(ScheduledTarget {
                target: queued.target,
                permit,
            });
        }
    }

    /// Records that a task dispatched at `depth` has finished
    pub fn finish(&mut self, depth: u32) {
        if let Some(count) = self.in_flight.get_mut(&depth) {
            *count -= 1;
            if *count == 0 {
                self.in_flight.remove(&depth);
            }
        }
    }

    /// Forgets in-flight bookkeeping once no task remains
    pub fn reset_in_flight(&mut self) {
        self.in_flight.clear();
    }

    fn gate_allows(&self, depth: u32) -> bool {
        match self.in_flight.keys().next() {
            Some(&shallowest) => shallowest + 1 >= depth,
            None => true,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.values().sum()
    }

    /// Number of frontier entries, stale ones included
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty()
    }
}

/// An entry is stale once its target left `Pending` or was re-queued shallower
fn is_stale(target: &CrawlTarget, visited: &VisitedSet) -> bool {
    visited.state_of(&target.url) != Some(TargetState::Pending)
        || visited.depth_of(&target.url) != Some(target.depth)
}

/// How failed fetches are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first
    pub max_retries: u32,
    /// Delay before the first retry; doubles each time
    pub base_delay: Duration,
    /// Timeout for every single attempt
    pub page_timeout: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

impl From<&CrawlerConfig> for RetryPolicy {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.retry_delay(),
            page_timeout: config.page_timeout(),
        }
    }
}

/// Fetches a URL, retrying retryable failures per `policy`
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Timeout | Retry up to `max_retries` times |
/// | HTTP 5xx | Retry up to `max_retries` times |
/// | Connection refused / reset | Retry up to `max_retries` times |
/// | HTTP 4xx | Fail immediately |
/// | Redirect loop, invalid body | Fail immediately |
///
/// On failure the returned [`PageError`] carries the number of retries performed.
pub async fn fetch_with_retry(
    client: &Client,
    url: &NormalizedUrl,
    policy: &RetryPolicy,
) -> Result<Document, PageError> {
    let mut retries = 0;

    loop {
        match fetch(client, url.as_url(), policy.page_timeout).await {
            FetchOutcome::Ok(document) => return Ok(document),
            FetchOutcome::Fatal(error) => return Err(PageError::from_fetch(url, &error, retries)),
            FetchOutcome::Retryable(error) => {
                if retries >= policy.max_retries {
                    return Err(PageError::from_fetch(url, &error, retries));
                }
                retries += 1;
                let delay = policy.delay_for(retries);
                debug!(
                    "Retrying {} in {:?} (attempt {} of {}): {}",
                    url,
                    delay,
                    retries + 1,
                    policy.max_retries + 1,
                    error
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserAgentConfig;
    use crate::crawler::build_http_client;
    use crate::crawler::PageErrorKind;
    use crate::url::normalize;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn target(path: &str, depth: u32) -> CrawlTarget {
        CrawlTarget::new(normalize(&format!("https://example.com{}", path), None).unwrap(), depth)
    }

    fn claim_and_push(scheduler: &mut Scheduler, visited: &mut VisitedSet, t: CrawlTarget) {
        visited.claim(&t.url, t.depth);
        scheduler.push(t);
    }

    #[test]
    fn test_new_scheduler() {
        let scheduler = Scheduler::new(4);
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.in_flight(), 0);
    }

    #[test]
    fn test_shallowest_first_then_fifo() {
        let mut scheduler = Scheduler::new(10);
        let mut visited = VisitedSet::new();
        claim_and_push(&mut scheduler, &mut visited, target("/b", 1));
        claim_and_push(&mut scheduler, &mut visited, target("/seed", 0));
        claim_and_push(&mut scheduler, &mut visited, target("/c", 1));

        let order: Vec<_> = std::iter::from_fn(|| {
            let next = scheduler.next_ready(&visited)?;
            visited.mark_dispatched(&next.target.url).unwrap();
            Some(next.target.url.as_url().path().to_string())
        })
        .collect();
        assert_eq!(order, vec!["/seed", "/b", "/c"]);
    }

    #[test]
    fn test_depth_gate_waits_for_shallow_tasks() {
        let mut scheduler = Scheduler::new(10);
        let mut visited = VisitedSet::new();
        claim_and_push(&mut scheduler, &mut visited, target("/", 0));
        claim_and_push(&mut scheduler, &mut visited, target("/a", 1));
        claim_and_push(&mut scheduler, &mut visited, target("/a/deep", 2));

        let seed = scheduler.next_ready(&visited).unwrap();
        visited.mark_dispatched(&seed.target.url).unwrap();
        let a = scheduler.next_ready(&visited).unwrap();
        visited.mark_dispatched(&a.target.url).unwrap();

        // Depth 2 must wait while the depth-0 task runs
        assert!(scheduler.next_ready(&visited).is_none());

        scheduler.finish(0);
        let deep = scheduler.next_ready(&visited).unwrap();
        assert_eq!(deep.target.depth, 2);
    }

    #[test]
    fn test_permits_bound_concurrency() {
        let mut scheduler = Scheduler::new(1);
        let mut visited = VisitedSet::new();
        claim_and_push(&mut scheduler, &mut visited, target("/x", 1));
        claim_and_push(&mut scheduler, &mut visited, target("/y", 1));

        let first = scheduler.next_ready(&visited).unwrap();
        visited.mark_dispatched(&first.target.url).unwrap();
        assert!(scheduler.next_ready(&visited).is_none());

        drop(first.permit);
        scheduler.finish(1);
        assert!(scheduler.next_ready(&visited).is_some());
    }

    #[test]
    fn test_requeued_target_skips_stale_entry() {
        let mut scheduler = Scheduler::new(10);
        let mut visited = VisitedSet::new();
        claim_and_push(&mut scheduler, &mut visited, target("/page", 2));

        // Rediscovered shallower: re-queue at depth 1
        let shallower = target("/page", 1);
        visited.claim(&shallower.url, 1);
        scheduler.push(shallower);

        let first = scheduler.next_ready(&visited).unwrap();
        assert_eq!(first.target.depth, 1);
        visited.mark_dispatched(&first.target.url).unwrap();
        scheduler.finish(1);

        assert!(scheduler.next_ready(&visited).is_none());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_retry_delay_doubles() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            page_timeout: Duration::from_secs(30),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2000));
    }

    #[test]
    fn test_retry_policy_from_config() {
        let policy = RetryPolicy::from(&CrawlerConfig::default());
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert_eq!(policy.page_timeout, Duration::from_secs(30));
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(10),
            page_timeout: Duration::from_secs(5),
        }
    }

    fn server_url(server: &MockServer, p: &str) -> NormalizedUrl {
        normalize(&format!("{}{}", server.uri(), p), None).unwrap()
    }

    #[tokio::test]
    async fn test_persistent_server_error_exhausts_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let client = build_http_client(&UserAgentConfig::default()).unwrap();
        let error = fetch_with_retry(&client, &server_url(&server, "/flaky"), &fast_policy())
            .await
            .unwrap_err();

        assert_eq!(error.error_type, PageErrorKind::Http5xx);
        assert_eq!(error.retry_count, 2);
        assert_eq!(error.status_code, Some(500));
    }

    #[tokio::test]
    async fn test_recovers_after_transient_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/recovering"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/recovering"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>back</p>"))
            .mount(&server)
            .await;

        let client = build_http_client(&UserAgentConfig::default()).unwrap();
        let document = fetch_with_retry(&client, &server_url(&server, "/recovering"), &fast_policy())
            .await
            .unwrap();
        assert!(document.body.contains("back"));
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = build_http_client(&UserAgentConfig::default()).unwrap();
        let error = fetch_with_retry(&client, &server_url(&server, "/gone"), &fast_policy())
            .await
            .unwrap_err();

        assert_eq!(error.error_type, PageErrorKind::Http4xx);
        assert_eq!(error.retry_count, 0);
    }
}
