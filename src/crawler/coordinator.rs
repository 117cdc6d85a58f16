//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding and draining the frontier
//! - Dispatching fetch+extract tasks under the concurrency gate
//! - Claiming discovered links at their minimum depth
//! - Enforcing the crawl deadline
//! - Feeding page results into the aggregator

use crate::config::Config;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::page::{CrawlTarget, PageResult};
use crate::crawler::parser::{analyze_page, LinkScope};
use crate::crawler::scheduler::{fetch_with_retry, RetryPolicy, ScheduledTarget, Scheduler};
use crate::output::{Aggregator, CrawlInfo, SiteResult};
use crate::state::{Claim, TargetState, VisitedSet};
use crate::url::{extract_domain, normalize_with, DomainPolicy, NormalizedUrl, QueryPolicy};
use crate::ScrapeError;
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

const PROGRESS_INTERVAL: usize = 10;

/// Main crawler coordinator structure
///
/// Owns the frontier, the visited set and the aggregator. Only the coordinator
/// touches them; spawned tasks get a cloned client, the shared link scope and
/// their own permit.
pub struct Coordinator {
    client: Client,
    scope: Arc<LinkScope>,
    retry: RetryPolicy,
    scheduler: Scheduler,
    visited: VisitedSet,
    aggregator: Aggregator,
    seed: NormalizedUrl,
    max_depth: u32,
    crawl_timeout: Duration,
    truncated: bool,
}

impl Coordinator {
    /// Creates a coordinator for one crawl starting at `seed`
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(ScrapeError)` - The HTTP client could not be built
    pub fn new(config: &Config, seed: NormalizedUrl) -> Result<Self, ScrapeError> {
        let client = build_http_client(&config.user_agent)?;
        let scope = LinkScope::new(
            seed.as_url().clone(),
            DomainPolicy::from(&config.crawler),
            QueryPolicy::from(&config.crawler),
        );

        Ok(Self {
            client,
            scope: Arc::new(scope),
            retry: RetryPolicy::from(&config.crawler),
            scheduler: Scheduler::new(config.crawler.max_concurrent_requests as usize),
            visited: VisitedSet::new(),
            aggregator: Aggregator::new(),
            seed,
            max_depth: config.crawler.max_depth,
            crawl_timeout: config.crawler.crawl_timeout(),
            truncated: false,
        })
    }

    /// Runs the crawl to completion or until the deadline passes
    ///
    /// Page failures are recorded in the result; this never fails.
    pub async fn run(mut self, company_name: String, config_hash: Option<String>) -> SiteResult {
        let started_at = Utc::now();
        let start_time = Instant::now();
        let deadline = tokio::time::Instant::now() + self.crawl_timeout;
        let mut tasks: JoinSet<PageResult> = JoinSet::new();

        info!(
            "Starting crawl of {} (max depth {}, timeout {:?})",
            self.seed, self.max_depth, self.crawl_timeout
        );
        self.enqueue(self.seed.clone(), 0);

        loop {
            if tasks.is_empty() {
                // Covers tasks that panicked without reporting their depth
                self.scheduler.reset_in_flight();
            }
            if !self.truncated {
                self.dispatch_ready(&mut tasks);
            }
            if tasks.is_empty() {
                break;
            }

            let joined = tokio::select! {
                joined = tasks.join_next() => joined,
                _ = tokio::time::sleep_until(deadline), if !self.truncated => {
                    warn!(
                        "Crawl timeout reached after {:?}; waiting for {} in-flight pages",
                        self.crawl_timeout,
                        tasks.len()
                    );
                    self.truncated = true;
                    continue;
                }
            };

            match joined {
                Some(Ok(result)) => self.handle_result(result, start_time),
                Some(Err(e)) => error!("Crawl task failed: {}", e),
                None => break,
            }
        }

        let pending_targets = self.visited.count_in(TargetState::Pending);
        let elapsed = start_time.elapsed();
        info!(
            "Crawl completed: {} pages crawled in {:?}{}",
            self.aggregator.pages(),
            elapsed,
            if self.truncated { " (truncated)" } else { "" }
        );

        let base_domain = extract_domain(self.seed.as_url()).unwrap_or_default();
        self.aggregator.finish(CrawlInfo {
            source_url: self.seed.to_string(),
            company_name,
            base_domain,
            max_depth: self.max_depth,
            config_hash,
            started_at,
            elapsed,
            truncated: self.truncated,
            pending_targets,
        })
    }

    /// Claims `url` at `depth` and queues it if it is new or now shallower
    fn enqueue(&mut self, url: NormalizedUrl, depth: u32) {
        match self.visited.claim(&url, depth) {
            Claim::New => {
                debug!("Queued {} at depth {}", url, depth);
                self.scheduler.push(CrawlTarget::new(url, depth));
            }
            Claim::Shallower { previous } => {
                debug!("Re-queued {} at depth {} (was {})", url, depth, previous);
                self.scheduler.push(CrawlTarget::new(url, depth));
            }
            Claim::Seen => {}
        }
    }

    /// Spawns a task for every target the scheduler will release right now
    fn dispatch_ready(&mut self, tasks: &mut JoinSet<PageResult>) {
        while let Some(scheduled) = self.scheduler.next_ready(&self.visited) {
            let depth = scheduled.target.depth;
            if let Err(e) = self.visited.mark_dispatched(&scheduled.target.url) {
                warn!("Skipping {}: {}", scheduled.target.url, e);
                self.scheduler.finish(depth);
                continue;
            }

            debug!("Dispatching {} at depth {}", scheduled.target.url, depth);
            tasks.spawn(crawl_page(
                self.client.clone(),
                Arc::clone(&self.scope),
                self.retry,
                scheduled,
            ));
        }
    }

    fn handle_result(&mut self, result: PageResult, start_time: Instant) {
        self.scheduler.finish(result.depth);
        if let Err(e) = self.visited.mark_finished(&result.url, result.is_success()) {
            warn!("Unexpected result for {}: {}", result.url, e);
        }

        if let Some(redirected) = &result.redirected_to {
            if self.visited.record_redirect(redirected, result.depth) {
                debug!("{} redirected to {}", result.url, redirected);
            }
        }

        let next_depth = result.depth + 1;
        if result.is_success() && next_depth <= self.max_depth {
            for link in &result.links {
                self.enqueue(link.clone(), next_depth);
            }
        }

        self.aggregator.add(result);

        let pages_crawled = self.aggregator.pages();
        if pages_crawled % PROGRESS_INTERVAL == 0 {
            let rate = pages_crawled as f64 / start_time.elapsed().as_secs_f64();
            info!(
                "Progress: {} pages crawled, {} in frontier, {} in flight, {:.2} pages/sec",
                pages_crawled,
                self.scheduler.frontier_size(),
                self.scheduler.in_flight(),
                rate
            );
        }
    }
}

/// Fetches and analyzes one page; the permit is released when this returns
async fn crawl_page(
    client: Client,
    scope: Arc<LinkScope>,
    retry: RetryPolicy,
    scheduled: ScheduledTarget,
) -> PageResult {
    let ScheduledTarget { target, permit } = scheduled;

    let result = match fetch_with_retry(&client, &target.url, &retry).await {
        Ok(document) => {
            let analysis = analyze_page(
                &document.body,
                target.url.as_url(),
                &document.final_url,
                target.depth,
                &scope,
            );
            let redirected_to = normalize_with(document.final_url.as_str(), None, scope.query_policy)
                .ok()
                .filter(|url| *url != target.url);
            debug!(
                "Fetched {} ({} links, {} text blocks)",
                target.url,
                analysis.links.len(),
                analysis.extracted.text.len()
            );
            PageResult {
                url: target.url,
                depth: target.depth,
                html: document.body,
                extracted: analysis.extracted,
                links: analysis.links,
                error: None,
                status_code: Some(document.status_code),
                redirected_to,
                fetched_at: Utc::now(),
            }
        }
        Err(error) => {
            warn!(
                "Giving up on {} after {} retries: {}",
                target.url, error.retry_count, error.message
            );
            PageResult::failed(target, error)
        }
    };

    drop(permit);
    result
}

/// Runs a complete crawl of the site at `seed`
///
/// # Returns
///
/// * `Ok(SiteResult)` - The crawl ran; individual pages may have failed
/// * `Err(ScrapeError)` - The crawl could not start
pub async fn run_crawl(
    config: &Config,
    seed: NormalizedUrl,
    company_name: &str,
    config_hash: Option<String>,
) -> Result<SiteResult, ScrapeError> {
    let coordinator = Coordinator::new(config, seed)?;
    Ok(coordinator.run(company_name.to_string(), config_hash).await)
}
