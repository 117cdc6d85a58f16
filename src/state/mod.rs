//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `TargetState`: lifecycle of a single crawl target (pending, dispatched, completed, failed)
//! - `VisitedSet`: every URL the crawl has claimed, with its minimum discovery depth

mod page_state;
mod visited;

use crate::url::NormalizedUrl;
use thiserror::Error;

// Re-export main types
pub use page_state::TargetState;
pub use visited::{Claim, VisitedSet};

/// Errors raised by illegal bookkeeping on the visited set
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("Invalid state transition for {url}: {from} -> {to}")]
    InvalidTransition {
        url: String,
        from: TargetState,
        to: TargetState,
    },

    #[error("Target was never claimed: {0}")]
    UnknownTarget(String),
}

impl StateError {
    pub(crate) fn unknown(url: &NormalizedUrl) -> Self {
        Self::UnknownTarget(url.to_string())
    }
}
