//! The crawl's visited set
//!
//! Owned by the coordinator task. Every insert goes through [`VisitedSet::claim`],
//! which checks and inserts in one step so a URL can never be handed out twice.

use super::{StateError, TargetState};
use crate::url::NormalizedUrl;
use std::collections::HashMap;

/// Outcome of claiming a URL at some depth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// First time this URL is seen; the caller must enqueue it
    New,
    /// Still pending but now reachable at a smaller depth; the caller must re-enqueue it
    Shallower { previous: u32 },
    /// Already known at an equal or smaller depth, or already dispatched
    Seen,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    depth: u32,
    state: TargetState,
}

#[derive(Debug, Default)]
pub struct VisitedSet {
    entries: HashMap<NormalizedUrl, Entry>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically checks and records a URL discovered at `depth`
    pub fn claim(&mut self, url: &NormalizedUrl, depth: u32) -> Claim {
        match self.entries.get_mut(url) {
            None => {
                self.entries.insert(
                    url.clone(),
                    Entry {
                        depth,
                        state: TargetState::Pending,
                    },
                );
                Claim::New
            }
            Some(entry) if entry.state == TargetState::Pending && depth < entry.depth => {
                let previous = entry.depth;
                entry.depth = depth;
                Claim::Shallower { previous }
            }
            Some(_) => Claim::Seen,
        }
    }

    /// Claims a URL and reports whether it was newly added
    pub fn mark_visited(&mut self, url: &NormalizedUrl, depth: u32) -> bool {
        matches!(self.claim(url, depth), Claim::New)
    }

    pub fn is_visited(&self, url: &NormalizedUrl) -> bool {
        self.entries.contains_key(url)
    }

    /// Minimum depth at which the URL was discovered
    pub fn depth_of(&self, url: &NormalizedUrl) -> Option<u32> {
        self.entries.get(url).map(|e| e.depth)
    }

    pub fn state_of(&self, url: &NormalizedUrl) -> Option<TargetState> {
        self.entries.get(url).map(|e| e.state)
    }

    /// Moves a pending target to `Dispatched` and returns its recorded depth
    pub fn mark_dispatched(&mut self, url: &NormalizedUrl) -> Result<u32, StateError> {
        self.transition(url, TargetState::Dispatched)
    }

    /// Moves a dispatched target to `Completed` or `Failed`
    pub fn mark_finished(&mut self, url: &NormalizedUrl, succeeded: bool) -> Result<(), StateError> {
        let next = if succeeded {
            TargetState::Completed
        } else {
            TargetState::Failed
        };
        self.transition(url, next).map(|_| ())
    }

    fn transition(&mut self, url: &NormalizedUrl, next: TargetState) -> Result<u32, StateError> {
        let entry = self
            .entries
            .get_mut(url)
            .ok_or_else(|| StateError::unknown(url))?;

        if !entry.state.can_transition_to(next) {
            return Err(StateError::InvalidTransition {
                url: url.to_string(),
                from: entry.state,
                to: next,
            });
        }

        entry.state = next;
        Ok(entry.depth)
    }

    /// Records a URL that was reached through a redirect from another target
    ///
    /// Unknown or still pending URLs become `Completed` so they are never
    /// fetched on their own; returns whether anything changed.
    pub fn record_redirect(&mut self, url: &NormalizedUrl, depth: u32) -> bool {
        match self.entries.get_mut(url) {
            None => {
                self.entries.insert(
                    url.clone(),
                    Entry {
                        depth,
                        state: TargetState::Completed,
                    },
                );
                true
            }
            Some(entry) if entry.state == TargetState::Pending => {
                entry.state = TargetState::Completed;
                entry.depth = entry.depth.min(depth);
                true
            }
            Some(_) => false,
        }
    }

    /// Number of targets currently in `state`
    pub fn count_in(&self, state: TargetState) -> usize {
        self.entries.values().filter(|e| e.state == state).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
