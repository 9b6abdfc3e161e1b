//! Persisted identity of the last pinned window.
//!
//! Window handles do not survive a relaunch, so the identity keeps just
//! enough to find the same window again: the owning app, a hash of the
//! title and the approximate bounds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::window::{TargetWindowRef, WindowBounds};

/// Slack added to each side of the stored bounds before matching, so small
/// moves between sessions still match.
pub const IDENTITY_MATCH_SLOP: f64 = 20.0;

/// Hex characters kept from the title digest.
const TITLE_HASH_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinnedIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    pub process_name: String,
    pub title_hash: String,
    pub bounds: WindowBounds,
    pub pinned_at: DateTime<Utc>,
}

impl PinnedIdentity {
    pub fn from_target(target: &TargetWindowRef) -> Self {
        Self {
            bundle_id: target.bundle_id.clone(),
            process_name: target.process_name.clone(),
            title_hash: hash_title(&target.title),
            bounds: target.bounds,
            pinned_at: Utc::now(),
        }
    }

    /// Same app (bundle id, or process name when no bundle id was stored)
    /// and the stored bounds, outset by [`IDENTITY_MATCH_SLOP`], intersect
    /// the candidate's current bounds.
    pub fn matches_candidate(
        &self,
        bundle_id: Option<&str>,
        process_name: &str,
        bounds: &WindowBounds,
    ) -> bool {
        let same_app = match self.bundle_id.as_deref() {
            Some(stored) => bundle_id == Some(stored),
            None => self.process_name == process_name,
        };

        same_app && self.bounds.outset(IDENTITY_MATCH_SLOP).intersects(bounds)
    }

    pub fn matches(&self, candidate: &TargetWindowRef) -> bool {
        self.matches_candidate(
            candidate.bundle_id.as_deref(),
            &candidate.process_name,
            &candidate.bounds,
        )
    }

    /// First matching candidate, preferring one whose title hash also matches.
    pub fn find_match<'a>(&self, candidates: &'a [TargetWindowRef]) -> Option<&'a TargetWindowRef> {
        let mut fallback = None;
        for candidate in candidates.iter().filter(|c| self.matches(c)) {
            if hash_title(&candidate.title) == self.title_hash {
                return Some(candidate);
            }
            fallback.get_or_insert(candidate);
        }
        fallback
    }
}

/// Truncated hex SHA-256 of a window title.
pub fn hash_title(title: &str) -> String {
    let digest = Sha256::digest(title.as_bytes());
    let mut hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex.truncate(TITLE_HASH_LEN);
    hex
}
