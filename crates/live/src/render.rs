//! Per-marker render readiness
//!
//! A marker tracks layout changes until its custom visual has rendered, then
//! freezes. Without this, every marker re-lays out on every frame.

use serde::Serialize;
use std::collections::HashSet;

/// How a marker should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Visual not ready yet; keep re-laying out
    Tracking,
    /// Visual ready; stop tracking view changes
    Frozen,
}

/// Readiness flags keyed by report id
#[derive(Debug, Clone, Default)]
pub struct RenderStabilizer {
    ready: HashSet<i64>,
}

impl RenderStabilizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self, id: i64) -> bool {
        self.ready.contains(&id)
    }

    /// Record that a marker's visual rendered; true the first time
    pub fn mark_ready(&mut self, id: i64) -> bool {
        self.ready.insert(id)
    }

    pub fn mode(&self, id: i64) -> RenderMode {
        if self.is_ready(id) {
            RenderMode::Frozen
        } else {
            RenderMode::Tracking
        }
    }

    /// Drop flags for ids no longer shown
    pub fn retain(&mut self, visible: &HashSet<i64>) {
        self.ready.retain(|id| visible.contains(id));
    }

    pub fn forget(&mut self, id: i64) -> bool {
        self.ready.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_freezes_once_ready() {
        let mut stabilizer = RenderStabilizer::new();
        assert_eq!(stabilizer.mode(1), RenderMode::Tracking);

        assert!(stabilizer.mark_ready(1));
        assert!(!stabilizer.mark_ready(1));
        assert_eq!(stabilizer.mode(1), RenderMode::Frozen);
        assert_eq!(stabilizer.mode(2), RenderMode::Tracking);
    }

    #[test]
    fn test_retain_drops_vanished_ids() {
        let mut stabilizer = RenderStabilizer::new();
        stabilizer.mark_ready(1);
        stabilizer.mark_ready(2);

        stabilizer.retain(&HashSet::from([2, 3]));
        assert!(!stabilizer.is_ready(1));
        assert!(stabilizer.is_ready(2));
        assert_eq!(stabilizer.len(), 1);

        // A reappearing id starts tracking again
        assert_eq!(stabilizer.mode(1), RenderMode::Tracking);
    }
}
