//! Navigation history tracking.
//!
//! Provides immutable tracking of completed pushes and pops, following the
//! same record-returns-new-history style as the rest of the core.

use super::request::TransitionKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single completed push or pop.
///
/// # Example
///
/// ```rust
/// use navstack::core::{NavigationRecord, TransitionKind};
/// use chrono::Utc;
///
/// let record = NavigationRecord {
///     kind: TransitionKind::Push,
///     from: Some("MainMenu".to_string()),
///     to: Some("Launches".to_string()),
///     depth: 3,
///     timestamp: Utc::now(),
/// };
/// assert_eq!(record.kind, TransitionKind::Push);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NavigationRecord {
    /// Push or pop
    pub kind: TransitionKind,
    /// Top of the stack before the transition
    pub from: Option<String>,
    /// Top of the stack after the transition
    pub to: Option<String>,
    /// Stack depth after the transition
    pub depth: usize,
    /// When the transition completed
    pub timestamp: DateTime<Utc>,
}

/// Ordered, optionally bounded history of navigation records.
///
/// `record` does not mutate; it returns a new history with the record
/// appended, dropping the oldest entries beyond the limit.
///
/// # Example
///
/// ```rust
/// use navstack::core::{NavigationHistory, NavigationRecord, TransitionKind};
/// use chrono::Utc;
///
/// let history = NavigationHistory::new();
/// let history = history.record(NavigationRecord {
///     kind: TransitionKind::Push,
///     from: Some("Root".to_string()),
///     to: Some("Boot".to_string()),
///     depth: 2,
///     timestamp: Utc::now(),
/// });
/// let history = history.record(NavigationRecord {
///     kind: TransitionKind::Pop,
///     from: Some("Boot".to_string()),
///     to: Some("Root".to_string()),
///     depth: 1,
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(history.path(), vec!["Root", "Boot", "Root"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationHistory {
    records: Vec<NavigationRecord>,
    limit: Option<usize>,
}

impl NavigationHistory {
    /// Create an unbounded empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty history keeping at most `limit` records.
    pub fn limited(limit: usize) -> Self {
        Self {
            records: Vec::new(),
            limit: Some(limit),
        }
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, record: NavigationRecord) -> Self {
        let mut records = self.records.clone();
        records.push(record);
        if let Some(limit) = self.limit {
            let excess = records.len().saturating_sub(limit);
            records.drain(..excess);
        }
        Self {
            records,
            limit: self.limit,
        }
    }

    /// Names of the states that were on top, in order: the top before the
    /// first recorded transition, then the top after each one.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        if let Some(first) = self.records.first().and_then(|r| r.from.as_deref()) {
            path.push(first);
        }
        for record in &self.records {
            if let Some(to) = record.to.as_deref() {
                path.push(to);
            }
        }
        path
    }

    /// Time between the first and last retained records.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.records.first(), self.records.last()) {
            last.timestamp
                .signed_duration_since(first.timestamp)
                .to_std()
                .ok()
        } else {
            None
        }
    }

    pub fn records(&self) -> &[NavigationRecord] {
        &self.records
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(from: &str, to: &str, depth: usize) -> NavigationRecord {
        NavigationRecord {
            kind: TransitionKind::Push,
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            depth,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history = NavigationHistory::new();
        assert!(history.is_empty());
        assert!(history.path().is_empty());
        assert!(history.duration().is_none());
    }

    #[test]
    fn record_is_immutable() {
        let history = NavigationHistory::new();
        let next = history.record(push("Root", "Boot", 2));

        assert_eq!(history.len(), 0);
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn limited_history_drops_oldest() {
        let history = NavigationHistory::limited(2)
            .record(push("Root", "Boot", 2))
            .record(push("Boot", "Error", 3))
            .record(push("Error", "Retry", 4));

        assert_eq!(history.len(), 2);
        assert_eq!(history.path(), vec!["Boot", "Error", "Retry"]);
        assert_eq!(history.limit(), Some(2));
    }

    #[test]
    fn duration_spans_first_to_last() {
        let start = Utc::now();
        let mut first = push("Root", "Boot", 2);
        first.timestamp = start;
        let mut last = push("Boot", "Menu", 3);
        last.timestamp = start + chrono::Duration::milliseconds(250);

        let history = NavigationHistory::new().record(first).record(last);

        assert_eq!(
            history.duration(),
            Some(std::time::Duration::from_millis(250))
        );
    }

    #[test]
    fn history_serializes_correctly() {
        let history = NavigationHistory::limited(8).record(push("Root", "Menu", 2));

        let json = serde_json::to_string(&history).unwrap();
        let back: NavigationHistory = serde_json::from_str(&json).unwrap();

        assert_eq!(history, back);
    }
}
