//! Point-in-time snapshots of the navigation stack.
//!
//! A snapshot records which states are on the stack, which one is active,
//! whether their tokens have fired, and the navigation history. States
//! themselves are not serializable, so a snapshot is for diagnostics and
//! test assertions, not for restoring a machine.

use crate::core::{NavigationHistory, StateId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::SnapshotError;

/// Version identifier for snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// One state on the stack at snapshot time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub id: StateId,
    pub name: String,
    pub depth: usize,
    /// True for the top of the stack
    pub active: bool,
    /// Whether the state's cancellation token has fired
    pub cancelled: bool,
}

/// Serializable view of a machine's stack.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StackSnapshot {
    /// Snapshot format version
    pub version: u32,

    /// Unique snapshot identifier
    pub id: String,

    /// When snapshot was taken
    pub taken_at: DateTime<Utc>,

    /// Label of the machine the snapshot came from
    pub label: String,

    /// Stack contents, root first
    pub frames: Vec<FrameSnapshot>,

    /// Navigation history at snapshot time
    pub history: NavigationHistory,
}

impl StackSnapshot {
    pub fn new(label: String, frames: Vec<FrameSnapshot>, history: NavigationHistory) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            id: Uuid::new_v4().to_string(),
            taken_at: Utc::now(),
            label,
            frames,
            history,
        }
    }

    /// Name of the active state, if any.
    pub fn active(&self) -> Option<&str> {
        self.frames
            .iter()
            .find(|frame| frame.active)
            .map(|frame| frame.name.as_str())
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: snapshot.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        Ok(snapshot)
    }
}
