// Point-in-time process attributes and the reader interface

use crate::killer::ProcessHandle;
use anyhow::Result;
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Attributes of a single process captured during one scan
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSnapshot {
    pub pid: i32,
    pub name: String,
    /// Owner of the process, `None` if the uid has no passwd entry
    pub username: Option<String>,
    pub effective_uid: u32,
    pub real_uid: u32,
    pub create_time: SystemTime,
    pub cpu_percent: f64,
    pub cpu_user_seconds: f64,
    pub cpu_system_seconds: f64,
    pub resident_memory_bytes: u64,
}

impl ProcessSnapshot {
    /// Time elapsed since the process started, zero if it appears to start in the future
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.create_time).unwrap_or_default()
    }

    /// Total CPU time consumed (user + system)
    pub fn cpu_usage(&self) -> Duration {
        Duration::try_from_secs_f64(self.cpu_user_seconds + self.cpu_system_seconds)
            .unwrap_or_default()
    }
}

impl std::fmt::Display for ProcessSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PID {} ({}): user {}, {} bytes RSS, {:.1}% CPU",
            self.pid,
            self.name,
            self.username.as_deref().unwrap_or("?"),
            self.resident_memory_bytes,
            self.cpu_percent
        )
    }
}

/// Per-process read failures
///
/// The first three are ordinary races in a live process table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("process vanished")]
    Vanished,
    #[error("access denied")]
    AccessDenied,
    #[error("zombie process")]
    Zombie,
    #[error("read failed: {0}")]
    Other(String),
}

impl SnapshotError {
    /// Whether this is an expected race that should be skipped without noise
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Vanished | Self::AccessDenied | Self::Zombie)
    }
}

impl From<procfs::ProcError> for SnapshotError {
    fn from(err: procfs::ProcError) -> Self {
        match err {
            procfs::ProcError::NotFound(_) | procfs::ProcError::Incomplete(_) => Self::Vanished,
            procfs::ProcError::PermissionDenied(_) => Self::AccessDenied,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One enumerated process: its live handle and whatever could be read about it
pub type ScanEntry<H> = (H, Result<ProcessSnapshot, SnapshotError>);

/// Source of process snapshots
pub trait SnapshotReader {
    type Handle: ProcessHandle;

    /// Start a fresh pass over the process table.
    ///
    /// An error here means the table itself could not be read.
    fn enumerate(&self) -> Result<Box<dyn Iterator<Item = ScanEntry<Self::Handle>> + '_>>;
}
