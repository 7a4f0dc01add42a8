// Process search: enumerate, filter, collect handles

use super::filter::FilterConfig;
use super::{MatchedProcess, ProcessHandle};
use crate::monitor::{Clock, SnapshotError, SnapshotReader};
use crate::sanitize_for_log;
use anyhow::{Context, Result};

/// Counters describing one pass over the process table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStatistics {
    pub scanned: usize,
    pub vanished: usize,
    pub access_denied: usize,
    pub zombies: usize,
    pub failed: usize,
    pub protected: usize,
    pub matched: usize,
}

impl ScanStatistics {
    fn record_skip(&mut self, error: &SnapshotError) {
        match error {
            SnapshotError::Vanished => self.vanished += 1,
            SnapshotError::AccessDenied => self.access_denied += 1,
            SnapshotError::Zombie => self.zombies += 1,
            SnapshotError::Other(_) => self.failed += 1,
        }
    }
}

impl std::fmt::Display for ScanStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Processes: {} scanned, {} matched, {} vanished, {} access denied, {} zombies, {} unreadable",
            self.scanned, self.matched, self.vanished, self.access_denied, self.zombies, self.failed
        )
    }
}

/// Finds processes reaching the configured thresholds
pub struct ProcessSearch {
    config: FilterConfig,
    protected_pids: Vec<i32>,
}

impl ProcessSearch {
    /// Create a search that never matches the current process
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            protected_pids: vec![std::process::id() as i32],
        }
    }

    /// Replace the set of pids that are never matched
    pub fn with_protected_pids(mut self, pids: Vec<i32>) -> Self {
        self.protected_pids = pids;
        self
    }

    /// Matched processes in enumeration order
    pub fn search<R: SnapshotReader>(
        &self,
        reader: &R,
        clock: &dyn Clock,
    ) -> Result<Vec<MatchedProcess<R::Handle>>> {
        let (matched, stats) = self.scan(reader, clock)?;
        log::debug!("{stats}");
        Ok(matched)
    }

    /// Like [`search`](Self::search), also returning scan counters
    pub fn scan<R: SnapshotReader>(
        &self,
        reader: &R,
        clock: &dyn Clock,
    ) -> Result<(Vec<MatchedProcess<R::Handle>>, ScanStatistics)> {
        let now = clock.now();
        let mut stats = ScanStatistics::default();
        let mut matched = Vec::new();

        let entries = reader
            .enumerate()
            .context("Failed to enumerate processes")?;

        for (handle, result) in entries {
            stats.scanned += 1;

            let snapshot = match result {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    if e.is_transient() {
                        log::trace!("Skipping process {}: {e}", handle.pid());
                    } else {
                        log::warn!("Skipping process {}: {e}", handle.pid());
                    }
                    stats.record_skip(&e);
                    continue;
                }
            };

            if self.protected_pids.contains(&snapshot.pid) {
                stats.protected += 1;
                continue;
            }

            if self.config.matches(&snapshot, now) {
                log::debug!(
                    "Matched process {} ({})",
                    snapshot.pid,
                    sanitize_for_log(&snapshot.name)
                );
                matched.push(MatchedProcess { handle, snapshot });
            }
        }

        stats.matched = matched.len();
        Ok((matched, stats))
    }
}
