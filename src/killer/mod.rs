// Process matching and termination module

mod events;
mod filter;
mod search;
pub mod signals;
mod terminate;

pub use events::{EventSink, LogSink, TerminationEvent};
pub use filter::{matches, FilterConfig, DEFAULT_MIN_UID};
pub use search::{ProcessSearch, ScanStatistics};
pub use signals::{ExitStatus, KillResult};
pub use terminate::{
    TerminationSummary, Terminator, DEFAULT_GRACE_PERIOD, DEFAULT_POLL_INTERVAL,
};

use crate::monitor::ProcessSnapshot;
use nix::sys::signal::Signal;

/// Live handle to a process that can be re-checked and signaled
pub trait ProcessHandle: Send + Sync {
    fn pid(&self) -> i32;

    /// Whether the process still exists and is not a zombie
    fn is_running(&self) -> bool;

    fn send_signal(&self, signal: Signal) -> KillResult;

    /// `Some` once the process has exited
    fn poll_exit(&self) -> Option<ExitStatus>;
}

/// A process that passed the filter, with the snapshot it was matched on
#[derive(Debug, Clone)]
pub struct MatchedProcess<H> {
    pub handle: H,
    pub snapshot: ProcessSnapshot,
}
