// Signal delivery and exit status collection

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

/// Result of a kill operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillResult {
    /// Signal was delivered
    Success,
    /// Process does not exist (anymore)
    NotFound,
    /// Permission denied (process owned by another user)
    PermissionDenied,
    /// Other error occurred
    Error(String),
}

impl KillResult {
    /// Get a human-readable description
    pub fn description(&self) -> &str {
        match self {
            Self::Success => "signal delivered",
            Self::NotFound => "not found",
            Self::PermissionDenied => "permission denied",
            Self::Error(msg) => msg,
        }
    }
}

/// How a terminated process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Exited normally with this code
    Code(i32),
    /// Terminated by this signal number
    Signaled(i32),
    /// Exit observed but the status belongs to another parent
    Unknown,
}

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code(code) => write!(f, "exit code {code}"),
            Self::Signaled(sig) => write!(f, "killed by signal {sig}"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Send a signal to a process
pub fn send_signal(pid: i32, sig: Signal) -> KillResult {
    match signal::kill(Pid::from_raw(pid), sig) {
        Ok(()) => KillResult::Success,
        Err(Errno::ESRCH) => KillResult::NotFound,
        Err(Errno::EPERM) => KillResult::PermissionDenied,
        Err(e) => KillResult::Error(format!("signal error: {e}")),
    }
}

/// Collect the exit status of a process that is no longer running.
///
/// Only children of this process have a status to collect; for anything
/// else the status is `Unknown`.
pub fn reap(pid: i32) -> ExitStatus {
    match waitpid(Pid::from_raw(pid), Some(WaitPidFlag::WNOHANG)) {
        Ok(WaitStatus::Exited(_, code)) => ExitStatus::Code(code),
        Ok(WaitStatus::Signaled(_, sig, _)) => ExitStatus::Signaled(sig as i32),
        Ok(_) => ExitStatus::Unknown,
        Err(Errno::ECHILD) => ExitStatus::Unknown,
        Err(e) => {
            log::debug!("waitpid({pid}) failed: {e}");
            ExitStatus::Unknown
        }
    }
}
