// Termination events and where they are recorded

use super::signals::ExitStatus;
use crate::sanitize_for_log;
use nix::sys::signal::Signal;
use std::time::Duration;

/// Something the termination protocol did or observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationEvent {
    GracePeriodStarted { count: usize, grace: Duration },
    SignalSent { pid: i32, name: String, signal: Signal },
    Exited { pid: i32, name: String, status: ExitStatus },
    ForceKilled { pid: i32, name: String },
    SignalFailed { pid: i32, name: String, signal: Signal, reason: String },
}

impl std::fmt::Display for TerminationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GracePeriodStarted { count, grace } => write!(
                f,
                "Waiting up to {}s for {} process(es) to exit",
                grace.as_secs(),
                count
            ),
            Self::SignalSent { pid, name, signal } => write!(
                f,
                "Sent {} to process {} ({})",
                signal.as_str(),
                pid,
                sanitize_for_log(name)
            ),
            Self::Exited { pid, name, status } => write!(
                f,
                "Process {} ({}) exited: {}",
                pid,
                sanitize_for_log(name),
                status
            ),
            Self::ForceKilled { pid, name } => write!(
                f,
                "Process {} ({}) survived the grace period, sent SIGKILL",
                pid,
                sanitize_for_log(name)
            ),
            Self::SignalFailed {
                pid,
                name,
                signal,
                reason,
            } => write!(
                f,
                "Failed to send {} to process {} ({}): {}",
                signal.as_str(),
                pid,
                sanitize_for_log(name),
                reason
            ),
        }
    }
}

/// Receiver of termination events
pub trait EventSink {
    fn record(&self, event: &TerminationEvent);
}

/// Writes events through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&self, event: &TerminationEvent) {
        match event {
            TerminationEvent::SignalFailed { .. } => log::warn!("{event}"),
            _ => log::info!("{event}"),
        }
    }
}
