// Proc Sweeper - stale process search and termination library

pub mod config;
pub mod killer;
pub mod monitor;
pub mod sweep;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::Config;
pub use killer::{FilterConfig, MatchedProcess, ProcessHandle, ProcessSearch, Terminator};
pub use monitor::{ProcHandle, ProcessSnapshot, ProcfsReader};

/// Maximum length of a process name or command line written to the log
const MAX_LOG_FIELD_LENGTH: usize = 256;

/// Make an untrusted string (e.g. a process name) safe for a single log line
pub fn sanitize_for_log(s: &str) -> String {
    s.chars()
        .take(MAX_LOG_FIELD_LENGTH)
        .map(|c| if c.is_control() { '?' } else { c })
        .collect()
}
