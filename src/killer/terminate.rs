// SIGTERM, bounded wait, SIGKILL escalation

use super::events::{EventSink, TerminationEvent};
use super::signals::{ExitStatus, KillResult};
use super::{MatchedProcess, ProcessHandle};
use nix::sys::signal::Signal;
use std::thread;
use std::time::{Duration, Instant};

/// Time matched processes get to exit after SIGTERM
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(30);

/// How often pending processes are checked during the grace period
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of a termination run, by pid
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminationSummary {
    /// Gone before any signal was sent
    pub skipped: Vec<i32>,
    /// Exited after SIGTERM within the grace period
    pub exited: Vec<i32>,
    /// Still running at the deadline and sent SIGKILL
    pub force_killed: Vec<i32>,
    /// Could not be signaled (e.g. permission denied)
    pub failed: Vec<i32>,
}

/// Graceful-then-forceful termination of matched processes
#[derive(Debug, Clone, Copy)]
pub struct Terminator {
    grace: Duration,
    poll_interval: Duration,
}

impl Default for Terminator {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}

impl Terminator {
    pub const fn new(grace: Duration) -> Self {
        Self {
            grace,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Terminate every matched process.
    ///
    /// All signaled processes share one deadline; survivors get SIGKILL.
    pub fn terminate<H: ProcessHandle>(
        &self,
        matched: &[MatchedProcess<H>],
        sink: &dyn EventSink,
    ) -> TerminationSummary {
        let mut summary = TerminationSummary::default();

        let signaled = Self::signal_all(matched, sink, &mut summary);
        if signaled.is_empty() {
            return summary;
        }

        sink.record(&TerminationEvent::GracePeriodStarted {
            count: signaled.len(),
            grace: self.grace,
        });

        let survivors = self.wait_for_exit(&signaled, sink, &mut summary);
        for process in survivors {
            Self::force_kill(process, sink, &mut summary);
        }

        summary
    }

    fn signal_all<'a, H: ProcessHandle>(
        matched: &'a [MatchedProcess<H>],
        sink: &dyn EventSink,
        summary: &mut TerminationSummary,
    ) -> Vec<&'a MatchedProcess<H>> {
        let mut signaled = Vec::with_capacity(matched.len());

        for process in matched {
            let pid = process.handle.pid();

            // May already be gone, e.g. a child of something killed earlier in this batch
            if !process.handle.is_running() {
                log::debug!("Process {pid} already exited, not signaling");
                summary.skipped.push(pid);
                continue;
            }

            match process.handle.send_signal(Signal::SIGTERM) {
                KillResult::Success => {
                    sink.record(&TerminationEvent::SignalSent {
                        pid,
                        name: process.snapshot.name.clone(),
                        signal: Signal::SIGTERM,
                    });
                    signaled.push(process);
                }
                KillResult::NotFound => {
                    log::debug!("Process {pid} vanished before SIGTERM");
                    summary.skipped.push(pid);
                }
                failure => {
                    sink.record(&TerminationEvent::SignalFailed {
                        pid,
                        name: process.snapshot.name.clone(),
                        signal: Signal::SIGTERM,
                        reason: failure.description().to_string(),
                    });
                    summary.failed.push(pid);
                }
            }
        }

        signaled
    }

    /// Wait for all signaled processes against a single deadline.
    ///
    /// Exits are recorded as they are observed. Returns the processes still
    /// running when the deadline passed.
    fn wait_for_exit<'a, H: ProcessHandle>(
        &self,
        signaled: &[&'a MatchedProcess<H>],
        sink: &dyn EventSink,
        summary: &mut TerminationSummary,
    ) -> Vec<&'a MatchedProcess<H>> {
        let deadline = Instant::now() + self.grace;
        let mut pending = signaled.to_vec();

        loop {
            pending.retain(|process| match process.handle.poll_exit() {
                Some(status) => {
                    let pid = process.handle.pid();
                    sink.record(&TerminationEvent::Exited {
                        pid,
                        name: process.snapshot.name.clone(),
                        status,
                    });
                    summary.exited.push(pid);
                    false
                }
                None => true,
            });

            let now = Instant::now();
            if pending.is_empty() || now >= deadline {
                return pending;
            }
            thread::sleep(self.poll_interval.min(deadline - now));
        }
    }

    fn force_kill<H: ProcessHandle>(
        process: &MatchedProcess<H>,
        sink: &dyn EventSink,
        summary: &mut TerminationSummary,
    ) {
        let pid = process.handle.pid();
        let name = process.snapshot.name.clone();

        match process.handle.send_signal(Signal::SIGKILL) {
            KillResult::Success => {
                sink.record(&TerminationEvent::ForceKilled { pid, name });
                summary.force_killed.push(pid);
            }
            KillResult::NotFound => {
                // Exited right at the deadline
                let status = process.handle.poll_exit().unwrap_or(ExitStatus::Unknown);
                sink.record(&TerminationEvent::Exited { pid, name, status });
                summary.exited.push(pid);
            }
            failure => {
                sink.record(&TerminationEvent::SignalFailed {
                    pid,
                    name,
                    signal: Signal::SIGKILL,
                    reason: failure.description().to_string(),
                });
                summary.failed.push(pid);
            }
        }
    }
}
