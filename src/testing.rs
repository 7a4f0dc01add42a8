// Fakes shared by unit tests

use crate::killer::{
    EventSink, ExitStatus, KillResult, MatchedProcess, ProcessHandle, TerminationEvent,
};
use crate::monitor::{Clock, ProcessSnapshot, ScanEntry, SnapshotError, SnapshotReader};
use nix::sys::signal::Signal;
use std::cell::RefCell;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Snapshot of a small process owned by `uid`, started at the epoch
pub fn snapshot(pid: i32, uid: u32) -> ProcessSnapshot {
    ProcessSnapshot {
        pid,
        name: format!("fake-{pid}"),
        username: Some("alice".to_string()),
        effective_uid: uid,
        real_uid: uid,
        create_time: UNIX_EPOCH,
        cpu_percent: 0.0,
        cpu_user_seconds: 0.0,
        cpu_system_seconds: 0.0,
        resident_memory_bytes: 4096,
    }
}

pub fn matched(handle: FakeProcess) -> MatchedProcess<FakeProcess> {
    let snapshot = snapshot(handle.pid, 2000);
    MatchedProcess { handle, snapshot }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnTerm {
    Ignore,
    ExitAfter(Duration),
}

#[derive(Debug, Default)]
struct FakeState {
    running: bool,
    terminated_at: Option<Instant>,
    signals: Vec<(Signal, Instant)>,
}

/// Process stand-in that records the signals it receives
#[derive(Debug)]
pub struct FakeProcess {
    pid: i32,
    on_term: OnTerm,
    vanishes_on_signal: bool,
    denies_signals: bool,
    state: Mutex<FakeState>,
}

impl FakeProcess {
    /// A running process that ignores SIGTERM
    pub fn new(pid: i32) -> Self {
        Self {
            pid,
            on_term: OnTerm::Ignore,
            vanishes_on_signal: false,
            denies_signals: false,
            state: Mutex::new(FakeState {
                running: true,
                ..FakeState::default()
            }),
        }
    }

    pub fn exits_on_term(self) -> Self {
        self.exits_after(Duration::ZERO)
    }

    pub fn exits_after(mut self, delay: Duration) -> Self {
        self.on_term = OnTerm::ExitAfter(delay);
        self
    }

    /// Already exited before the termination run
    pub fn gone(self) -> Self {
        self.state.lock().unwrap().running = false;
        self
    }

    /// Exists at the liveness check but is gone when signaled
    pub fn vanishes_on_signal(mut self) -> Self {
        self.vanishes_on_signal = true;
        self
    }

    pub fn denies_signals(mut self) -> Self {
        self.denies_signals = true;
        self
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.state
            .lock()
            .unwrap()
            .signals
            .iter()
            .map(|(sig, _)| *sig)
            .collect()
    }

    pub fn signal_time(&self, signal: Signal) -> Option<Instant> {
        self.state
            .lock()
            .unwrap()
            .signals
            .iter()
            .find(|(sig, _)| *sig == signal)
            .map(|(_, at)| *at)
    }

    fn refresh(&self, state: &mut FakeState) {
        if let (OnTerm::ExitAfter(delay), Some(at)) = (self.on_term, state.terminated_at) {
            if at.elapsed() >= delay {
                state.running = false;
            }
        }
    }
}

impl ProcessHandle for FakeProcess {
    fn pid(&self) -> i32 {
        self.pid
    }

    fn is_running(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        self.refresh(&mut state);
        state.running
    }

    fn send_signal(&self, signal: Signal) -> KillResult {
        let mut state = self.state.lock().unwrap();
        if self.vanishes_on_signal {
            state.running = false;
            return KillResult::NotFound;
        }
        if self.denies_signals {
            return KillResult::PermissionDenied;
        }

        let now = Instant::now();
        state.signals.push((signal, now));
        match signal {
            Signal::SIGTERM => state.terminated_at = Some(now),
            Signal::SIGKILL => state.running = false,
            _ => {}
        }
        KillResult::Success
    }

    fn poll_exit(&self) -> Option<ExitStatus> {
        let mut state = self.state.lock().unwrap();
        self.refresh(&mut state);
        if state.running {
            return None;
        }
        let last = state.signals.last().map(|(sig, _)| *sig as i32);
        Some(last.map_or(ExitStatus::Code(0), ExitStatus::Signaled))
    }
}

/// Reader over a fixed list of entries
pub struct FakeReader {
    entries: Vec<(i32, Result<ProcessSnapshot, SnapshotError>)>,
    fail: bool,
}

impl FakeReader {
    pub fn new(entries: Vec<(i32, Result<ProcessSnapshot, SnapshotError>)>) -> Self {
        Self {
            entries,
            fail: false,
        }
    }

    /// Reader whose process table cannot be opened
    pub fn failing() -> Self {
        Self {
            entries: Vec::new(),
            fail: true,
        }
    }
}

impl SnapshotReader for FakeReader {
    type Handle = FakeProcess;

    fn enumerate(&self) -> anyhow::Result<Box<dyn Iterator<Item = ScanEntry<FakeProcess>> + '_>> {
        if self.fail {
            anyhow::bail!("process table unavailable");
        }
        Ok(Box::new(
            self.entries
                .iter()
                .map(|(pid, result)| (FakeProcess::new(*pid), result.clone())),
        ))
    }
}

/// Clock stuck at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub SystemTime);

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        self.0
    }
}

/// Sink that keeps every event for inspection
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: RefCell<Vec<TerminationEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<TerminationEvent> {
        self.events.borrow().clone()
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: &TerminationEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
