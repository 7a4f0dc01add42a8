// Process table access through /proc

use super::snapshot::{ProcessSnapshot, ScanEntry, SnapshotError, SnapshotReader};
use crate::killer::signals::{reap, send_signal};
use crate::killer::{ExitStatus, KillResult, ProcessHandle};
use anyhow::{Context, Result};
use nix::sys::signal::Signal;
use nix::unistd::{Uid, User};
use procfs::process::{all_processes, Process, Stat};
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, Instant, UNIX_EPOCH};

/// CPU tick counter of a process at baseline time
#[derive(Debug, Clone, Copy)]
struct CpuSample {
    start_ticks: u64,
    total_ticks: u64,
}

/// Live handle to a process found in /proc
///
/// Remembers the start time so a recycled pid is not mistaken for the
/// original process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcHandle {
    pid: i32,
    start_ticks: Option<u64>,
}

impl ProcHandle {
    pub const fn new(pid: i32, start_ticks: u64) -> Self {
        Self {
            pid,
            start_ticks: Some(start_ticks),
        }
    }

    /// Handle for a pid whose start time could not be read
    pub const fn unverified(pid: i32) -> Self {
        Self {
            pid,
            start_ticks: None,
        }
    }
}

impl ProcessHandle for ProcHandle {
    fn pid(&self) -> i32 {
        self.pid
    }

    fn is_running(&self) -> bool {
        let Ok(stat) = Process::new(self.pid).and_then(|p| p.stat()) else {
            return false;
        };
        if stat.state == 'Z' {
            return false;
        }
        self.start_ticks.map_or(true, |ticks| ticks == stat.starttime)
    }

    fn send_signal(&self, signal: Signal) -> KillResult {
        send_signal(self.pid, signal)
    }

    fn poll_exit(&self) -> Option<ExitStatus> {
        if self.is_running() {
            None
        } else {
            Some(reap(self.pid))
        }
    }
}

/// Snapshot reader backed by the `procfs` crate
pub struct ProcfsReader {
    boot_time_secs: u64,
    ticks_per_second: u64,
    page_size: u64,
    cpu_baseline: HashMap<i32, CpuSample>,
    sampled_at: Option<Instant>,
    usernames: RefCell<HashMap<u32, Option<String>>>,
}

impl ProcfsReader {
    /// Create a reader, sampling CPU counters over `cpu_interval`.
    ///
    /// With a zero interval no sampling happens and every snapshot reports
    /// 0% CPU. Otherwise this call blocks for `cpu_interval`.
    pub fn new(cpu_interval: Duration) -> Result<Self> {
        let boot_time_secs = procfs::boot_time_secs().context("Failed to read system boot time")?;

        let mut reader = Self {
            boot_time_secs,
            ticks_per_second: procfs::ticks_per_second().max(1),
            page_size: procfs::page_size(),
            cpu_baseline: HashMap::new(),
            sampled_at: None,
            usernames: RefCell::new(HashMap::new()),
        };

        if !cpu_interval.is_zero() {
            reader.take_cpu_baseline()?;
            log::debug!(
                "Sampling CPU usage of {} processes over {:.1}s",
                reader.cpu_baseline.len(),
                cpu_interval.as_secs_f64()
            );
            std::thread::sleep(cpu_interval);
        }

        Ok(reader)
    }

    fn take_cpu_baseline(&mut self) -> Result<()> {
        for process in all_processes().context("Failed to read process table")?.flatten() {
            if let Ok(stat) = process.stat() {
                self.cpu_baseline.insert(
                    stat.pid,
                    CpuSample {
                        start_ticks: stat.starttime,
                        total_ticks: stat.utime + stat.stime,
                    },
                );
            }
        }
        self.sampled_at = Some(Instant::now());
        Ok(())
    }

    fn read_entry(&self, process: &Process, now: Instant) -> ScanEntry<ProcHandle> {
        let pid = process.pid();
        let stat = match process.stat() {
            Ok(stat) => stat,
            Err(e) => return (ProcHandle::unverified(pid), Err(e.into())),
        };

        let handle = ProcHandle::new(pid, stat.starttime);
        if stat.state == 'Z' {
            return (handle, Err(SnapshotError::Zombie));
        }

        let snapshot = self.build_snapshot(process, &stat, now);
        (handle, snapshot)
    }

    fn build_snapshot(
        &self,
        process: &Process,
        stat: &Stat,
        now: Instant,
    ) -> Result<ProcessSnapshot, SnapshotError> {
        let status = process.status()?;
        let tps = self.ticks_per_second as f64;

        let create_time = UNIX_EPOCH
            + Duration::from_secs(self.boot_time_secs)
            + Duration::from_secs_f64(stat.starttime as f64 / tps);

        Ok(ProcessSnapshot {
            pid: stat.pid,
            name: stat.comm.clone(),
            username: self.username(status.ruid),
            effective_uid: status.euid,
            real_uid: status.ruid,
            create_time,
            cpu_percent: self.cpu_percent(stat, now),
            cpu_user_seconds: stat.utime as f64 / tps,
            cpu_system_seconds: stat.stime as f64 / tps,
            resident_memory_bytes: stat.rss * self.page_size,
        })
    }

    fn cpu_percent(&self, stat: &Stat, now: Instant) -> f64 {
        let Some(sampled_at) = self.sampled_at else {
            return 0.0;
        };
        let elapsed = now.duration_since(sampled_at).as_secs_f64();

        match self.cpu_baseline.get(&stat.pid) {
            Some(sample) if sample.start_ticks == stat.starttime && elapsed > 0.0 => {
                let ticks = (stat.utime + stat.stime).saturating_sub(sample.total_ticks);
                (ticks as f64 / self.ticks_per_second as f64) / elapsed * 100.0
            }
            _ => 0.0,
        }
    }

    fn username(&self, uid: u32) -> Option<String> {
        self.usernames
            .borrow_mut()
            .entry(uid)
            .or_insert_with(|| {
                User::from_uid(Uid::from_raw(uid))
                    .ok()
                    .flatten()
                    .map(|user| user.name)
            })
            .clone()
    }
}

impl SnapshotReader for ProcfsReader {
    type Handle = ProcHandle;

    fn enumerate(&self) -> Result<Box<dyn Iterator<Item = ScanEntry<ProcHandle>> + '_>> {
        let processes = all_processes().context("Failed to read process table")?;
        let now = Instant::now();

        Ok(Box::new(processes.filter_map(move |entry| match entry {
            Ok(process) => Some(self.read_entry(&process, now)),
            Err(e) => {
                log::debug!("Skipping unreadable /proc entry: {e}");
                None
            }
        })))
    }
}

impl std::fmt::Debug for ProcfsReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcfsReader")
            .field("boot_time_secs", &self.boot_time_secs)
            .field("ticks_per_second", &self.ticks_per_second)
            .field("sampled", &self.cpu_baseline.len())
            .finish_non_exhaustive()
    }
}
