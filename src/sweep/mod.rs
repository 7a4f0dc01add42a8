// Sweep module - one enumerate, filter, optionally kill pass

pub mod report;

use crate::config::Config;
use crate::killer::{
    EventSink, LogSink, MatchedProcess, ProcessSearch, TerminationSummary, Terminator,
};
use crate::monitor::{Clock, ProcfsReader, SnapshotReader, SystemClock};
use anyhow::{Context, Result};
use std::io::{self, Write};

/// What a sweep found and, with `kill` set, what happened to it
#[derive(Debug)]
pub struct SweepOutcome<H> {
    pub matched: Vec<MatchedProcess<H>>,
    pub termination: Option<TerminationSummary>,
}

/// Run a sweep against the live process table
pub fn run(config: Config) -> Result<()> {
    log_criteria(&config);

    let reader =
        ProcfsReader::new(config.cpu_interval).context("Failed to initialize process reader")?;

    let mut stdout = io::stdout().lock();
    let outcome = sweep(&config, &reader, &SystemClock, &LogSink, &mut stdout)?;

    if let Some(summary) = outcome.termination {
        log::info!(
            "Done: {} exited, {} force-killed, {} already gone, {} failed",
            summary.exited.len(),
            summary.force_killed.len(),
            summary.skipped.len(),
            summary.failed.len()
        );
    }

    Ok(())
}

/// Search, print the report to `out`, and terminate matches if configured
pub fn sweep<R: SnapshotReader, W: Write>(
    config: &Config,
    reader: &R,
    clock: &dyn Clock,
    sink: &dyn EventSink,
    out: &mut W,
) -> Result<SweepOutcome<R::Handle>> {
    let search = ProcessSearch::new(config.filter.clone());
    let matched = search
        .search(reader, clock)
        .context("Failed to search processes")?;

    out.write_all(report::render(&matched, clock.now()).as_bytes())
        .and_then(|()| out.flush())
        .context("Failed to write report")?;

    if matched.is_empty() {
        log::info!("No matching processes found");
        return Ok(SweepOutcome {
            matched,
            termination: None,
        });
    }

    log::info!("Found {} matching process(es)", matched.len());

    let termination = if config.kill {
        Some(Terminator::new(config.grace_period).terminate(&matched, sink))
    } else {
        None
    };

    Ok(SweepOutcome {
        matched,
        termination,
    })
}

fn log_criteria(config: &Config) {
    let filter = &config.filter;

    log::debug!("=== Proc Sweeper v{} ===", env!("CARGO_PKG_VERSION"));
    log::debug!(
        "Thresholds: age >= {}h, cpu time >= {}h, cpu >= {:.0}%, memory > {} bytes",
        filter.max_age.as_secs() / 3600,
        filter.max_cpu_usage.as_secs() / 3600,
        filter.max_cpu_percent,
        filter.max_memory_bytes
    );
    log::debug!("Minimum uid: {}", filter.min_uid);

    if !filter.ignored_users.is_empty() {
        let mut users: Vec<&str> = filter.ignored_users.iter().map(String::as_str).collect();
        users.sort_unstable();
        log::debug!("Ignored users: {}", users.join(", "));
    }
    if !filter.ignored_names.is_empty() {
        log::debug!("Ignore processes: {} pattern(s)", filter.ignored_names.len());
    }
    if !config.cpu_interval.is_zero() {
        log::debug!(
            "CPU sampling interval: {:.1}s",
            config.cpu_interval.as_secs_f64()
        );
    }
    if config.kill {
        log::debug!(
            "Kill enabled, grace period {}s",
            config.grace_period.as_secs()
        );
    }
}
