// Tabular report of matched processes

use crate::killer::MatchedProcess;
use crate::sanitize_for_log;
use chrono::{DateTime, Local};
use std::fmt::Write;
use std::time::{Duration, SystemTime};

/// Format a byte count in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GiB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MiB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KiB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Format a duration as `[Nd ]HH:MM:SS`
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if days > 0 {
        format!("{days}d {hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Render matched processes as a table, one row per process
pub fn render<H>(matched: &[MatchedProcess<H>], now: SystemTime) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(
        out,
        "{:>7}  {:<12} {:>6}  {:<16} {:<19}  {:>12}  {:>6}  {:>10}  {:>12}",
        "PID", "USER", "EUID", "NAME", "CREATED", "AGE", "CPU%", "MEMORY", "CPU TIME"
    );

    for process in matched {
        let snap = &process.snapshot;
        let user = snap
            .username
            .clone()
            .unwrap_or_else(|| snap.real_uid.to_string());
        let _ = writeln!(
            out,
            "{:>7}  {:<12} {:>6}  {:<16} {:<19}  {:>12}  {:>6.1}  {:>10}  {:>12}",
            snap.pid,
            user,
            snap.effective_uid,
            sanitize_for_log(&snap.name),
            format_timestamp(snap.create_time),
            format_duration(snap.age(now)),
            snap.cpu_percent,
            format_size(snap.resident_memory_bytes),
            format_duration(snap.cpu_usage()),
        );
    }

    out
}
