// Configuration module

mod args;
mod env;

pub use args::Args;
use crate::killer::{FilterConfig, DEFAULT_GRACE_PERIOD};
use anyhow::{bail, Context, Result};
use regex::{Regex, RegexBuilder};
use std::time::Duration;

/// Maximum allowed length for regex patterns to prevent ReDoS attacks
const MAX_REGEX_PATTERN_LENGTH: usize = 256;

/// Maximum compiled regex size in bytes (10MB) to prevent memory exhaustion
const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

/// CPU sampling interval used when a CPU percentage threshold is given
const DEFAULT_CPU_INTERVAL: Duration = Duration::from_secs(1);

/// Longest accepted CPU sampling interval
const MAX_CPU_INTERVAL_SECS: f64 = 60.0;

const SECS_PER_HOUR: u64 = 3600;
const BYTES_PER_GB: u64 = 1 << 30;

/// Compile a regex pattern with safety limits to prevent ReDoS attacks.
///
/// This function applies the following protections:
/// - Limits pattern length to MAX_REGEX_PATTERN_LENGTH characters
/// - Sets a compiled size limit to prevent memory exhaustion
fn compile_safe_regex(pattern: &str) -> Result<Regex> {
    if pattern.len() > MAX_REGEX_PATTERN_LENGTH {
        bail!(
            "Regex pattern too long (max {} chars): {}...",
            MAX_REGEX_PATTERN_LENGTH,
            pattern.chars().take(50).collect::<String>()
        );
    }

    RegexBuilder::new(pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .context(format!("Invalid regex pattern: {}", pattern))
}

/// Convert whole hours to a duration, rejecting overflow
fn hours(value: u64, what: &str) -> Result<Duration> {
    value
        .checked_mul(SECS_PER_HOUR)
        .map(Duration::from_secs)
        .with_context(|| format!("{what} threshold is too large: {value} hours"))
}

/// Main configuration struct for Proc Sweeper
#[derive(Debug, Clone)]
pub struct Config {
    /// Thresholds handed to the process search
    pub filter: FilterConfig,

    // Termination
    pub kill: bool,             // Terminate matched processes
    pub grace_period: Duration, // SIGTERM to SIGKILL delay

    // Sampling
    pub cpu_interval: Duration, // Window for CPU percentage
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args(args: Args) -> Result<Self> {
        let mut config = Self::default();

        config.filter.max_age = hours(args.age_hours, "Age")?;
        config.filter.max_cpu_usage = hours(args.cpu_usage_hours, "CPU usage")?;
        config.filter.max_cpu_percent = f64::from(args.cpu_percent);
        config.filter.max_memory_bytes = args
            .memory_gb
            .checked_mul(BYTES_PER_GB)
            .with_context(|| format!("Memory threshold is too large: {} GB", args.memory_gb))?;
        config.filter.ignored_users = FilterConfig::parse_user_list(&args.ignore_users);
        config.filter.min_uid = args.min_uid;

        // Compile regex patterns with safety limits (ReDoS protection)
        for pattern in args.ignore_name {
            config.filter.ignored_names.push(compile_safe_regex(&pattern)?);
        }

        config.kill = args.kill;
        if let Some(grace) = args.grace {
            config.grace_period = Duration::from_secs(grace);
        }

        config.cpu_interval = match args.cpu_interval {
            Some(secs) => {
                if !secs.is_finite() || !(0.0..=MAX_CPU_INTERVAL_SECS).contains(&secs) {
                    bail!("cpu-interval must be between 0 and {MAX_CPU_INTERVAL_SECS} seconds");
                }
                Duration::from_secs_f64(secs)
            }
            None if args.cpu_percent > 0 => DEFAULT_CPU_INTERVAL,
            None => Duration::ZERO,
        };

        // Apply environment variable overrides
        config = env::apply_env_overrides(config)?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.filter.max_cpu_percent > 0.0 && self.cpu_interval.is_zero() {
            log::warn!(
                "CPU percent threshold {} set without a sampling interval; every process reads 0% CPU",
                self.filter.max_cpu_percent
            );
        }

        if self.filter.min_uid == 0 {
            log::warn!("min-uid is 0, processes owned by root can be matched");
        }

        if self.kill && self.grace_period.is_zero() {
            log::warn!("Grace period is 0, matched processes get SIGKILL right after SIGTERM");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            kill: false,
            grace_period: DEFAULT_GRACE_PERIOD,
            cpu_interval: Duration::ZERO,
        }
    }
}
