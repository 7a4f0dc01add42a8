// Command-line argument parsing

use clap::Parser;

/// Proc Sweeper - find and terminate stale user processes
///
/// Lists processes owned by regular users that reach every given threshold
/// (age, accumulated CPU time, CPU percentage, resident memory) and, with
/// --kill, terminates them: SIGTERM first, SIGKILL for whatever is still
/// running when the grace period ends.
#[derive(Parser, Debug)]
#[command(name = "proc-sweeper")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find and terminate stale user processes", long_about = None)]
pub struct Args {
    /// Minimum process age in hours
    #[arg(short = 'a', long = "age", value_name = "HOURS", default_value_t = 0)]
    pub age_hours: u64,

    /// Minimum accumulated CPU time (user + system) in hours
    #[arg(short = 'c', long = "cpu-usage", value_name = "HOURS", default_value_t = 0)]
    pub cpu_usage_hours: u64,

    /// Minimum CPU utilization in percent (may exceed 100 on multi-core hosts)
    #[arg(short = 'p', long = "cpu-percent", value_name = "PERCENT", default_value_t = 0)]
    pub cpu_percent: u32,

    /// Resident memory a process must exceed, in GiB
    #[arg(short = 'm', long = "memory", value_name = "GB", default_value_t = 0)]
    pub memory_gb: u64,

    /// Comma-separated list of users whose processes are never matched
    #[arg(short = 'i', long = "ignore-users", value_name = "USERS", default_value = "")]
    pub ignore_users: String,

    /// Never match processes whose real or effective uid is below this
    #[arg(short = 'u', long = "min-uid", value_name = "UID", default_value_t = 1000)]
    pub min_uid: u32,

    /// Never match processes whose name matches this regex (can be used multiple times)
    #[arg(long = "ignore-name", value_name = "REGEX")]
    pub ignore_name: Vec<String>,

    /// Terminate matched processes
    #[arg(short = 'k', long = "kill")]
    pub kill: bool,

    /// Seconds to wait after SIGTERM before sending SIGKILL (default: 30)
    #[arg(short = 'g', long = "grace", value_name = "SECONDS")]
    pub grace: Option<u64>,

    /// CPU sampling interval in seconds (default: 1 when --cpu-percent is set, else 0)
    #[arg(long = "cpu-interval", value_name = "SECONDS")]
    pub cpu_interval: Option<f64>,

    /// Enable debug logging
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Use syslog instead of stderr for logging
    #[arg(long = "syslog")]
    pub syslog: bool,
}

impl Args {
    /// Parse arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["proc-sweeper"]).unwrap();
        assert_eq!(args.age_hours, 0);
        assert_eq!(args.cpu_usage_hours, 0);
        assert_eq!(args.cpu_percent, 0);
        assert_eq!(args.memory_gb, 0);
        assert_eq!(args.ignore_users, "");
        assert_eq!(args.min_uid, 1000);
        assert!(!args.kill);
        assert!(args.grace.is_none());
    }

    #[test]
    fn test_short_flags() {
        let args = Args::try_parse_from([
            "proc-sweeper", "-a", "24", "-c", "2", "-p", "150", "-m", "8", "-i", "root,slurm",
            "-u", "500", "-k", "-g", "10",
        ])
        .unwrap();
        assert_eq!(args.age_hours, 24);
        assert_eq!(args.cpu_usage_hours, 2);
        assert_eq!(args.cpu_percent, 150);
        assert_eq!(args.memory_gb, 8);
        assert_eq!(args.ignore_users, "root,slurm");
        assert_eq!(args.min_uid, 500);
        assert!(args.kill);
        assert_eq!(args.grace, Some(10));
    }

    #[test]
    fn test_negative_threshold_rejected() {
        assert!(Args::try_parse_from(["proc-sweeper", "--age", "-1"]).is_err());
        assert!(Args::try_parse_from(["proc-sweeper", "--memory", "lots"]).is_err());
    }
}
