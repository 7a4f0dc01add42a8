// Threshold filter applied to every process snapshot

use crate::monitor::ProcessSnapshot;
use regex::Regex;
use std::collections::HashSet;
use std::time::{Duration, SystemTime};

/// Default minimum uid; lower uids belong to system accounts
pub const DEFAULT_MIN_UID: u32 = 1000;

/// Thresholds a process must reach to be matched
///
/// Every quantitative threshold defaults to zero, which any process satisfies
/// (memory excepted: a process must use at least one byte).
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub max_age: Duration,
    pub max_cpu_usage: Duration,
    pub max_cpu_percent: f64,
    pub max_memory_bytes: u64,
    pub ignored_users: HashSet<String>,
    pub min_uid: u32,
    /// Process names that are never matched
    pub ignored_names: Vec<Regex>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::ZERO,
            max_cpu_usage: Duration::ZERO,
            max_cpu_percent: 0.0,
            max_memory_bytes: 0,
            ignored_users: HashSet::new(),
            min_uid: DEFAULT_MIN_UID,
            ignored_names: Vec::new(),
        }
    }
}

impl FilterConfig {
    /// Parse a comma-separated user list, dropping empty entries
    pub fn parse_user_list(list: &str) -> HashSet<String> {
        list.split(',')
            .map(str::trim)
            .filter(|user| !user.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Check whether a snapshot reaches every threshold
    pub fn matches(&self, snapshot: &ProcessSnapshot, now: SystemTime) -> bool {
        if self.is_excluded(snapshot) {
            return false;
        }

        snapshot.age(now) >= self.max_age
            && snapshot.cpu_usage() >= self.max_cpu_usage
            && snapshot.cpu_percent >= self.max_cpu_percent
            && snapshot.resident_memory_bytes > self.max_memory_bytes
    }

    /// Owner and name checks, evaluated before any resource threshold
    fn is_excluded(&self, snapshot: &ProcessSnapshot) -> bool {
        if let Some(user) = &snapshot.username {
            if self.ignored_users.contains(user) {
                log::trace!("Skipping process {} of ignored user {}", snapshot.pid, user);
                return true;
            }
        }

        if snapshot.effective_uid < self.min_uid || snapshot.real_uid < self.min_uid {
            return true;
        }

        if self.ignored_names.iter().any(|re| re.is_match(&snapshot.name)) {
            log::trace!("Process {} matches ignore pattern", snapshot.pid);
            return true;
        }

        false
    }
}

/// Free-function form of [`FilterConfig::matches`]
pub fn matches(snapshot: &ProcessSnapshot, config: &FilterConfig, now: SystemTime) -> bool {
    config.matches(snapshot, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::snapshot;
    use std::time::UNIX_EPOCH;

    const HOUR: Duration = Duration::from_secs(3600);

    fn now() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_000_000)
    }

    /// 2h old, 90 min of CPU, 50% CPU, 2 GiB resident, uid 2000
    fn busy_process() -> ProcessSnapshot {
        let mut snap = snapshot(100, 2000);
        snap.create_time = now() - 2 * HOUR;
        snap.cpu_user_seconds = 3600.0;
        snap.cpu_system_seconds = 1800.0;
        snap.cpu_percent = 50.0;
        snap.resident_memory_bytes = 2 << 30;
        snap
    }

    #[test]
    fn test_default_config_matches_everything_above_min_uid() {
        let config = FilterConfig::default();
        assert!(config.matches(&busy_process(), now()));

        let mut idle = snapshot(101, 1000);
        idle.create_time = now();
        idle.resident_memory_bytes = 1;
        assert!(config.matches(&idle, now()));
    }

    #[test]
    fn test_age_boundary() {
        let snap = busy_process();
        let mut config = FilterConfig::default();

        config.max_age = 2 * HOUR;
        assert!(config.matches(&snap, now()));

        config.max_age = 2 * HOUR + Duration::from_secs(1);
        assert!(!config.matches(&snap, now()));
    }

    #[test]
    fn test_cpu_usage_boundary() {
        let snap = busy_process();
        let mut config = FilterConfig::default();

        config.max_cpu_usage = Duration::from_secs(5400);
        assert!(config.matches(&snap, now()));

        config.max_cpu_usage = Duration::from_secs(5401);
        assert!(!config.matches(&snap, now()));
    }

    #[test]
    fn test_cpu_percent_boundary() {
        let snap = busy_process();
        let mut config = FilterConfig::default();

        config.max_cpu_percent = 50.0;
        assert!(config.matches(&snap, now()));

        config.max_cpu_percent = 50.1;
        assert!(!config.matches(&snap, now()));
    }

    #[test]
    fn test_memory_boundary_is_strict() {
        let snap = busy_process();
        let mut config = FilterConfig::default();

        config.max_memory_bytes = (2 << 30) - 1;
        assert!(config.matches(&snap, now()));

        config.max_memory_bytes = 2 << 30;
        assert!(!config.matches(&snap, now()));
    }

    #[test]
    fn test_zero_memory_never_matches() {
        let mut snap = busy_process();
        snap.resident_memory_bytes = 0;
        assert!(!FilterConfig::default().matches(&snap, now()));
    }

    #[test]
    fn test_all_thresholds_must_hold() {
        let config = FilterConfig {
            max_age: HOUR,
            max_cpu_usage: HOUR,
            max_cpu_percent: 10.0,
            max_memory_bytes: 1 << 30,
            ..FilterConfig::default()
        };
        assert!(config.matches(&busy_process(), now()));

        // Old enough and heavy, but idle right now
        let mut idle = busy_process();
        idle.cpu_percent = 0.0;
        assert!(!config.matches(&idle, now()));

        // Busy but young
        let mut young = busy_process();
        young.create_time = now() - Duration::from_secs(60);
        assert!(!config.matches(&young, now()));
    }

    #[test]
    fn test_ignored_user_never_matches() {
        let config = FilterConfig {
            ignored_users: FilterConfig::parse_user_list("bob,alice"),
            ..FilterConfig::default()
        };
        assert!(!config.matches(&busy_process(), now()));

        let mut other = busy_process();
        other.username = Some("carol".to_string());
        assert!(config.matches(&other, now()));
    }

    #[test]
    fn test_uid_below_minimum_never_matches() {
        let config = FilterConfig::default();

        let mut setuid = busy_process();
        setuid.effective_uid = 0;
        assert!(!config.matches(&setuid, now()));

        let mut system = busy_process();
        system.real_uid = 999;
        assert!(!config.matches(&system, now()));

        let mut boundary = busy_process();
        boundary.effective_uid = DEFAULT_MIN_UID;
        boundary.real_uid = DEFAULT_MIN_UID;
        assert!(config.matches(&boundary, now()));
    }

    #[test]
    fn test_unknown_user_is_not_ignored() {
        let config = FilterConfig {
            ignored_users: FilterConfig::parse_user_list("alice"),
            ..FilterConfig::default()
        };
        let mut orphan = busy_process();
        orphan.username = None;
        assert!(config.matches(&orphan, now()));
    }

    #[test]
    fn test_ignored_name_pattern() {
        let config = FilterConfig {
            ignored_names: vec![Regex::new("^sshd$").unwrap()],
            ..FilterConfig::default()
        };
        let mut sshd = busy_process();
        sshd.name = "sshd".to_string();
        assert!(!config.matches(&sshd, now()));
        assert!(config.matches(&busy_process(), now()));
    }

    #[test]
    fn test_parse_user_list_drops_empty_entries() {
        assert!(FilterConfig::parse_user_list("").is_empty());

        let users = FilterConfig::parse_user_list("alice,, bob ,");
        assert_eq!(users.len(), 2);
        assert!(users.contains("alice"));
        assert!(users.contains("bob"));
    }

    #[test]
    fn test_free_function_agrees() {
        let config = FilterConfig {
            max_age: 3 * HOUR,
            ..FilterConfig::default()
        };
        let snap = busy_process();
        assert_eq!(matches(&snap, &config, now()), config.matches(&snap, now()));
        assert!(!matches(&snap, &config, now()));
    }
}
