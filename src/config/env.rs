// Environment variable configuration support

use super::Config;
use crate::killer::FilterConfig;
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Apply environment variable overrides to configuration
pub fn apply_env_overrides(mut config: Config) -> Result<Config> {
    if let Ok(val) = env::var("PROC_SWEEPER_MIN_UID") {
        config.filter.min_uid = val.parse().context("Invalid PROC_SWEEPER_MIN_UID")?;
    }
    if let Ok(val) = env::var("PROC_SWEEPER_IGNORE_USERS") {
        config
            .filter
            .ignored_users
            .extend(FilterConfig::parse_user_list(&val));
    }

    // Termination
    if let Ok(val) = env::var("PROC_SWEEPER_GRACE") {
        config.grace_period =
            Duration::from_secs(val.parse().context("Invalid PROC_SWEEPER_GRACE")?);
    }
    if let Ok(val) = env::var("PROC_SWEEPER_KILL") {
        config.kill = parse_bool(&val)?;
    }

    Ok(config)
}

/// Parse boolean value from string
/// Accepts: true/false, 1/0, yes/no, on/off (case-insensitive)
fn parse_bool(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("Invalid boolean value: {}", s),
    }
}
