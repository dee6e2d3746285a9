use std::{env, path::PathBuf, str::FromStr, time::Duration};
use tracing::warn;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/state.json";
const DEFAULT_ROLLOVER_CHECK_SECS: u64 = 60 * 60;
const DEFAULT_WEEKLY_GOAL: u64 = 50;
const DEFAULT_TRACKED_HOST: &str = "leetcode.com";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub rollover_interval: Duration,
    pub weekly_goal: u64,
    pub tracked_host: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            rollover_interval: Duration::from_secs(DEFAULT_ROLLOVER_CHECK_SECS),
            weekly_goal: DEFAULT_WEEKLY_GOAL,
            tracked_host: DEFAULT_TRACKED_HOST.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let interval_secs = parse_or(&lookup, "ROLLOVER_CHECK_SECS", DEFAULT_ROLLOVER_CHECK_SECS);
        Self {
            port: parse_or(&lookup, "PORT", defaults.port),
            data_path: lookup("APP_DATA_PATH")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            // A zero period would make the timer spin.
            rollover_interval: Duration::from_secs(interval_secs.max(1)),
            weekly_goal: parse_or(&lookup, "WEEKLY_GOAL", defaults.weekly_goal),
            tracked_host: lookup("TRACKED_HOST")
                .map(|host| host.trim().to_lowercase())
                .filter(|host| !host.is_empty())
                .unwrap_or(defaults.tracked_host),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring unparsable {key}={raw}");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config_from(&[]), Config::default());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("PORT", "9090"),
            ("APP_DATA_PATH", "/tmp/week.json"),
            ("ROLLOVER_CHECK_SECS", "30"),
            ("WEEKLY_GOAL", "20"),
            ("TRACKED_HOST", "LeetCode.cn"),
        ]);
        assert_eq!(config.port, 9090);
        assert_eq!(config.data_path, PathBuf::from("/tmp/week.json"));
        assert_eq!(config.rollover_interval, Duration::from_secs(30));
        assert_eq!(config.weekly_goal, 20);
        assert_eq!(config.tracked_host, "leetcode.cn");
    }

    #[test]
    fn bad_values_fall_back() {
        let config = config_from(&[("PORT", "eighty"), ("ROLLOVER_CHECK_SECS", "0")]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.rollover_interval, Duration::from_secs(1));
    }
}
