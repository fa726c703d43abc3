use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TOP_N: usize = 10;
const MAX_TOP_N: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base: String,
    pub http_timeout: Duration,
    /// Skip the backend and serve the static fallback datasets.
    pub offline: bool,
    pub top_n: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            offline: false,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl Config {
    /// Reads `.env.local`, then `.env`, then the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base = lookup("CRICKET_API_BASE")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let timeout_secs = lookup("CRICKET_HTTP_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .max(1);
        let offline = lookup("CRICKET_OFFLINE")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        let top_n = lookup("CRICKET_TOP_N")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_TOP_N)
            .clamp(1, MAX_TOP_N);
        Self {
            api_base,
            http_timeout: Duration::from_secs(timeout_secs),
            offline,
            top_n,
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn cfg(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(cfg(&[]), Config::default());
    }

    #[test]
    fn values_are_parsed_and_clamped() {
        let c = cfg(&[
            ("CRICKET_API_BASE", " http://stats.local/api "),
            ("CRICKET_HTTP_TIMEOUT_SECS", "0"),
            ("CRICKET_OFFLINE", "TRUE"),
            ("CRICKET_TOP_N", "500"),
        ]);
        assert_eq!(c.api_base, "http://stats.local/api");
        assert_eq!(c.http_timeout, Duration::from_secs(1));
        assert!(c.offline);
        assert_eq!(c.top_n, 50);
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let c = cfg(&[
            ("CRICKET_API_BASE", "  "),
            ("CRICKET_HTTP_TIMEOUT_SECS", "soon"),
            ("CRICKET_OFFLINE", "maybe"),
            ("CRICKET_TOP_N", "-3"),
        ]);
        assert_eq!(c, Config::default());
    }
}
