use std::str::FromStr;

use crate::handle::Handle;

/// Default cap on a single frame payload in either direction (16 MiB).
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Per-session tunables, read from `GUI_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub max_frame_bytes: usize,
    pub log_level: i32,
    pub handle_limit: Handle,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            log_level: 0,
            handle_limit: Handle::MAX,
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            max_frame_bytes: parse_var(&lookup, "GUI_MAX_FRAME_BYTES")
                .filter(|value: &usize| *value > 0)
                .unwrap_or(defaults.max_frame_bytes),
            log_level: parse_var(&lookup, "GUI_SESSION_LOG_LEVEL").unwrap_or(defaults.log_level),
            handle_limit: parse_var(&lookup, "GUI_HANDLE_LIMIT")
                .filter(|value: &Handle| *value > 0)
                .unwrap_or(defaults.handle_limit),
        }
    }
}

pub fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|raw| raw.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn missing_variables_use_defaults() {
        let config = SessionConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn parses_values() {
        let config = SessionConfig::from_lookup(lookup_from(&[
            ("GUI_MAX_FRAME_BYTES", "4096"),
            ("GUI_SESSION_LOG_LEVEL", " 3 "),
            ("GUI_HANDLE_LIMIT", "16"),
        ]));
        assert_eq!(config.max_frame_bytes, 4096);
        assert_eq!(config.log_level, 3);
        assert_eq!(config.handle_limit, 16);
    }

    #[test]
    fn rejects_zero_and_garbage() {
        let config = SessionConfig::from_lookup(lookup_from(&[
            ("GUI_MAX_FRAME_BYTES", "0"),
            ("GUI_SESSION_LOG_LEVEL", "loud"),
            ("GUI_HANDLE_LIMIT", "-4"),
        ]));
        assert_eq!(config, SessionConfig::default());
    }
}
