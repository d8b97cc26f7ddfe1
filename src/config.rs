//! Client-tunable configuration. Mirrors the teacher's TOML-with-defaults
//! layering; this crate never reads a file itself, an embedding
//! application may.

use serde::{Deserialize, Serialize};

fn default_match_cache_capacity() -> usize {
    200
}

fn default_time_echo_samples() -> usize {
    100
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Capacity of the gaze/eyes matching caches (§4.7).
    #[serde(default = "default_match_cache_capacity")]
    pub match_cache_capacity: usize,
    /// Default sample count for `estimate_time_offset`.
    #[serde(default = "default_time_echo_samples")]
    pub time_echo_samples: usize,
    /// RTSP/TCP connect timeout.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// HTTP request timeout for control-plane calls.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            match_cache_capacity: default_match_cache_capacity(),
            time_echo_samples: default_time_echo_samples(),
            connect_timeout_ms: default_connect_timeout_ms(),
            http_timeout_ms: default_http_timeout_ms(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.match_cache_capacity, 200);
        assert_eq!(cfg.time_echo_samples, 100);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: ClientConfig = ClientConfig::from_toml_str("match_cache_capacity = 50\n").unwrap();
        assert_eq!(cfg.match_cache_capacity, 50);
        assert_eq!(cfg.time_echo_samples, 100);
    }
}
