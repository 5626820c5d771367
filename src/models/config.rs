use serde::{Deserialize, Serialize};
use std::time::Duration;

/// User settings from `SahiBin Settings.yaml`
///
/// Every section is optional in the file; missing keys take the defaults
/// below. Environment variables of the form `SAHIBIN_<SECTION>__<KEY>`
/// override file values (see [`crate::config::ConfigManager`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub classifier: ClassifierSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub centers: CenterSettings,
}

/// Which classification backend the session talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    #[default]
    Mock,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierSettings {
    #[serde(default)]
    pub backend: ClassifierBackend,

    /// Classification endpoint, required when `backend` is `remote`
    #[serde(default)]
    pub endpoint: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Artificial delay for the mock backend, in milliseconds
    #[serde(default)]
    pub mock_latency_ms: u64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::Mock,
            endpoint: String::new(),
            timeout_secs: default_timeout_secs(),
            min_confidence: default_min_confidence(),
            max_results: default_max_results(),
            mock_latency_ms: 0,
        }
    }
}

impl ClassifierSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn mock_latency(&self) -> Duration {
        Duration::from_millis(self.mock_latency_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default)]
    pub debug_mode: bool,

    #[serde(default = "default_console_output")]
    pub console_output: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            debug_mode: false,
            console_output: default_console_output(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterSettings {
    #[serde(default = "default_search_radius_km")]
    pub search_radius_km: f64,

    /// Location used when no user position is known
    #[serde(default = "default_latitude")]
    pub default_latitude: f64,

    #[serde(default = "default_longitude")]
    pub default_longitude: f64,
}

impl Default for CenterSettings {
    fn default() -> Self {
        Self {
            search_radius_km: default_search_radius_km(),
            default_latitude: default_latitude(),
            default_longitude: default_longitude(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_min_confidence() -> f64 {
    0.5
}

fn default_max_results() -> usize {
    10
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_console_output() -> bool {
    true
}

fn default_search_radius_km() -> f64 {
    5.0
}

fn default_latitude() -> f64 {
    40.7589
}

fn default_longitude() -> f64 {
    -73.9851
}
