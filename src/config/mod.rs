use crate::models::{ClassifierBackend, Settings};
use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Default name of the configuration directory.
pub const DEFAULT_CONFIG_DIR: &str = "SahiBin Data";

/// Default prefix for environment overrides (`SAHIBIN_CLASSIFIER__TIMEOUT_SECS=5`).
pub const DEFAULT_ENV_PREFIX: &str = "SAHIBIN";

const SETTINGS_FILE: &str = "SahiBin Settings.yaml";

/// Configuration manager for loading and saving the settings file.
///
/// Loading layers, lowest precedence first:
/// 1. built-in defaults
/// 2. `SahiBin Settings.yaml` in the config directory (optional)
/// 3. environment variables `<PREFIX>_<SECTION>__<KEY>`
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
    env_prefix: String,
}

impl ConfigManager {
    /// Create a new ConfigManager, creating the directory if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            settings_path: config_dir.join(SETTINGS_FILE),
            config_dir,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        })
    }

    /// Use a different environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }

    /// Load and validate the settings.
    ///
    /// A missing file is not an error; defaults (plus environment overrides)
    /// are used instead.
    pub fn load_settings(&self) -> Result<Settings> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
        }

        let layered = config::Config::builder()
            .add_source(
                config::File::from(self.settings_path.as_std_path())
                    .format(config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        let settings: Settings = layered
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        validate(&settings)?;

        tracing::info!(
            "Loaded settings from {} (classifier: {:?})",
            self.settings_path,
            settings.classifier.backend
        );
        Ok(settings)
    }

    /// Save the settings file.
    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        validate(settings)?;

        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Write a default settings file if none exists yet.
    pub fn ensure_settings_file(&self) -> Result<()> {
        if self.settings_path.exists() {
            return Ok(());
        }
        tracing::info!("Creating default settings file at {}", self.settings_path);
        self.save_settings(&Settings::default())
    }
}

/// Reject settings the session cannot run with.
pub fn validate(settings: &Settings) -> Result<()> {
    let classifier = &settings.classifier;

    if !(0.0..=1.0).contains(&classifier.min_confidence) {
        bail!(
            "min_confidence must be between 0 and 1, got {}",
            classifier.min_confidence
        );
    }
    if classifier.max_results == 0 {
        bail!("max_results must be at least 1");
    }
    if classifier.timeout_secs == 0 {
        bail!("timeout_secs must be at least 1");
    }
    if classifier.backend == ClassifierBackend::Remote && classifier.endpoint.trim().is_empty() {
        bail!("Remote classifier selected but no endpoint is configured");
    }
    if settings.centers.search_radius_km <= 0.0 {
        bail!(
            "search_radius_km must be positive, got {}",
            settings.centers.search_radius_km
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> ConfigManager {
        let path = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        ConfigManager::new(path).unwrap().with_env_prefix("SAHIBIN_UNIT_UNSET")
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = manager(&dir).load_settings().unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);

        let mut settings = Settings::default();
        settings.classifier.timeout_secs = 12;
        settings.logging.debug_mode = true;
        manager.save_settings(&settings).unwrap();

        let loaded = manager.load_settings().unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.classifier.min_confidence = 1.5;
        assert!(validate(&settings).is_err());

        let mut settings = Settings::default();
        settings.classifier.max_results = 0;
        assert!(validate(&settings).is_err());

        let mut settings = Settings::default();
        settings.classifier.backend = ClassifierBackend::Remote;
        assert!(validate(&settings).is_err());
    }

    #[test]
    fn test_ensure_settings_file() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);

        manager.ensure_settings_file().unwrap();
        assert!(manager.settings_path().exists());
    }
}
