//! Integration tests for ConfigManager and settings file handling
//!
//! These tests verify:
//! - Default settings when no file exists
//! - Settings saving and loading
//! - Partial files and environment overrides
//! - Validation of malformed or out-of-range settings
//! - Building a session from loaded settings

use sahibin::models::{ClassifierBackend, Settings};
use sahibin::{ConfigManager, SessionController};
use camino::Utf8PathBuf;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

/// Manager with a prefix no test sets, so the real environment cannot leak in.
fn isolated_manager(config_path: &Utf8PathBuf) -> ConfigManager {
    ConfigManager::new(config_path)
        .unwrap()
        .with_env_prefix("SAHIBIN_IT_UNSET")
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    assert_eq!(manager.config_dir(), config_path.as_path());
    assert_eq!(
        manager.settings_path(),
        config_path.join("SahiBin Settings.yaml").as_path()
    );
}

#[test]
fn test_creates_missing_directory() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let nested = config_path.join("SahiBin Data");

    ConfigManager::new(&nested).unwrap();

    assert!(nested.exists());
}

#[test]
fn test_load_default_settings() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = isolated_manager(&config_path);

    // Settings file doesn't exist, should return defaults
    let settings = manager.load_settings().unwrap();

    assert_eq!(settings.classifier.backend, ClassifierBackend::Mock);
    assert_eq!(settings.classifier.timeout_secs, 30);
    assert_eq!(settings.classifier.min_confidence, 0.5);
    assert_eq!(settings.classifier.max_results, 10);
    assert_eq!(settings.logging.log_dir, "logs");
    assert!(!settings.logging.debug_mode);
    assert_eq!(settings.centers.search_radius_km, 5.0);
}

#[test]
fn test_save_and_load_settings() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = isolated_manager(&config_path);

    let mut settings = manager.load_settings().unwrap();
    settings.classifier.backend = ClassifierBackend::Remote;
    settings.classifier.endpoint = "http://localhost:8080/detect".to_string();
    settings.classifier.max_results = 3;
    settings.centers.search_radius_km = 2.5;

    manager.save_settings(&settings).unwrap();
    assert!(manager.settings_path().exists());

    let loaded = manager.load_settings().unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn test_partial_settings_file() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = isolated_manager(&config_path);

    let yaml = r#"
classifier:
  timeout_secs: 5
logging:
  debug_mode: true
"#;
    fs::write(manager.settings_path(), yaml).unwrap();

    let settings = manager.load_settings().unwrap();

    assert_eq!(settings.classifier.timeout_secs, 5);
    assert!(settings.logging.debug_mode);
    // Everything not in the file keeps its default
    assert_eq!(settings.classifier.max_results, 10);
    assert_eq!(settings.centers, Settings::default().centers);
}

#[test]
fn test_environment_overrides_file() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path)
        .unwrap()
        .with_env_prefix("SAHIBIN_IT_ENV");

    fs::write(
        manager.settings_path(),
        "classifier:\n  timeout_secs: 5\n  max_results: 4\n",
    )
    .unwrap();

    // SAFETY: this prefix is only used by this test
    unsafe {
        std::env::set_var("SAHIBIN_IT_ENV_CLASSIFIER__TIMEOUT_SECS", "7");
        std::env::set_var("SAHIBIN_IT_ENV_LOGGING__DEBUG_MODE", "true");
    }

    let settings = manager.load_settings().unwrap();

    unsafe {
        std::env::remove_var("SAHIBIN_IT_ENV_CLASSIFIER__TIMEOUT_SECS");
        std::env::remove_var("SAHIBIN_IT_ENV_LOGGING__DEBUG_MODE");
    }

    assert_eq!(settings.classifier.timeout_secs, 7);
    assert_eq!(settings.classifier.max_results, 4);
    assert!(settings.logging.debug_mode);
}

#[test]
fn test_invalid_yaml_rejected() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = isolated_manager(&config_path);

    fs::write(manager.settings_path(), "classifier: [this is: not valid").unwrap();

    assert!(manager.load_settings().is_err());
}

#[test]
fn test_out_of_range_settings_rejected() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = isolated_manager(&config_path);

    fs::write(manager.settings_path(), "classifier:\n  min_confidence: 2.0\n").unwrap();
    let err = manager.load_settings().unwrap_err();
    assert!(err.to_string().contains("min_confidence"));

    // Saving refuses the same values
    let mut settings = Settings::default();
    settings.classifier.max_results = 0;
    assert!(manager.save_settings(&settings).is_err());
}

#[test]
fn test_remote_backend_requires_endpoint() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = isolated_manager(&config_path);

    fs::write(manager.settings_path(), "classifier:\n  backend: remote\n").unwrap();

    assert!(manager.load_settings().is_err());
}

#[test]
fn test_ensure_settings_file_keeps_existing() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = isolated_manager(&config_path);

    fs::write(manager.settings_path(), "classifier:\n  timeout_secs: 9\n").unwrap();
    manager.ensure_settings_file().unwrap();

    assert_eq!(manager.load_settings().unwrap().classifier.timeout_secs, 9);
}

#[tokio::test]
async fn test_session_from_loaded_settings() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = isolated_manager(&config_path);

    fs::write(
        manager.settings_path(),
        "classifier:\n  max_results: 1\n  timeout_secs: 2\n",
    )
    .unwrap();

    let settings = manager.load_settings().unwrap();
    let session = SessionController::from_settings(&settings.classifier).unwrap();

    assert_eq!(settings.classifier.timeout(), Duration::from_secs(2));
    assert_eq!(session.classifier_name(), "mock");

    // The canned mock returns two detections; the policy keeps one
    let results = session
        .capture_from_file(vec![0xFF, 0xD8], "image/jpeg", None)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(session.aggregate_stats().items_detected, 1);
}
