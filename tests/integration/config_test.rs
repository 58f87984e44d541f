//! Config Integration Tests
//!
//! Settings files feeding the analysis service.

use lintview::{AnalysisService, AnalyzerSettings, AppError, ConfigService, SettingsUpdate};
use tempfile::TempDir;

#[test]
fn test_config_created_with_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let service = ConfigService::open(&path).unwrap();

    assert_eq!(service.get_config(), &AnalyzerSettings::default());
    let raw = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["interpreter"], "python3");
    assert_eq!(value["max_entries"], 100);
}

#[test]
fn test_updated_config_drives_service() {
    let dir = TempDir::new().unwrap();
    let mut config = ConfigService::open(dir.path().join("config.json")).unwrap();

    let settings = config
        .update_config(SettingsUpdate {
            max_entries: Some(2),
            results_file: Some(dir.path().join("cache").join("results.json")),
            ..Default::default()
        })
        .unwrap();

    let service = AnalysisService::new(settings).unwrap();
    assert_eq!(service.settings().max_entries, 2);
}

#[test]
fn test_hand_edited_invalid_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"interpreter":"","args":[],"max_entries":10}"#,
    )
    .unwrap();

    let err = ConfigService::open(&path).unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn test_invocation_overrides_are_not_persisted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    let config = ConfigService::open(&path).unwrap();

    let mut settings = config.get_config_clone();
    settings.apply_update(SettingsUpdate {
        interpreter: Some("pypy3".to_string()),
        ..Default::default()
    });
    assert!(settings.validate().is_ok());

    let reopened = ConfigService::open(&path).unwrap();
    assert_eq!(reopened.get_config().interpreter, "python3");
}
