//! Loading settings and secrets from a real directory.

use gcu_config::{load_secrets, load_settings, ConfigError, ConfigOptions, ConfigSource};
use std::fs;
use tempfile::TempDir;

const SETTINGS: &str = r#"{
    "testMode": false,
    "backup": true,
    "gunbot": { "location": "", "config": "config.js", "start": "pm2 start 0", "stop": "pm2 stop 0" },
    "gui": { "config": "gui.json", "enabled": true, "gunbotVersion": "5.0.4", "start": "pm2 start 1", "stop": "pm2 stop 1" }
}"#;

fn options(dir: &TempDir) -> ConfigOptions {
    ConfigOptions {
        config_dir: Some(dir.path().to_path_buf()),
        test_mode: None,
    }
}

#[test]
fn test_missing_settings_is_not_found() {
    let temp = TempDir::new().unwrap();
    let err = load_settings(&options(&temp)).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }));
}

#[test]
fn test_invalid_json_is_parse_error() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("gunbot_config_updater.json"), "{ nope").unwrap();
    let err = load_settings(&options(&temp)).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn test_load_settings_and_secrets() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("gunbot_config_updater.json"), SETTINGS).unwrap();
    fs::write(
        temp.path().join("secrets.json"),
        r#"{ "exchanges": [ { "exchange": "poloniex", "api_key": "k", "api_secret": "s" } ] }"#,
    )
    .unwrap();

    let settings = load_settings(&options(&temp)).unwrap();
    assert_eq!(settings.gunbot_location(), temp.path());
    assert_eq!(settings.config_source(), ConfigSource::CliArgument);
    assert!(settings.gui_enabled());

    let secrets = load_secrets(&settings).unwrap();
    assert_eq!(secrets.exchanges.len(), 1);
}

#[test]
fn test_cli_test_mode_override() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("gunbot_config_updater.json"), SETTINGS).unwrap();

    let settings = load_settings(&ConfigOptions {
        config_dir: Some(temp.path().to_path_buf()),
        test_mode: Some(true),
    })
    .unwrap();
    assert!(settings.test_mode());
    assert_eq!(settings.gunbot_config_path(), temp.path().join("test-config.js"));
}

#[test]
fn test_missing_secrets_is_not_found() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("gunbot_config_updater.json"), SETTINGS).unwrap();
    let settings = load_settings(&options(&temp)).unwrap();
    let err = load_secrets(&settings).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }));
}
