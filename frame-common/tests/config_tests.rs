//! Unit tests for configuration loading and credential resolution
//!
//! Covers:
//! - Missing TOML file degrades to defaults
//! - Partial TOML files fill in defaults per section
//! - Malformed TOML is reported as a configuration error
//! - Atomic write (temp + rename, 0600 on Unix)
//! - Credential priority: CLI → environment → TOML
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.

use frame_common::config::{
    load_toml_config, resolve_config_path, resolve_credentials, write_toml_config, ApiConfig,
    Credentials, MatchStrategy, ThrottleKind, TomlConfig, ACCESS_TOKEN_ENV, API_KEY_ENV,
    CONFIG_ENV, DEFAULT_BASE_URL,
};
use frame_common::Error;
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn clear_credential_env() {
    env::remove_var(API_KEY_ENV);
    env::remove_var(ACCESS_TOKEN_ENV);
}

#[test]
fn test_missing_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = load_toml_config(&temp_dir.path().join("absent.toml")).unwrap();

    assert_eq!(config, TomlConfig::default());
    assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.api.language.as_deref(), Some("en-US"));
    assert_eq!(config.throttle.policy, ThrottleKind::Fixed);
    assert_eq!(config.throttle.delay_ms, 250);
    assert_eq!(config.matching.strategy, MatchStrategy::Containment);
    assert!(!config.matching.check_year);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_partial_file_fills_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("frame-verify.toml");
    std::fs::write(
        &path,
        r#"
output = "fixed.txt"

[throttle]
policy = "backoff"
max_delay_ms = 4000

[matching]
strategy = "jaro-winkler"
check_year = true
"#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();

    assert_eq!(config.output, Some(PathBuf::from("fixed.txt")));
    assert_eq!(config.throttle.policy, ThrottleKind::Backoff);
    assert_eq!(config.throttle.max_delay_ms, 4000);
    assert_eq!(config.throttle.delay_ms, 250);
    assert_eq!(config.matching.strategy, MatchStrategy::JaroWinkler);
    assert!(config.matching.check_year);
    assert_eq!(config.api, ApiConfig::default());
}

#[test]
fn test_malformed_file_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "[throttle\npolicy = ").unwrap();

    match load_toml_config(&path) {
        Err(Error::Config(msg)) => assert!(msg.contains("broken.toml")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_unknown_policy_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("policy.toml");
    std::fs::write(&path, "[throttle]\npolicy = \"leaky-bucket\"\n").unwrap();

    assert!(load_toml_config(&path).is_err());
}

#[test]
fn test_atomic_write_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("nested").join("frame-verify.toml");

    let mut config = TomlConfig::default();
    config.output = Some(PathBuf::from("out.txt"));
    config.throttle.policy = ThrottleKind::TokenBucket;
    config.matching.threshold = Some(0.9);

    write_toml_config(&config, &target).unwrap();

    assert!(target.exists());
    assert!(!temp_dir.path().join("nested").join("frame-verify.toml.tmp").exists());
    assert_eq!(load_toml_config(&target).unwrap(), config);
}

#[cfg(unix)]
#[test]
fn test_atomic_write_sets_permissions_0600() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("secret.toml");
    write_toml_config(&TomlConfig::default(), &target).unwrap();

    let mode = std::fs::metadata(&target).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
#[serial]
fn test_config_path_cli_wins_over_env() {
    env::set_var(CONFIG_ENV, "/tmp/frame-env.toml");

    let resolved = resolve_config_path(Some(Path::new("/tmp/frame-cli.toml")));
    assert_eq!(resolved, Some(PathBuf::from("/tmp/frame-cli.toml")));

    let resolved = resolve_config_path(None);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/frame-env.toml")));

    env::remove_var(CONFIG_ENV);
}

#[test]
#[serial]
fn test_credentials_missing_everywhere() {
    clear_credential_env();

    match resolve_credentials(None, None, &ApiConfig::default()) {
        Err(Error::Config(msg)) => assert!(msg.contains(API_KEY_ENV)),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_credentials_priority_cli_env_toml() {
    clear_credential_env();
    let api = ApiConfig {
        api_key: Some("toml-key".to_string()),
        ..ApiConfig::default()
    };

    assert_eq!(
        resolve_credentials(None, None, &api).unwrap(),
        Credentials::ApiKey("toml-key".to_string())
    );

    env::set_var(API_KEY_ENV, "env-key");
    assert_eq!(
        resolve_credentials(None, None, &api).unwrap(),
        Credentials::ApiKey("env-key".to_string())
    );

    assert_eq!(
        resolve_credentials(Some("cli-key"), None, &api).unwrap(),
        Credentials::ApiKey("cli-key".to_string())
    );

    clear_credential_env();
}

#[test]
#[serial]
fn test_access_token_preferred_within_tier() {
    clear_credential_env();
    let api = ApiConfig {
        api_key: Some("toml-key".to_string()),
        access_token: Some("toml-token".to_string()),
        ..ApiConfig::default()
    };

    assert_eq!(
        resolve_credentials(None, None, &api).unwrap(),
        Credentials::AccessToken("toml-token".to_string())
    );
}

#[test]
#[serial]
fn test_blank_credentials_are_skipped() {
    clear_credential_env();
    env::set_var(API_KEY_ENV, "   ");
    let api = ApiConfig {
        api_key: Some("toml-key".to_string()),
        ..ApiConfig::default()
    };

    assert_eq!(
        resolve_credentials(Some(""), None, &api).unwrap(),
        Credentials::ApiKey("toml-key".to_string())
    );

    clear_credential_env();
}
