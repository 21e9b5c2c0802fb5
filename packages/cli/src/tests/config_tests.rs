use crate::config::{Config, ConfigError, ConfigOverrides, DEFAULT_CORS_ORIGIN, DEFAULT_PORT};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serial_test::serial;
use std::env;
use std::path::PathBuf;

const VARS: [&str; 4] = [
    "CASEBOOK_PORT",
    "CASEBOOK_HOST",
    "CASEBOOK_DB_PATH",
    "CASEBOOK_CORS_ORIGIN",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_config_from_env_defaults() {
    clear_env();

    let config = Config::from_env().unwrap();

    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.host.to_string(), "127.0.0.1");
    assert_eq!(config.cors_origin, DEFAULT_CORS_ORIGIN);
    assert!(config.db_path.ends_with(".casebook/casebook.db"));
}

#[test]
#[serial]
fn test_config_from_env_with_all_custom() {
    clear_env();
    env::set_var("CASEBOOK_PORT", "8080");
    env::set_var("CASEBOOK_HOST", "0.0.0.0");
    env::set_var("CASEBOOK_DB_PATH", "/tmp/review.db");
    env::set_var("CASEBOOK_CORS_ORIGIN", "https://app.example.com");

    let config = Config::from_env().unwrap();

    assert_eq!(config.port, 8080);
    assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
    assert_eq!(config.db_path, PathBuf::from("/tmp/review.db"));
    assert_eq!(config.cors_origin, "https://app.example.com");

    clear_env();
}

#[rstest]
#[case("not-a-number")]
#[case("70000")]
#[case("-1")]
#[serial]
fn test_config_invalid_port(#[case] value: &str) {
    clear_env();
    env::set_var("CASEBOOK_PORT", value);

    let result = Config::from_env();
    assert!(matches!(result, Err(ConfigError::InvalidPort(_))));

    clear_env();
}

#[test]
#[serial]
fn test_config_zero_port() {
    clear_env();
    env::set_var("CASEBOOK_PORT", "0");

    let result = Config::from_env();
    assert!(matches!(result, Err(ConfigError::PortOutOfRange(0))));

    clear_env();
}

#[test]
#[serial]
fn test_config_invalid_host() {
    clear_env();
    env::set_var("CASEBOOK_HOST", "localhost:80");

    let result = Config::from_env();
    assert!(matches!(result, Err(ConfigError::InvalidHost(_))));

    clear_env();
}

#[test]
#[serial]
fn test_overrides_replace_env_values() {
    clear_env();
    env::set_var("CASEBOOK_PORT", "5000");

    let config = Config::from_env()
        .unwrap()
        .with_overrides(ConfigOverrides {
            port: Some(6000),
            db_path: Some(PathBuf::from("/data/casebook.db")),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(config.port, 6000);
    assert_eq!(config.db_path, PathBuf::from("/data/casebook.db"));
    assert_eq!(config.cors_origin, DEFAULT_CORS_ORIGIN);

    let zero = Config::from_env().unwrap().with_overrides(ConfigOverrides {
        port: Some(0),
        ..Default::default()
    });
    assert!(matches!(zero, Err(ConfigError::PortOutOfRange(0))));

    clear_env();
}
