#![allow(clippy::unwrap_used)]

use super::*;
use std::collections::HashMap;
use std::io::Write;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults() {
    let cfg = Config::default();
    assert!(cfg.db_path.is_none());
    assert_eq!(cfg.log_filter, "warn");
    assert_eq!(cfg.busy_timeout(), Duration::from_secs(5));
    assert!(!cfg.expense_rules().allow_non_positive_amounts);
}

#[test]
fn test_missing_file_is_default() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config::load_from(&dir.path().join("nope.json")).unwrap();
    assert_eq!(cfg, Config::default());
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(br#"{"allow_non_positive_amounts": true, "db_path": "/tmp/x.db"}"#)
        .unwrap();
    let cfg = Config::load_from(file.path()).unwrap();
    assert!(cfg.allow_non_positive_amounts);
    assert_eq!(cfg.db_path, Some(PathBuf::from("/tmp/x.db")));
    assert_eq!(cfg.log_filter, "warn");
    assert_eq!(cfg.busy_timeout_ms, 5000);
}

#[test]
fn test_invalid_file_is_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"{ not json").unwrap();
    let err = Config::load_from(file.path()).unwrap_err();
    assert!(err.to_string().contains("Invalid config file"));
}

#[test]
fn test_env_overrides() {
    let cfg = Config::default()
        .apply_env(env(&[
            ("SPENDLOG_DB", "/data/spend.db"),
            ("SPENDLOG_LOG", "debug"),
            ("SPENDLOG_BUSY_TIMEOUT_MS", "250"),
            ("SPENDLOG_ALLOW_NON_POSITIVE", "yes"),
        ]))
        .unwrap();
    assert_eq!(cfg.db_path().unwrap(), PathBuf::from("/data/spend.db"));
    assert_eq!(cfg.log_filter, "debug");
    assert_eq!(cfg.busy_timeout(), Duration::from_millis(250));
    assert!(cfg.expense_rules().allow_non_positive_amounts);
}

#[test]
fn test_spendlog_log_wins_over_rust_log() {
    let cfg = Config::default()
        .apply_env(env(&[("RUST_LOG", "trace"), ("SPENDLOG_LOG", "info")]))
        .unwrap();
    assert_eq!(cfg.log_filter, "info");

    let cfg = Config::default()
        .apply_env(env(&[("RUST_LOG", "trace")]))
        .unwrap();
    assert_eq!(cfg.log_filter, "trace");
}

#[test]
fn test_bad_env_values() {
    assert!(Config::default()
        .apply_env(env(&[("SPENDLOG_BUSY_TIMEOUT_MS", "soon")]))
        .is_err());
    assert!(Config::default()
        .apply_env(env(&[("SPENDLOG_ALLOW_NON_POSITIVE", "maybe")]))
        .is_err());
}

#[test]
fn test_parse_bool() {
    assert_eq!(parse_bool("TRUE"), Some(true));
    assert_eq!(parse_bool(" 0 "), Some(false));
    assert_eq!(parse_bool("off"), Some(false));
    assert_eq!(parse_bool(""), None);
}
