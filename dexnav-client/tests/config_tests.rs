use std::io::Write;
use std::time::Duration;

use dexnav_client::config::{ClientConfig, ConfigError};
use dexnav_core::{BuildMode, PartitionRange};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

const FULL: &str = r#"
api_base_url = "https://dex.example"
request_timeout_ms = 3000
build_mode = "static"
upgrade_delay_ms = 1500
scroll_debounce_ms = 200
preload_enabled = false
preload_delay_ms = 800
partition_ttl_secs = 600
position_ttl_secs = 900
position_max_entries = 32

[partitions]
first = 1
last = 4
"#;

#[test]
fn test_loads_full_config_from_file() {
    let file = write_config(FULL);
    let config = ClientConfig::from_path(file.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.build_mode(), BuildMode::Static);
    assert_eq!(config.upgrade_delay(), Duration::from_millis(1500));
    assert_eq!(config.preload_delay(), Duration::from_millis(800));
    assert_eq!(config.position_ttl(), Duration::from_secs(900));
    assert_eq!(config.position_max_entries, Some(32));
    assert_eq!(config.partition_range(), PartitionRange::new(1, 4));
    assert!(!config.preload_enabled);
}

#[test]
fn test_example_config_matches_recommended() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../dexnav.example.toml");
    let config = ClientConfig::from_path(std::path::Path::new(path)).unwrap();
    assert_eq!(config, ClientConfig::recommended("http://localhost:3000"));
}

#[test]
fn test_rejects_unknown_keys() {
    let file = write_config(&FULL.replace("[partitions]", "retry_forever = true\n\n[partitions]"));
    assert!(matches!(
        ClientConfig::from_path(file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_missing_required_key_fails_to_parse() {
    let file = write_config(&FULL.replace("upgrade_delay_ms = 1500\n", ""));
    assert!(matches!(
        ClientConfig::from_path(file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_zero_debounce_is_rejected() {
    let file = write_config(&FULL.replace("scroll_debounce_ms = 200", "scroll_debounce_ms = 0"));
    let config = ClientConfig::from_path(file.path()).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue { field: "scroll_debounce_ms", .. })
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ClientConfig::from_path(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_load_uses_explicit_path_and_validates() {
    let file = write_config(FULL);
    let config = ClientConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.api_base_url, "https://dex.example");

    let file = write_config(&FULL.replace("request_timeout_ms = 3000", "request_timeout_ms = 0"));
    assert!(matches!(
        ClientConfig::load(Some(file.path())),
        Err(ConfigError::InvalidValue { field: "request_timeout_ms", .. })
    ));
}
