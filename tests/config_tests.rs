// Config loading and validation tests

use zonneplan::config::AppConfig;
use zonneplan::models::Category;

const VALID_CONFIG: &str = r#"
[server]
port = 8081
host = "0.0.0.0"

[source]
path = "data/snapshot.json"
poll_interval_secs = 60

[state]
path = "data/state.db"
flush_rate = 10

[publishing]
broadcast_capacity = 64

[monitoring]
stats_log_interval_secs = 60
"#;

const CATALOG_SECTION: &str = r#"
[catalog]
categories = ["summary", "pv", "p1"]
daily_update_hours = { gas_today = 8, pv_yield_today = 0 }
"#;

fn with_catalog() -> String {
    format!("{VALID_CONFIG}{CATALOG_SECTION}")
}

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.source.path, "data/snapshot.json");
    assert_eq!(config.source.poll_interval_secs, 60);
    assert_eq!(config.state.path, "data/state.db");
    assert_eq!(config.state.flush_rate, 10);
    assert_eq!(config.publishing.broadcast_capacity, 64);
    assert_eq!(config.monitoring.stats_log_interval_secs, 60);
}

#[test]
fn test_config_defaults_when_omitted() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("valid");
    assert_eq!(config.state.flush_interval_secs, 30);
    assert_eq!(config.catalog.categories, Category::ALL.to_vec());
    assert!(config.catalog.daily_update_hours.is_empty());
}

#[test]
fn test_config_loads_catalog_section() {
    let config = AppConfig::load_from_str(&with_catalog()).expect("valid");
    assert_eq!(
        config.catalog.categories,
        vec![Category::Summary, Category::Photovoltaic, Category::GridMeter]
    );
    let catalog = config.catalog.to_catalog_config();
    assert!(catalog.is_enabled(Category::GridMeter));
    assert!(!catalog.is_enabled(Category::ChargePoint));
    assert_eq!(catalog.daily_update_hours.get("gas_today"), Some(&8));
    assert_eq!(catalog.daily_update_hours.get("pv_yield_today"), Some(&0));
}

#[test]
fn test_config_accepts_full_category_names() {
    let toml = with_catalog().replace(
        r#"categories = ["summary", "pv", "p1"]"#,
        r#"categories = ["photovoltaic", "grid_meter", "charge_point"]"#,
    );
    let config = AppConfig::load_from_str(&toml).expect("valid");
    assert_eq!(
        config.catalog.categories,
        vec![Category::Photovoltaic, Category::GridMeter, Category::ChargePoint]
    );
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = VALID_CONFIG.replace("port = 8081", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_empty_source_path() {
    let bad = VALID_CONFIG.replace("path = \"data/snapshot.json\"", "path = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("source.path"));
}

#[test]
fn test_config_validation_rejects_poll_interval_zero() {
    let bad = VALID_CONFIG.replace("poll_interval_secs = 60", "poll_interval_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("poll_interval_secs"));
}

#[test]
fn test_config_validation_rejects_empty_state_path() {
    let bad = VALID_CONFIG.replace("path = \"data/state.db\"", "path = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("state.path"));
}

#[test]
fn test_config_validation_rejects_flush_rate_zero() {
    let bad = VALID_CONFIG.replace("flush_rate = 10", "flush_rate = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("flush_rate"));
}

#[test]
fn test_config_validation_rejects_huge_flush_rate() {
    let bad = VALID_CONFIG.replace("flush_rate = 10", "flush_rate = 1000000");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("state.flush_rate must be <="));
}

#[test]
fn test_config_validation_rejects_flush_interval_zero() {
    let bad = VALID_CONFIG.replace("flush_rate = 10", "flush_rate = 10\nflush_interval_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("flush_interval_secs"));
}

#[test]
fn test_config_validation_rejects_broadcast_capacity_zero() {
    let bad = VALID_CONFIG.replace("broadcast_capacity = 64", "broadcast_capacity = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("broadcast_capacity"));
}

#[test]
fn test_config_validation_rejects_stats_log_interval_zero() {
    let bad = VALID_CONFIG.replace(
        "stats_log_interval_secs = 60",
        "stats_log_interval_secs = 0",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("stats_log_interval_secs"));
}

#[test]
fn test_config_validation_rejects_empty_categories() {
    let bad = with_catalog().replace(r#"["summary", "pv", "p1"]"#, "[]");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("catalog.categories"));
}

#[test]
fn test_config_validation_rejects_unknown_category() {
    let bad = with_catalog().replace(r#""p1""#, r#""battery""#);
    assert!(AppConfig::load_from_str(&bad).is_err());
}

#[test]
fn test_config_validation_rejects_unknown_sensor_key() {
    let bad = with_catalog().replace("gas_today = 8", "gas_tomorrow = 8");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("gas_tomorrow"));
}

#[test]
fn test_config_validation_rejects_hour_out_of_range() {
    let bad = with_catalog().replace("gas_today = 8", "gas_today = 24");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("catalog.daily_update_hours.gas_today"));
}

#[test]
fn test_config_validation_rejects_invalid_toml() {
    let err = AppConfig::load_from_str("not valid toml [[[").unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_config_load_from_file_via_env() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    unsafe { std::env::set_var("CONFIG_FILE", path.to_str().unwrap()) };
    let result = AppConfig::load();
    unsafe { std::env::remove_var("CONFIG_FILE") };
    let config = result.expect("load from CONFIG_FILE");
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.state.path, "data/state.db");
}
