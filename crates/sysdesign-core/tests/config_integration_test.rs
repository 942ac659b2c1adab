use std::fs;

use sysdesign_core::{
    ConfigError, ConfigManager, ConsistencyModel, ProfileCatalog, SysDesignConfig,
};
use tempfile::TempDir;

#[test]
fn test_default_config_file_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nested").join("config.toml");

    ConfigManager::create_default_config(&config_path).unwrap();
    assert!(config_path.exists());

    let manager = ConfigManager::load(Some(&config_path)).unwrap();
    assert_eq!(manager.config_path(), Some(config_path.as_path()));
    assert_eq!(manager.config().default_profile, "General");
    assert_eq!(
        manager.config().assumptions,
        SysDesignConfig::default().assumptions
    );
    assert_eq!(manager.catalog().len(), ProfileCatalog::builtin().len());
}

#[test]
fn test_partial_config_keeps_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("sysdesign.toml");
    fs::write(
        &config_path,
        r#"
default_profile = "Video Streaming Platform"

[assumptions]
daily_active_users = 5000000
payload_size_kb = 256

[service_levels]
availability = "99.9%"
consistency = "Eventual"

[media]
videos = true
resolution = "1080p"
"#,
    )
    .unwrap();

    let manager = ConfigManager::load(Some(&config_path)).unwrap();
    let config = manager.config();
    assert_eq!(config.assumptions.daily_active_users, 5_000_000);
    assert_eq!(config.assumptions.payload_size_kb, 256.0);
    assert_eq!(config.assumptions.requests_per_user_per_day, 20);
    assert_eq!(config.service_levels.consistency, ConsistencyModel::Eventual);
    assert_eq!(config.service_levels.rpo_minutes, 5);
    assert!(config.media.videos);

    let mut session = manager.new_session().unwrap();
    session.select_profile(&config.default_profile).unwrap();
    let summary = session.summary().unwrap();
    assert_eq!(summary.assumptions.daily_active_users, 5_000_000);
    assert!(summary.to_markdown(None).contains("Video Resolution: 1080p"));
}

#[test]
fn test_custom_catalog_relative_to_config() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("catalog.toml"),
        r#"
[[profile]]
name = "URL Shortener"
database_recommendation = "DynamoDB, Redis"
rationale = "Key-value lookups dominate"
architecture_layers = ["API Gateway", "App Server", "Cache", "KV Store"]

[profile.toggles]
"Use CDN" = true

[profile.params]
"Cache Hit Rate (%)" = 95.0
"#,
    )
    .unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        "default_profile = \"URL Shortener\"\ncatalog_path = \"catalog.toml\"\n",
    )
    .unwrap();

    let manager = ConfigManager::load(Some(&config_path)).unwrap();
    let catalog = manager.catalog();
    assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["URL Shortener"]);

    let mut session = manager.new_session().unwrap();
    session.select_profile("URL Shortener").unwrap();
    assert_eq!(session.effective_cache_hit_rate(), 95.0);
    assert_eq!(session.architecture_layers()[0], "CDN");
    assert!(session.select_profile("General").is_err());
}

#[test]
fn test_invalid_configs_are_rejected() {
    let temp_dir = TempDir::new().unwrap();

    let missing = temp_dir.path().join("missing.toml");
    assert!(matches!(
        ConfigManager::load(Some(&missing)),
        Err(ConfigError::NotFound(_))
    ));

    let broken = temp_dir.path().join("broken.toml");
    fs::write(&broken, "default_profile = [").unwrap();
    assert!(matches!(
        ConfigManager::load(Some(&broken)),
        Err(ConfigError::ParseError(_))
    ));

    let negative = temp_dir.path().join("negative.toml");
    fs::write(&negative, "[assumptions]\npeak_multiplier = -1.0\n").unwrap();
    assert!(matches!(
        ConfigManager::load(Some(&negative)),
        Err(ConfigError::ValidationError(_))
    ));

    let unknown_profile = temp_dir.path().join("unknown.toml");
    fs::write(&unknown_profile, "default_profile = \"Ride Sharing\"\n").unwrap();
    assert!(matches!(
        ConfigManager::load(Some(&unknown_profile)),
        Err(ConfigError::ValidationError(_))
    ));
}
