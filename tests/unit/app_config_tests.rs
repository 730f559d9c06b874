/*!
 * Tests for configuration file handling
 */

use locsync::app_config::{Config, LogLevel, TranslationProvider};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("conf.json");

    let (config, created) = Config::load_or_create(&path).unwrap();

    assert!(created);
    assert!(path.exists());
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert_eq!(config.sync.locale_concurrency, 3);

    let (_, created_again) = Config::load_or_create(&path).unwrap();
    assert!(!created_again);
}

#[test]
fn test_save_withCustomValues_shouldReloadIdentically() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("conf.json");

    let mut config = Config::for_site("site-42");
    config.branch = Some("staging".to_string());
    config.store.api_token = "secret".to_string();
    config.translation.provider = TranslationProvider::Anthropic;
    config.sync.batch_size = 5;
    config.log_level = LogLevel::Debug;
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.site_id, "site-42");
    assert_eq!(loaded.branch.as_deref(), Some("staging"));
    assert_eq!(loaded.store.api_token, "secret");
    assert_eq!(loaded.translation.provider, TranslationProvider::Anthropic);
    assert_eq!(loaded.sync.batch_size, 5);
    assert_eq!(loaded.sync_options().branch.as_deref(), Some("staging"));
    assert_eq!(loaded.translation_options().batch_size, 5);
}

#[test]
fn test_load_withInvalidJson_shouldFailWithPath() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    let error = Config::load(&path).unwrap_err();
    assert!(error.to_string().contains("broken.json"));
}

#[test]
fn test_load_withMissingFile_shouldFail() {
    let dir = tempdir().unwrap();
    assert!(Config::load(&dir.path().join("absent.json")).is_err());
}

#[test]
fn test_validate_withDefaultFile_shouldRequireSiteAndToken() {
    let mut config = Config::default();
    assert!(config.validate().unwrap_err().to_string().contains("site_id"));

    config.site_id = "site".to_string();
    config.store.api_token = "tok".to_string();
    assert!(config.validate().is_ok());

    config.store.endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
}
