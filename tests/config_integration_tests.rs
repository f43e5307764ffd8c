//! Integration tests for ConfigManager and configuration file handling
//!
//! These tests verify:
//! - Defaults when no configuration file exists
//! - Partial files fill the rest from defaults
//! - Parse errors are reported with the file path
//! - Integration with StateManager

use hwp_merge::models::{AppConfig, MergeDefaults};
use hwp_merge::{ConfigManager, SortMode, StateManager};
use camino::Utf8PathBuf;
use std::fs;
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_dir) = create_test_config_dir();
    let manager = ConfigManager::new(&config_dir);

    assert_eq!(manager.config_dir(), config_dir.as_path());
    assert_eq!(manager.config_path(), config_dir.join("hwp-merge.yaml").as_path());
}

#[test]
fn test_missing_file_gives_defaults() {
    let (_temp_dir, config_dir) = create_test_config_dir();
    let manager = ConfigManager::new(config_dir.join("does-not-exist"));

    let config = manager.load().unwrap();

    assert_eq!(config, AppConfig::default());
    assert_eq!(config.automation.prog_id, "HWPFrame.HwpObject");
    assert!(config.merge.export_pdf);

    // Loading never creates anything on disk
    assert!(!manager.config_dir().exists());
}

#[test]
fn test_full_config_file() {
    let (_temp_dir, config_dir) = create_test_config_dir();
    fs::write(
        config_dir.join("hwp-merge.yaml"),
        r#"
merge:
  keep_section: false
  keep_char: true
  keep_para: false
  keep_style: true
  export_pdf: false
  sort_mode: manual
automation:
  prog_id: "HWPFrame.HwpObject.2"
  security_module: ""
  visible: true
logging:
  debug: true
  console: false
  dir: "C:/temp/hwp-logs"
"#,
    )
    .unwrap();

    let config = ConfigManager::new(&config_dir).load().unwrap();

    assert!(!config.merge.keep_section);
    assert!(!config.merge.keep_para);
    assert!(!config.merge.export_pdf);
    assert_eq!(config.merge.sort_mode, SortMode::Manual);
    assert_eq!(config.automation.prog_id, "HWPFrame.HwpObject.2");
    assert!(config.automation.security_module.is_empty());
    assert!(config.automation.visible);
    assert!(config.logging.debug);
    assert!(!config.logging.console);
    assert_eq!(config.logging.dir, "C:/temp/hwp-logs");
}

#[test]
fn test_partial_config_uses_defaults() {
    let (_temp_dir, config_dir) = create_test_config_dir();
    fs::write(
        config_dir.join("hwp-merge.yaml"),
        "merge:\n  export_pdf: false\n",
    )
    .unwrap();

    let config = ConfigManager::new(&config_dir).load().unwrap();

    assert_eq!(
        config.merge,
        MergeDefaults {
            export_pdf: false,
            ..MergeDefaults::default()
        }
    );
    assert_eq!(config.automation, Default::default());
    assert_eq!(config.logging, Default::default());
}

#[test]
fn test_invalid_yaml_reports_path() {
    let (_temp_dir, config_dir) = create_test_config_dir();
    fs::write(
        config_dir.join("hwp-merge.yaml"),
        "merge:\n  sort_mode: sideways\n",
    )
    .unwrap();

    let err = ConfigManager::new(&config_dir).load().unwrap_err();
    let message = format!("{:#}", err);

    assert!(message.contains("Failed to parse config"));
    assert!(message.contains("hwp-merge.yaml"));
}

#[test]
fn test_config_seeds_state_manager() {
    let (_temp_dir, config_dir) = create_test_config_dir();
    fs::write(
        config_dir.join("hwp-merge.yaml"),
        "merge:\n  keep_char: false\n  sort_mode: manual\n",
    )
    .unwrap();

    let config = ConfigManager::new(&config_dir).load().unwrap();
    let state = StateManager::with_defaults(&config.merge);

    let snapshot = state.snapshot();
    assert!(!snapshot.keep.char_shape);
    assert!(snapshot.keep.style);
    assert_eq!(snapshot.files.sort_mode(), SortMode::Manual);
    assert!(snapshot.output_path.is_empty());
}
