use crate::automation::KeepFlags;
use crate::models::file_list::SortMode;
use serde::{Deserialize, Serialize};

/// Startup defaults from `hwp-merge.yaml`
///
/// Every section and key is optional; anything missing takes its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub merge: MergeDefaults,
    pub automation: AutomationSettings,
    pub logging: LoggingSettings,
}

/// Initial values for the merge options in the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeDefaults {
    pub keep_section: bool,
    pub keep_char: bool,
    pub keep_para: bool,
    pub keep_style: bool,
    pub export_pdf: bool,
    pub sort_mode: SortMode,
}

impl Default for MergeDefaults {
    fn default() -> Self {
        Self {
            keep_section: true,
            keep_char: true,
            keep_para: true,
            keep_style: true,
            export_pdf: true,
            sort_mode: SortMode::Name,
        }
    }
}

impl MergeDefaults {
    pub fn keep_flags(&self) -> KeepFlags {
        KeepFlags {
            section: self.keep_section,
            char_shape: self.keep_char,
            para_shape: self.keep_para,
            style: self.keep_style,
        }
    }
}

/// How to reach the word processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationSettings {
    /// COM ProgID of the automation object
    pub prog_id: String,

    /// File-path security module to register; empty disables registration
    pub security_module: String,

    /// Show the word processor window while merging
    pub visible: bool,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            prog_id: "HWPFrame.HwpObject".to_string(),
            security_module: "FilePathCheckerModule".to_string(),
            visible: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub debug: bool,
    pub console: bool,
    pub dir: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            debug: false,
            console: true,
            dir: "logs".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_defaults() {
        let defaults = MergeDefaults::default();
        assert!(defaults.export_pdf);
        assert_eq!(defaults.sort_mode, SortMode::Name);
        assert_eq!(defaults.keep_flags(), KeepFlags::ALL);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "merge:\n  keep_style: false\n  sort_mode: manual\nlogging:\n  debug: true\n";
        let config: AppConfig = serde_yaml_ng::from_str(yaml).unwrap();

        assert!(!config.merge.keep_style);
        assert!(config.merge.keep_section);
        assert_eq!(config.merge.sort_mode, SortMode::Manual);
        assert!(config.logging.debug);
        assert_eq!(config.logging.dir, "logs");
        assert_eq!(config.automation.prog_id, "HWPFrame.HwpObject");
    }
}
