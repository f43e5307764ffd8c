//! Data models for the merger.
//!
//! - [`FileList`]: the ordered, duplicate-free list of input documents and its editing
//!   operations (add, remove, clear, sort by name, manual moves)
//! - [`AppState`]: file list, selection, merge options, output path and status; what
//!   the window displays, kept separate from the window so it can be tested headless
//! - [`AppConfig`]: startup defaults loaded from `hwp-merge.yaml`

pub mod app_state;
pub mod config;
pub mod file_list;

pub use app_state::{AppState, MergeStatus, ValidationError};
pub use config::{AppConfig, AutomationSettings, LoggingSettings, MergeDefaults};
pub use file_list::{FileList, FileListError, MoveDirection, SortMode, SUPPORTED_EXTENSIONS, is_supported};
