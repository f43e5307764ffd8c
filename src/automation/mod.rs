//! Document automation adapter.
//!
//! Everything the application does to a document goes through the Hangul word
//! processor's automation object. This module defines the narrow surface the merge
//! service needs:
//!
//! - [`DocumentAutomation`]: the handful of operations issued against one live
//!   connection (open, move to document end, insert file, save as, quit)
//! - [`AutomationProvider`]: acquires a fresh connection
//! - [`AutomationSession`]: scoped ownership of a connection, released on drop
//!
//! The Windows COM implementation lives in [`hwp`]. Everything else in the crate
//! only sees the traits, so the merge logic can be exercised without Hangul.

#[cfg(windows)]
pub mod hwp;

use crate::models::AutomationSettings;
use camino::Utf8Path;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use thiserror::Error;

/// The four formatting-preservation toggles passed to the insert-file operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepFlags {
    /// Keep the inserted file's section / page layout
    pub section: bool,
    /// Keep character shapes
    pub char_shape: bool,
    /// Keep paragraph shapes
    pub para_shape: bool,
    /// Keep named styles
    pub style: bool,
}

impl KeepFlags {
    pub const ALL: KeepFlags = KeepFlags {
        section: true,
        char_shape: true,
        para_shape: true,
        style: true,
    };

    pub const NONE: KeepFlags = KeepFlags {
        section: false,
        char_shape: false,
        para_shape: false,
        style: false,
    };
}

impl Default for KeepFlags {
    fn default() -> Self {
        Self::ALL
    }
}

/// Output format for a save-as call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Hwp,
    Hwpx,
    Pdf,
}

impl SaveFormat {
    /// Pick the format from a path's extension (case-insensitive).
    pub fn from_path(path: &Utf8Path) -> Option<Self> {
        match path.extension()?.to_ascii_lowercase().as_str() {
            "hwp" => Some(Self::Hwp),
            "hwpx" => Some(Self::Hwpx),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Format name understood by the automation object.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hwp => "HWP",
            Self::Hwpx => "HWPX",
            Self::Pdf => "PDF",
        }
    }
}

/// Errors raised by the automation layer itself (as opposed to an operation
/// reporting `false`).
#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Hangul automation is only available on Windows")]
    Unsupported,

    #[error("Hangul automation object '{0}' is not registered")]
    NotRegistered(String),

    #[error("Failed to start Hangul automation: {0}")]
    ConnectFailed(String),

    #[error("Automation call '{call}' failed: {message}")]
    CallFailed { call: String, message: String },
}

/// Operations issued against one live connection to the word processor.
///
/// Every operation returns `Ok(true)` on success. `Ok(false)` means the
/// application reported failure; `Err` means the call itself could not be made.
#[cfg_attr(test, mockall::automock)]
pub trait DocumentAutomation {
    /// Open `path` as the active document.
    fn open(&mut self, path: &Utf8Path) -> Result<bool, AutomationError>;

    /// Move the insertion point to the end of the active document.
    fn move_to_doc_end(&mut self) -> Result<bool, AutomationError>;

    /// Insert the contents of `path` at the insertion point.
    fn insert_file(&mut self, path: &Utf8Path, keep: KeepFlags) -> Result<bool, AutomationError>;

    /// Save the active document to `path` in `format`.
    fn save_as(&mut self, path: &Utf8Path, format: SaveFormat) -> Result<bool, AutomationError>;

    /// Discard the active document without prompting to save.
    fn clear(&mut self) -> Result<(), AutomationError>;

    /// Terminate the connection.
    fn quit(&mut self) -> Result<(), AutomationError>;
}

/// Acquires fresh connections to the word processor.
#[cfg_attr(test, mockall::automock)]
pub trait AutomationProvider {
    fn connect(&self) -> Result<Box<dyn DocumentAutomation>, AutomationError>;
}

/// Exclusive ownership of one connection for the duration of a scope.
///
/// The connection is terminated when the session is dropped, on every exit path:
/// the document is cleared, then quit is sent even if clearing failed. Failures of
/// either call are logged and swallowed.
pub struct AutomationSession {
    handle: Box<dyn DocumentAutomation>,
}

impl AutomationSession {
    /// Acquire a new connection from `provider`.
    pub fn acquire(provider: &dyn AutomationProvider) -> Result<Self, AutomationError> {
        let handle = provider.connect()?;
        tracing::debug!("Automation session acquired");
        Ok(Self { handle })
    }
}

impl Deref for AutomationSession {
    type Target = dyn DocumentAutomation;

    fn deref(&self) -> &Self::Target {
        self.handle.as_ref()
    }
}

impl DerefMut for AutomationSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.handle.as_mut()
    }
}

impl Drop for AutomationSession {
    fn drop(&mut self) {
        if let Err(e) = self.handle.clear() {
            tracing::warn!("Ignoring error while clearing document: {}", e);
        }
        match self.handle.quit() {
            Ok(()) => tracing::debug!("Automation session released"),
            Err(e) => tracing::warn!("Ignoring error while releasing automation session: {}", e),
        }
    }
}

/// Provider for this platform, or a startup error if Hangul automation is unavailable.
#[cfg(windows)]
pub fn default_provider(
    settings: &AutomationSettings,
) -> Result<Rc<dyn AutomationProvider>, AutomationError> {
    if !hwp::is_available(&settings.prog_id) {
        return Err(AutomationError::NotRegistered(settings.prog_id.clone()));
    }
    Ok(Rc::new(hwp::HwpProvider::new(
        settings.prog_id.as_str(),
        settings.security_module.as_str(),
        settings.visible,
    )))
}

/// Provider for this platform, or a startup error if Hangul automation is unavailable.
#[cfg(not(windows))]
pub fn default_provider(
    _settings: &AutomationSettings,
) -> Result<Rc<dyn AutomationProvider>, AutomationError> {
    Err(AutomationError::Unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_format_from_path() {
        assert_eq!(SaveFormat::from_path(Utf8Path::new("a.hwp")), Some(SaveFormat::Hwp));
        assert_eq!(SaveFormat::from_path(Utf8Path::new("A.HWPX")), Some(SaveFormat::Hwpx));
        assert_eq!(SaveFormat::from_path(Utf8Path::new("out.Pdf")), Some(SaveFormat::Pdf));
        assert_eq!(SaveFormat::from_path(Utf8Path::new("notes.docx")), None);
        assert_eq!(SaveFormat::from_path(Utf8Path::new("noext")), None);
    }

    #[test]
    fn test_session_quits_on_drop() {
        let mut seq = mockall::Sequence::new();
        let mut doc = MockDocumentAutomation::new();
        doc.expect_clear()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        doc.expect_quit()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));

        let mut provider = MockAutomationProvider::new();
        provider
            .expect_connect()
            .return_once(move || Ok(Box::new(doc) as Box<dyn DocumentAutomation>));

        let session = AutomationSession::acquire(&provider).unwrap();
        drop(session);
    }

    #[test]
    fn test_session_swallows_quit_error() {
        let mut doc = MockDocumentAutomation::new();
        doc.expect_clear().returning(|| Ok(()));
        doc.expect_quit().times(1).returning(|| {
            Err(AutomationError::CallFailed {
                call: "Quit".to_string(),
                message: "already gone".to_string(),
            })
        });

        let mut provider = MockAutomationProvider::new();
        provider
            .expect_connect()
            .return_once(move || Ok(Box::new(doc) as Box<dyn DocumentAutomation>));

        // Dropping must not panic even though quit fails
        let session = AutomationSession::acquire(&provider).unwrap();
        drop(session);
    }

    #[test]
    fn test_session_quits_after_failed_clear() {
        let mut doc = MockDocumentAutomation::new();
        doc.expect_clear().times(1).returning(|| {
            Err(AutomationError::CallFailed {
                call: "Clear".to_string(),
                message: "document is busy".to_string(),
            })
        });
        doc.expect_quit().times(1).returning(|| Ok(()));

        let mut provider = MockAutomationProvider::new();
        provider
            .expect_connect()
            .return_once(move || Ok(Box::new(doc) as Box<dyn DocumentAutomation>));

        let session = AutomationSession::acquire(&provider).unwrap();
        drop(session);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_default_provider_unsupported_off_windows() {
        let result = default_provider(&AutomationSettings::default());
        assert!(matches!(result, Err(AutomationError::Unsupported)));
    }

    #[test]
    fn test_acquire_failure_propagates() {
        let mut provider = MockAutomationProvider::new();
        provider
            .expect_connect()
            .return_once(|| Err(AutomationError::NotRegistered("HWPFrame.HwpObject".into())));

        let result = AutomationSession::acquire(&provider);
        assert!(matches!(result, Err(AutomationError::NotRegistered(_))));
    }
}
