//! Application state - file list, merge options, output path and status.

use crate::automation::KeepFlags;
use crate::models::config::MergeDefaults;
use crate::models::file_list::{FileList, FileListError, MoveDirection, SortMode, is_supported};
use crate::services::{MergeError, MergeOutcome, MergeRequest};
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use thiserror::Error;

/// Merge status shown in the window's status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStatus {
    #[default]
    Ready,
    Merging,
    Done,
    Error,
}

impl fmt::Display for MergeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ready => "Ready",
            Self::Merging => "Merging…",
            Self::Done => "Done",
            Self::Error => "Error",
        };
        f.write_str(label)
    }
}

/// Reasons the merge button refuses to start a merge
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Add files to merge first.")]
    NoFiles,

    #[error("Choose where to save the merged file.")]
    NoOutputPath,

    #[error("Save as a .hwp or .hwpx file.")]
    UnsupportedOutputExtension,
}

/// Everything the window shows, independent of the window itself.
///
/// [`StateManager`](crate::state::StateManager) wraps this for shared access and change
/// events; the type itself holds no locks and can be tested directly.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    /// Input documents in merge order
    pub files: FileList,

    /// Selected rows, sorted ascending
    pub selection: Vec<usize>,

    // Merge options
    pub keep: KeepFlags,
    pub export_pdf: bool,
    pub output_path: String,

    // Runtime state
    pub status: MergeStatus,
}

impl AppState {
    /// State seeded from configured defaults.
    pub fn with_defaults(defaults: &MergeDefaults) -> Self {
        Self {
            files: FileList::new(defaults.sort_mode),
            keep: defaults.keep_flags(),
            export_pdf: defaults.export_pdf,
            ..Self::default()
        }
    }

    pub fn is_merging(&self) -> bool {
        self.status == MergeStatus::Merging
    }

    /// Add files, clearing the selection. Returns how many were added.
    pub fn add_files<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        self.selection.clear();
        self.files.add(paths)
    }

    /// Remove the selected rows.
    pub fn remove_selected(&mut self) -> Result<usize, FileListError> {
        let removed = self.files.remove(&self.selection)?;
        self.selection.clear();
        Ok(removed)
    }

    pub fn clear_files(&mut self) {
        self.files.clear();
        self.selection.clear();
    }

    /// Toggle selection of one row. Out-of-range rows are ignored.
    pub fn toggle_selection(&mut self, index: usize) {
        if index >= self.files.len() {
            return;
        }
        match self.selection.binary_search(&index) {
            Ok(pos) => {
                self.selection.remove(pos);
            }
            Err(pos) => self.selection.insert(pos, index),
        }
    }

    /// Move the selected rows, keeping the same files selected.
    pub fn move_selection(&mut self, direction: MoveDirection) -> Result<(), FileListError> {
        self.selection = self.files.move_selected(&self.selection, direction)?;
        Ok(())
    }

    pub fn set_sort_mode(&mut self, mode: SortMode) {
        if mode == SortMode::Name {
            self.selection.clear();
        }
        self.files.set_sort_mode(mode);
    }

    /// Check the inputs and build the request for the merge service.
    pub fn merge_request(&self) -> Result<MergeRequest, ValidationError> {
        if self.files.is_empty() {
            return Err(ValidationError::NoFiles);
        }

        let output = self.output_path.trim();
        if output.is_empty() {
            return Err(ValidationError::NoOutputPath);
        }
        if !is_supported(Utf8Path::new(output)) {
            return Err(ValidationError::UnsupportedOutputExtension);
        }

        Ok(MergeRequest {
            output_path: Utf8PathBuf::from(output),
            inputs: self.files.to_vec(),
            keep: self.keep,
            export_pdf: self.export_pdf,
        })
    }

    /// Record the result of a merge. Returns the text to show the user: the
    /// produced files on success, the error message as-is on failure.
    pub fn finish_merge(&mut self, result: &Result<MergeOutcome, MergeError>) -> String {
        match result {
            Ok(outcome) => {
                self.status = MergeStatus::Done;
                success_message(outcome)
            }
            Err(e) => {
                self.status = MergeStatus::Error;
                e.to_string()
            }
        }
    }
}

/// Text shown after a successful merge
fn success_message(outcome: &MergeOutcome) -> String {
    let mut message = format!("Merge complete\n{}", outcome.output);
    if let Some(pdf) = &outcome.pdf {
        message.push_str(&format!("\n{} saved", pdf));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_files() -> AppState {
        let mut state = AppState::default();
        state.files.set_sort_mode(SortMode::Manual);
        state.add_files(["b.hwp", "a.hwp", "c.hwpx"]);
        state
    }

    #[test]
    fn test_defaults() {
        let state = AppState::with_defaults(&MergeDefaults::default());
        assert!(state.files.is_empty());
        assert_eq!(state.files.sort_mode(), SortMode::Name);
        assert_eq!(state.keep, KeepFlags::ALL);
        assert!(state.export_pdf);
        assert_eq!(state.status, MergeStatus::Ready);
    }

    #[test]
    fn test_toggle_selection() {
        let mut state = state_with_files();
        state.toggle_selection(2);
        state.toggle_selection(0);
        assert_eq!(state.selection, vec![0, 2]);

        state.toggle_selection(2);
        assert_eq!(state.selection, vec![0]);

        state.toggle_selection(10);
        assert_eq!(state.selection, vec![0]);
    }

    #[test]
    fn test_move_keeps_files_selected() {
        let mut state = state_with_files();
        state.toggle_selection(0);
        state.move_selection(MoveDirection::Down).unwrap();

        assert_eq!(state.selection, vec![1]);
        assert_eq!(state.files.get(1), Some(Utf8Path::new("b.hwp")));
    }

    #[test]
    fn test_remove_selected() {
        let mut state = state_with_files();
        state.toggle_selection(0);
        state.toggle_selection(2);

        assert_eq!(state.remove_selected(), Ok(2));
        assert_eq!(state.files.to_vec(), vec![Utf8PathBuf::from("a.hwp")]);
        assert!(state.selection.is_empty());
    }

    #[test]
    fn test_merge_request_validation() {
        let mut state = AppState::default();
        assert_eq!(state.merge_request(), Err(ValidationError::NoFiles));

        state.add_files(["a.hwp"]);
        state.output_path = "   ".to_string();
        assert_eq!(state.merge_request(), Err(ValidationError::NoOutputPath));

        state.output_path = "merged.docx".to_string();
        assert_eq!(
            state.merge_request(),
            Err(ValidationError::UnsupportedOutputExtension)
        );

        state.output_path = " merged.HWPX ".to_string();
        let request = state.merge_request().unwrap();
        assert_eq!(request.output_path, Utf8PathBuf::from("merged.HWPX"));
        assert_eq!(request.inputs, vec![Utf8PathBuf::from("a.hwp")]);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(MergeStatus::Ready.to_string(), "Ready");
        assert_eq!(MergeStatus::Done.to_string(), "Done");
        assert_eq!(MergeStatus::Error.to_string(), "Error");
    }

    #[test]
    fn test_finish_merge_success() {
        let mut state = state_with_files();
        state.status = MergeStatus::Merging;

        let message = state.finish_merge(&Ok(MergeOutcome {
            output: Utf8PathBuf::from("C:/out/merged.hwp"),
            pdf: Some(Utf8PathBuf::from("C:/out/merged.pdf")),
        }));

        assert_eq!(state.status, MergeStatus::Done);
        assert_eq!(message, "Merge complete\nC:/out/merged.hwp\nC:/out/merged.pdf saved");

        let message = state.finish_merge(&Ok(MergeOutcome {
            output: Utf8PathBuf::from("merged.hwp"),
            pdf: None,
        }));
        assert_eq!(message, "Merge complete\nmerged.hwp");
    }

    #[test]
    fn test_finish_merge_error_keeps_message() {
        let mut state = state_with_files();
        state.status = MergeStatus::Merging;

        let error = MergeError::FileNotFound(Utf8PathBuf::from("C:/docs/gone.hwp"));
        let expected = error.to_string();
        let message = state.finish_merge(&Err(error));

        assert_eq!(state.status, MergeStatus::Error);
        assert_eq!(message, expected);
        // The file list is left as it was
        assert_eq!(state.files.len(), 3);
    }
}
