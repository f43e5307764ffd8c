// GUI Controller - Bridges the Slint window with the merger state
//
// This module contains the GuiController which coordinates between:
// - Slint UI (MainWindow)
// - StateManager (file list, options, status)
// - MergeService (drives the word processor)
//
// It handles:
// - Setting up UI callbacks -> state updates
// - Subscribing to state change events and applying them to the window
// - Native file dialogs
// - Running the merge and reporting the result

use crate::automation::{AutomationProvider, KeepFlags};
use crate::models::{FileListError, MergeStatus, MoveDirection, SUPPORTED_EXTENSIONS, SortMode, is_supported};
use crate::services::{MergeRequest, MergeService};
use crate::state::{StateChange, StateManager};
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use slint::{ComponentHandle, ModelRc, SharedString, VecModel};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

// Include the generated Slint code
slint::include_modules!();

/// Delay before a merge starts, so the "Merging…" status is painted first
const MERGE_START_DELAY: Duration = Duration::from_millis(50);

/// GUI Controller that wires up the Slint window with application state
///
/// Callbacks only mutate the StateManager; the window follows its change events.
/// The merge itself runs on the UI thread and blocks the event loop until the word
/// processor finishes, which also keeps the COM apartment on a single thread.
///
/// # Example
/// ```ignore
/// let state_manager = Arc::new(StateManager::new());
/// let provider = default_provider(&AutomationSettings::default())?;
///
/// let controller = GuiController::new(state_manager, provider)?;
/// controller.run()?;  // Blocks until window is closed
/// ```
pub struct GuiController {
    /// The Slint UI window
    ui: MainWindow,

    /// Shared state manager
    _state_manager: Arc<StateManager>,
}

impl GuiController {
    /// Create a new GUI controller
    ///
    /// # Arguments
    /// * `state_manager` - Shared application state manager
    /// * `provider` - Source of word processor connections, one per merge
    pub fn new(
        state_manager: Arc<StateManager>,
        provider: Rc<dyn AutomationProvider>,
    ) -> Result<Self> {
        let ui = MainWindow::new().context("Failed to create Slint UI")?;

        Self::sync_ui_with_state(&ui, &state_manager);
        Self::setup_callbacks(&ui, &state_manager, provider);
        Self::setup_state_subscription(&ui, &state_manager);

        tracing::info!("GUI controller initialized");

        Ok(Self {
            ui,
            _state_manager: state_manager,
        })
    }

    /// Run the GUI (blocks until window is closed)
    pub fn run(self) -> Result<(), slint::PlatformError> {
        tracing::info!("Starting GUI event loop");
        self.ui.run()
    }

    /// Push the whole state into the window. Called once at startup.
    fn sync_ui_with_state(ui: &MainWindow, state_manager: &StateManager) {
        let state = state_manager.snapshot();

        ui.set_files(Self::file_rows(state_manager));
        ui.set_sort_mode_index(sort_mode_index(state.files.sort_mode()));

        ui.set_keep_section(state.keep.section);
        ui.set_keep_char(state.keep.char_shape);
        ui.set_keep_para(state.keep.para_shape);
        ui.set_keep_style(state.keep.style);
        ui.set_export_pdf(state.export_pdf);
        ui.set_output_path(state.output_path.clone().into());

        ui.set_status_text(state.status.to_string().into());
        ui.set_is_merging(state.is_merging());

        tracing::debug!("UI synchronized with initial state");
    }

    /// Apply state change events to the window
    fn apply_changes(ui: &MainWindow, state_manager: &StateManager, changes: &[StateChange]) {
        for change in changes {
            tracing::trace!("Applying state change: {:?}", change);

            match change {
                StateChange::FilesChanged { .. } | StateChange::SelectionChanged => {
                    ui.set_files(Self::file_rows(state_manager));
                }

                StateChange::SortModeChanged { mode } => {
                    ui.set_sort_mode_index(sort_mode_index(*mode));
                }

                StateChange::OptionsChanged => {
                    let (keep, export_pdf) = state_manager.read(|s| (s.keep, s.export_pdf));
                    ui.set_keep_section(keep.section);
                    ui.set_keep_char(keep.char_shape);
                    ui.set_keep_para(keep.para_shape);
                    ui.set_keep_style(keep.style);
                    ui.set_export_pdf(export_pdf);
                }

                StateChange::OutputPathChanged => {
                    // Skip while the user is typing so the edit cursor is left alone
                    let path = state_manager.read(|s| s.output_path.clone());
                    if ui.get_output_path().as_str() != path {
                        ui.set_output_path(path.into());
                    }
                }

                StateChange::StatusChanged { status } => {
                    ui.set_status_text(status.to_string().into());
                    ui.set_is_merging(*status == MergeStatus::Merging);
                }
            }
        }
    }

    fn file_rows(state_manager: &StateManager) -> ModelRc<FileRow> {
        let rows: Vec<FileRow> = state_manager.read(|s| {
            s.files
                .iter()
                .enumerate()
                .map(|(index, path)| FileRow {
                    name: path.file_name().unwrap_or(path.as_str()).into(),
                    path: path.as_str().into(),
                    selected: s.selection.binary_search(&index).is_ok(),
                })
                .collect()
        });
        ModelRc::new(VecModel::from(rows))
    }

    /// Set up Slint UI callbacks
    fn setup_callbacks(
        ui: &MainWindow,
        state_manager: &Arc<StateManager>,
        provider: Rc<dyn AutomationProvider>,
    ) {
        let state = state_manager.clone();

        ui.on_add_files(move || {
            tracing::debug!("Add files clicked");

            if let Some(paths) = Self::show_files_picker() {
                state.add_files(paths);
            }
        });

        let state = state_manager.clone();

        ui.on_remove_selected(move || {
            tracing::debug!("Remove selected clicked");

            if let Err(e) = state.remove_selected() {
                tracing::warn!("Could not remove selection: {}", e);
            }
        });

        let state = state_manager.clone();

        ui.on_clear_files(move || {
            tracing::info!("Clearing file list");
            state.clear_files();
        });

        let state = state_manager.clone();

        ui.on_row_clicked(move |index| {
            if let Ok(index) = usize::try_from(index) {
                state.toggle_selection(index);
            }
        });

        ui.on_move_up(Self::move_handler(state_manager, ui, MoveDirection::Up));
        ui.on_move_down(Self::move_handler(state_manager, ui, MoveDirection::Down));

        let state = state_manager.clone();

        ui.on_sort_mode_changed(move |index| {
            let mode = sort_mode_from_index(index);
            tracing::info!("Sort mode changed to {:?}", mode);
            state.set_sort_mode(mode);
        });

        let state = state_manager.clone();
        let ui_weak = ui.as_weak();

        ui.on_options_changed(move || {
            let Some(ui) = ui_weak.upgrade() else {
                return;
            };
            let keep = KeepFlags {
                section: ui.get_keep_section(),
                char_shape: ui.get_keep_char(),
                para_shape: ui.get_keep_para(),
                style: ui.get_keep_style(),
            };
            let export_pdf = ui.get_export_pdf();
            tracing::debug!("Options changed: keep={:?}, pdf={}", keep, export_pdf);

            state.update(|s| {
                s.keep = keep;
                s.export_pdf = export_pdf;
            });
        });

        let state = state_manager.clone();

        ui.on_output_path_edited(move |text| {
            state.set_output_path(text.as_str());
        });

        let state = state_manager.clone();

        ui.on_browse_output(move || {
            tracing::debug!("Browse output clicked");

            if let Some(path) = Self::show_save_picker() {
                tracing::info!("Output path selected: {}", path);
                state.set_output_path(path.as_str());
            }
        });

        let state = state_manager.clone();
        let ui_weak = ui.as_weak();

        ui.on_start_merge(move || {
            tracing::info!("Merge button clicked");

            if state.read(|s| s.is_merging()) {
                return;
            }

            let request = match state.read(|s| s.merge_request()) {
                Ok(request) => request,
                Err(e) => {
                    tracing::warn!("Merge not started: {}", e);
                    Self::show_message_dialog(&ui_weak, "Warning", e.to_string());
                    return;
                }
            };

            // Paint the status directly; the subscription is too late once the
            // merge blocks the event loop
            let changes = state.set_status(MergeStatus::Merging);
            if let Some(ui) = ui_weak.upgrade() {
                Self::apply_changes(&ui, &state, &changes);
            }

            // Let the window repaint before the merge blocks the event loop
            let state = state.clone();
            let ui_weak = ui_weak.clone();
            let provider = provider.clone();
            slint::Timer::single_shot(MERGE_START_DELAY, move || {
                Self::run_merge(&ui_weak, &state, provider.as_ref(), &request);
            });
        });

        let ui_weak = ui.as_weak();

        ui.on_error_dialog_dismissed(move || {
            tracing::debug!("Error dialog dismissed");
            if let Some(ui) = ui_weak.upgrade() {
                ui.set_show_error_dialog(false);
            }
        });

        let ui_weak = ui.as_weak();

        ui.on_message_dialog_dismissed(move || {
            tracing::debug!("Message dialog dismissed");
            if let Some(ui) = ui_weak.upgrade() {
                ui.set_show_message_dialog(false);
            }
        });

        tracing::debug!("UI callbacks configured");
    }

    /// Callback for the up/down buttons
    fn move_handler(
        state_manager: &Arc<StateManager>,
        ui: &MainWindow,
        direction: MoveDirection,
    ) -> impl Fn() + 'static {
        let state = state_manager.clone();
        let ui_weak = ui.as_weak();

        move || {
            tracing::debug!("Move {:?} clicked", direction);

            match state.move_selection(direction) {
                Ok(changes) => tracing::trace!("Moved selection: {:?}", changes),
                Err(e @ FileListError::ManualModeRequired) => {
                    Self::show_message_dialog(&ui_weak, "Notice", e.to_string());
                }
                Err(e) => tracing::warn!("Could not move selection: {}", e),
            }
        }
    }

    /// Subscribe to state changes and update the window accordingly
    ///
    /// A background thread waits on the broadcast channel and hands each change
    /// back to the Slint event loop.
    fn setup_state_subscription(ui: &MainWindow, state_manager: &Arc<StateManager>) {
        let ui_weak = ui.as_weak();
        let state = Arc::clone(state_manager);
        let mut rx = state_manager.subscribe();

        std::thread::spawn(move || {
            tracing::debug!("State subscription thread started");

            loop {
                let changes = match rx.blocking_recv() {
                    Ok(change) => vec![change],
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Missed events; redraw everything the window shows
                        tracing::warn!("State subscription lagged by {} event(s)", skipped);
                        let (mode, count, status) =
                            state.read(|s| (s.files.sort_mode(), s.files.len(), s.status));
                        vec![
                            StateChange::SortModeChanged { mode },
                            StateChange::FilesChanged { count },
                            StateChange::OptionsChanged,
                            StateChange::OutputPathChanged,
                            StateChange::StatusChanged { status },
                        ]
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };

                let state = Arc::clone(&state);
                let delivered = ui_weak.upgrade_in_event_loop(move |ui| {
                    Self::apply_changes(&ui, &state, &changes);
                });
                if delivered.is_err() {
                    // Event loop has exited
                    break;
                }
            }

            tracing::debug!("State subscription thread stopped");
        });
    }

    /// Run a merge and report the result. Blocks until the word processor is done.
    fn run_merge(
        ui_weak: &slint::Weak<MainWindow>,
        state: &StateManager,
        provider: &dyn AutomationProvider,
        request: &MergeRequest,
    ) {
        let result = MergeService::new().merge(provider, request);
        if let Err(e) = &result {
            tracing::error!("Merge failed: {}", e);
        }

        let (status, message) = state.finish_merge(&result);
        match status {
            MergeStatus::Done => Self::show_message_dialog(ui_weak, "Done", message),
            _ => Self::show_error_dialog(ui_weak, "Error", message, ""),
        }
    }

    /// Show an error dialog
    fn show_error_dialog(
        ui_weak: &slint::Weak<MainWindow>,
        title: impl Into<SharedString>,
        message: impl Into<SharedString>,
        details: impl Into<SharedString>,
    ) {
        if let Some(ui) = ui_weak.upgrade() {
            ui.set_error_title(title.into());
            ui.set_error_message(message.into());
            ui.set_error_details(details.into());
            ui.set_show_error_dialog(true);
        }
    }

    /// Show an informational message dialog
    fn show_message_dialog(
        ui_weak: &slint::Weak<MainWindow>,
        title: impl Into<SharedString>,
        message: impl Into<SharedString>,
    ) {
        if let Some(ui) = ui_weak.upgrade() {
            ui.set_message_title(title.into());
            ui.set_message_text(message.into());
            ui.set_show_message_dialog(true);
        }
    }

    /// Native multi-select open dialog restricted to HWP/HWPX
    fn show_files_picker() -> Option<Vec<Utf8PathBuf>> {
        use rfd::FileDialog;

        let paths = FileDialog::new()
            .set_title("Select files to merge")
            .add_filter("HWP/HWPX", &SUPPORTED_EXTENSIONS)
            .add_filter("HWP", &["hwp"])
            .add_filter("HWPX", &["hwpx"])
            .pick_files()?;

        Some(
            paths
                .into_iter()
                .filter_map(|path| {
                    Utf8PathBuf::try_from(path)
                        .map_err(|e| {
                            tracing::error!("Failed to convert path to UTF-8: {}", e);
                            e
                        })
                        .ok()
                })
                .collect(),
        )
    }

    /// Native save dialog for the merged document
    fn show_save_picker() -> Option<Utf8PathBuf> {
        use rfd::FileDialog;

        FileDialog::new()
            .set_title("Save merged file")
            .set_file_name("merged.hwp")
            .add_filter("HWP", &["hwp"])
            .add_filter("HWPX", &["hwpx"])
            .save_file()
            .and_then(|path| {
                Utf8PathBuf::try_from(path)
                    .map_err(|e| {
                        tracing::error!("Failed to convert path to UTF-8: {}", e);
                        e
                    })
                    .ok()
            })
            .map(with_default_extension)
    }
}

fn sort_mode_index(mode: SortMode) -> i32 {
    match mode {
        SortMode::Name => 0,
        SortMode::Manual => 1,
    }
}

fn sort_mode_from_index(index: i32) -> SortMode {
    if index == 1 {
        SortMode::Manual
    } else {
        SortMode::Name
    }
}

/// Append `.hwp` when the chosen output has no supported extension
fn with_default_extension(path: Utf8PathBuf) -> Utf8PathBuf {
    if is_supported(&path) {
        path
    } else {
        Utf8PathBuf::from(format!("{}.hwp", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_mode_index_round_trip() {
        assert_eq!(sort_mode_from_index(sort_mode_index(SortMode::Name)), SortMode::Name);
        assert_eq!(sort_mode_from_index(sort_mode_index(SortMode::Manual)), SortMode::Manual);
        assert_eq!(sort_mode_from_index(-1), SortMode::Name);
    }

    #[test]
    fn test_with_default_extension() {
        assert_eq!(
            with_default_extension(Utf8PathBuf::from("C:/out/merged")),
            Utf8PathBuf::from("C:/out/merged.hwp")
        );
        assert_eq!(
            with_default_extension(Utf8PathBuf::from("C:/out/merged.HWPX")),
            Utf8PathBuf::from("C:/out/merged.HWPX")
        );
    }
}
