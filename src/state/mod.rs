// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events for GUI updates.

use crate::models::{AppState, FileListError, MergeDefaults, MergeStatus, MoveDirection, SortMode};
use crate::services::{MergeError, MergeOutcome};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// The GUI applies these to the window instead of redrawing everything after each
/// action.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// Files were added, removed, cleared or reordered
    FilesChanged { count: usize },

    /// Selected rows changed without the list itself changing
    SelectionChanged,

    /// Sort mode changed
    SortModeChanged { mode: SortMode },

    /// Keep flags or export flag changed
    OptionsChanged,

    /// Output path changed
    OutputPathChanged,

    /// Merge status changed
    StatusChanged { status: MergeStatus },
}

/// Thread-safe state manager with event emission
///
/// - Provides access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// # Usage
///
/// - [`read()`](Self::read) for reading state
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
pub struct StateManager {
    /// The application state protected by RwLock
    state: Arc<RwLock<AppState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    /// Create a StateManager seeded from configured merge defaults
    pub fn with_defaults(defaults: &MergeDefaults) -> Self {
        Self::with_state(AppState::with_defaults(defaults))
    }

    fn with_state(state: AppState) -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(state)),
            state_tx,
        }
    }

    /// Get a snapshot of the current state
    pub fn snapshot(&self) -> AppState {
        self.state.read().unwrap().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let count = state_manager.read(|state| state.files.len());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap();
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// # Returns
    /// The StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.write().unwrap();
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.files.sort_mode() != new.files.sort_mode() {
            changes.push(StateChange::SortModeChanged {
                mode: new.files.sort_mode(),
            });
        }

        if !old.files.iter().eq(new.files.iter()) {
            changes.push(StateChange::FilesChanged {
                count: new.files.len(),
            });
        } else if old.selection != new.selection {
            changes.push(StateChange::SelectionChanged);
        }

        if old.keep != new.keep || old.export_pdf != new.export_pdf {
            changes.push(StateChange::OptionsChanged);
        }

        if old.output_path != new.output_path {
            changes.push(StateChange::OutputPathChanged);
        }

        if old.status != new.status {
            changes.push(StateChange::StatusChanged { status: new.status });
        }

        changes
    }

    // Convenience methods for common state updates

    pub fn add_files(&self, paths: Vec<camino::Utf8PathBuf>) -> Vec<StateChange> {
        self.update(|state| {
            let added = state.add_files(paths);
            tracing::info!("Added {} file(s), list has {}", added, state.files.len());
        })
    }

    pub fn remove_selected(&self) -> Result<Vec<StateChange>, FileListError> {
        let mut result = Ok(());
        let changes = self.update(|state| {
            result = state.remove_selected().map(|removed| {
                tracing::info!("Removed {} file(s)", removed);
            });
        });
        result.map(|_| changes)
    }

    pub fn clear_files(&self) -> Vec<StateChange> {
        self.update(|state| state.clear_files())
    }

    pub fn toggle_selection(&self, index: usize) -> Vec<StateChange> {
        self.update(|state| state.toggle_selection(index))
    }

    /// Move the selected rows; refused unless the list is in manual mode
    pub fn move_selection(
        &self,
        direction: MoveDirection,
    ) -> Result<Vec<StateChange>, FileListError> {
        let mut result = Ok(());
        let changes = self.update(|state| result = state.move_selection(direction));
        result.map(|_| changes)
    }

    pub fn set_sort_mode(&self, mode: SortMode) -> Vec<StateChange> {
        self.update(|state| state.set_sort_mode(mode))
    }

    pub fn set_output_path(&self, path: impl Into<String>) -> Vec<StateChange> {
        let path = path.into();
        self.update(|state| state.output_path = path)
    }

    pub fn set_status(&self, status: MergeStatus) -> Vec<StateChange> {
        self.update(|state| state.status = status)
    }

    /// Record a finished merge; returns the new status and the text to show the user
    pub fn finish_merge(
        &self,
        result: &Result<MergeOutcome, MergeError>,
    ) -> (MergeStatus, String) {
        let mut report = (MergeStatus::Ready, String::new());
        self.update(|state| {
            let message = state.finish_merge(result);
            report = (state.status, message);
        });
        report
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}
