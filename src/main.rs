//! HWP Merge - merge HWP/HWPX documents through Hangul automation
//!
//! Main entry point for the GUI application.
//!
//! # Execution Flow
//!
//! 1. Load `HWP Merge Data/hwp-merge.yaml` (defaults if missing)
//! 2. Initialize logging -> logs/hwp-merge.<date>
//! 3. Check that the Hangul automation object is available; refuse to start otherwise
//! 4. Create StateManager seeded with the configured merge defaults
//! 5. Create GuiController and run the Slint event loop until the window closes
//!
//! # Platform
//!
//! Windows with Hangul (HWP) installed. On other platforms the program exits with a
//! startup error.

use anyhow::{Context, Result};
use hwp_merge::automation::default_provider;
use hwp_merge::ui::GuiController;
use hwp_merge::{APP_NAME, ConfigManager, StateManager, VERSION};
use std::sync::Arc;

fn main() -> Result<()> {
    let config_manager = ConfigManager::default();
    let config = config_manager.load()?;

    // Guard must live until exit so buffered log lines are flushed
    let _log_guard = hwp_merge::logging::setup_logging(&config.logging)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    tracing::info!("Configuration directory: {}", config_manager.config_dir());

    let provider = default_provider(&config.automation)
        .context("Hangul (HWP) and its automation interface are required")?;
    tracing::info!("Hangul automation available ({})", config.automation.prog_id);

    let state_manager = Arc::new(StateManager::with_defaults(&config.merge));
    tracing::info!("State manager initialized");

    let gui_controller = GuiController::new(state_manager, provider)?;

    tracing::info!("GUI controller initialized, launching window");

    let result = gui_controller.run();

    tracing::info!("GUI closed, shutting down");

    result.map_err(|e| {
        tracing::error!("GUI error: {}", e);
        anyhow::anyhow!("GUI error: {}", e)
    })
}
