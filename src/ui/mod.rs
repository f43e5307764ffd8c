// UI module - Slint window and its controller
//
// This module contains:
// - GuiController: wires the MainWindow callbacks to the StateManager and MergeService

pub mod controller;

pub use controller::GuiController;
