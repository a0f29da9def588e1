// Terminal UI implementation using ratatui
// Browse the catalog, search it, keep favorites

pub mod app;
pub mod runner;
pub mod ui;

pub use app::{App, InputMode};
pub use runner::{handle_key, run_tui};
