pub mod cli;
pub mod config;
pub mod loader;
pub mod logging;
pub mod models;
pub mod picker;
pub mod preferences;
pub mod session;
pub mod settings;
pub mod source;
pub mod state;
pub mod ui;
