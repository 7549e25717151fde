pub mod app;
pub mod audio;
pub mod config;
pub mod core;
pub mod error;
pub mod fade;
pub mod folder;
pub mod handle_store;
pub mod loader;
pub mod logging;
pub mod model;
pub mod permission;
pub mod playback;
pub mod playlist;
pub mod ui;
