mod app;
mod effects;
mod render;
mod settings;

pub use app::{run_app, RunRequest};
pub use settings::{AppSettings, DEFAULT_SETTINGS_FILE};
