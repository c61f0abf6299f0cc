// Persisted user preferences

#[allow(clippy::module_inception)]
pub mod settings;

pub use settings::{config_dir, AppSettings};
