pub mod config;
pub mod tracing;
pub mod wiring;

pub use config::{data_dir, load_config, load_or_empty};
pub use wiring::{wire_dependencies, AppDeps};
