//! Account operations that run through the progress bridge.

mod configure;
mod import_export;

pub use configure::ConfigureAccount;
pub use import_export::ImportExport;
