//! Adapters implementing the `qj-core` ports.

pub mod contacts;
pub mod identity;
pub mod scripted;
pub mod tokens;

pub use contacts::InMemoryContactStore;
pub use identity::ConfigSelfIdentity;
pub use scripted::{ScriptedCore, Transcript};
pub use tokens::{InMemoryTokenStore, JsonFileTokenStore};
