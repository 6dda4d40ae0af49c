pub mod config_store;
pub mod error;

pub use config_store::{Preferences, TomlConfigStore, default_config_path};
pub use error::StorageError;
