//! Configuration file access.
//!
//! The server only ever *reads* its config file.  Editing and persisting
//! settings belongs to whatever front end manages the deployment.

pub mod config;

pub use config::{default_config_path, load_config, load_optional_config, FileConfig, FileConfigError};
