//! focusdesk-core - Shared plumbing for the focusdesk workspace
//!
//! Paths, the JSON config file, display formatting and logging setup.

pub mod config;
pub mod format;
pub mod logging;
pub mod paths;

pub use config::Config;
pub use paths::Paths;
