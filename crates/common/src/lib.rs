//! Shared building blocks for the Unilearn client workspace
//!
//! Holds the pieces every other crate needs: environment-driven
//! configuration, the platform role model and small formatting
//! helpers. Error types live with the crates that produce them.

pub mod config;
pub mod format;
pub mod role;

pub use config::Config;
pub use format::format_file_size;
pub use role::Role;
