//! Command implementations.

pub mod clean;
pub mod info;
pub mod venv;
pub mod version;
