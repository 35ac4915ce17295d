//! pybundle library exports.
//!
//! The binary is a thin CLI over these modules; integration tests drive the
//! pipeline through them directly.

pub mod build;
pub mod clean;
pub mod commands;
pub mod config;
pub mod error;
pub mod preflight;
pub mod process;
pub mod timing;

pub use build::{run_build, BuildReport, Stage};
pub use config::Config;
pub use error::BuildError;
