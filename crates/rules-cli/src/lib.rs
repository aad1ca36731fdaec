//! Command-line driver components for the rules engine.

pub mod bundle;
pub mod evaluation;
pub mod logging;
pub mod output;
