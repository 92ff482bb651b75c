//! Utilities shared by the `simsweep` binaries

// Modules
pub mod logger;
