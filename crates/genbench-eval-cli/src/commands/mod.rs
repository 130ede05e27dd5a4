//! Subcommand implementations.

pub mod aggregate;
pub mod score;
pub mod stitch;
