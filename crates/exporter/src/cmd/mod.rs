//! Command implementations for the exporter CLI

pub mod check;
pub mod positions;
pub mod simulate;
