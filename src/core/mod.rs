//! Core types shared across the factup engine.

pub mod error;

pub use error::FactupError;
