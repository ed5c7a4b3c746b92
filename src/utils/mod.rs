//! Cross-cutting utilities

pub mod error;
pub mod logging;
