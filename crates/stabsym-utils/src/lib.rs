//! # stabsym Utilities
//!
//! Shared logging and configuration helpers for stabsym.
//!
//! The core crate only emits `tracing` events; binaries and test harnesses use
//! this crate to decide how those events are rendered and where they go.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{
    init_logging, init_logging_with_config, init_logging_with_level, LogConfig, LogFormat, LogLevel, LoggingError,
    LoggingGuard,
};
pub use tracing::{debug, error, info, trace, warn};
