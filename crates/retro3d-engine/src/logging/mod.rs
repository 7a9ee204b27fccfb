//! Logging utilities.
//!
//! Centralizes logger initialization. The engine itself only uses the `log`
//! facade: resource creation and release at `debug`, format selection at
//! `info`, and release failures that `Drop` cannot propagate at `warn`.

mod init;

pub use init::{init_logging, LoggingConfig};
