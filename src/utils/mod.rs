//! Utility functions and helpers shared by the decorators.
//!
//! # Submodules
//!
//! - `logging`: Tracing initialization and the diagnostic [`logging::ErrorLog`].
//! - `headers`: Canonical header-name formatting for dumps.
//! - `mime`: Common MIME type constants.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod headers;
pub mod logging;
pub mod mime;
