//! Core types for autodoc
//!
//! The core module holds the error system shared by every other module:
//! - [`AutodocError`] - Enumerated error types covering all failure modes
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error to user-friendly format

pub mod error;

pub use error::{AutodocError, ErrorContext, user_friendly_error};
