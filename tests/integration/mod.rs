//! Integration test suite for autodoc
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **cache_lifecycle**: building, reusing and patching the parameter cache
//! - **render_pipeline**: rendering documents from a cache and uploading them
//! - **cli**: the `autodoc` binary end to end

mod common;

mod cache_lifecycle;
mod cli;
mod render_pipeline;
