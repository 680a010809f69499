//! Autobot Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the Autobot project.
//!
//! # Overview
//!
//! This crate provides common functionality used across all Autobot workspace members:
//!
//! - **Error Handling**: The error taxonomy shared by providers, pipeline and store
//! - **Hashing**: Deterministic content hashing for vehicle records
//! - **Logging**: Centralized `tracing` setup
//! - **Types**: Shared domain types such as registration countries
//!
//! # Example
//!
//! ```no_run
//! use autobot_common::hash::ContentHasher;
//!
//! let mut hasher = ContentHasher::new();
//! hasher.field("AB12345").field("WVWZZZ1JZXW000001");
//! let hash = hasher.finish();
//! println!("content hash: {}", hash);
//! ```

pub mod error;
pub mod hash;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{AutobotError, ParseError, Result};
pub use hash::ContentHash;
pub use types::Country;
