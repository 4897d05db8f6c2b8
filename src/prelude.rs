//! Convenience re-exports for common Bookstore usage
//!
//! # Example
//!
//! ```rust
//! use bookstore::prelude::*;
//!
//! let query = crud::find_by_genre("Fiction");
//! assert_eq!(query.filter, doc! { "genre": "Fiction" });
//! ```

// Core Bookstore components
pub use crate::core::Bookstore;
pub use crate::engine::MongoEngine;
pub use crate::errors::BookstoreError;

// Re-export centralized config
pub use config::{AppConfig, ConfigError, DatabaseConfig};

// Builders, descriptors and the engine seam
pub use query_object::prelude::*;

// Common external dependencies
pub use anyhow;
pub use mongodb;
pub use tokio;
