//! # Bookstore
//!
//! Named queries, updates, aggregations and index definitions for a MongoDB
//! `books` collection. Every request is built as a typed descriptor first and
//! only runs when handed to a [`QueryEngine`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bookstore::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::new(
//!         "localhost".to_string(), 27017, "library".to_string(),
//!         "books".to_string(), String::new(), String::new(),
//!         1, 10, 30,
//!     );
//!
//!     let bookstore = Bookstore::connect(&config).await?;
//!     let books = bookstore.books();
//!
//!     let fiction = books.find(&crud::find_by_genre("Fiction")).await?;
//!     println!("{} fiction titles", fiction.len());
//!
//!     let averages = books.aggregate(&aggregations::average_price_by_genre()).await?;
//!     for row in averages {
//!         println!("{row}");
//!     }
//!
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod engine;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use crate::core::Bookstore;
pub use engine::MongoEngine;
pub use errors::BookstoreError;

// Re-export centralized config
pub use config::{AppConfig, ConfigError, DatabaseConfig};

// Re-export the descriptor layer
pub use query_object;
pub use query_object::books::{aggregations, crud, indexing, queries};
pub use query_object::{MemoryEngine, QueryEngine, QueryObjectError};

// Re-export external dependencies used in public API
pub use async_trait;
pub use mongodb;
