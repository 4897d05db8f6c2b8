//! Error types for the Bookstore crate
//!
//! Engine calls return the driver's own error type; these cover setup.

use config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookstoreError {
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] mongodb::error::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
