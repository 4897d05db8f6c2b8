//! Core Bookstore functionality
//!
//! This module contains the `Bookstore` coordinator, which owns the MongoDB
//! client built from configuration and hands out engines for collections.

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use std::time::Duration;

use crate::engine::MongoEngine;
use crate::errors::BookstoreError;
use config::{AppConfig, DatabaseConfig};

/// Main Bookstore coordinator that manages the database connection
#[derive(Clone, Debug)]
pub struct Bookstore {
    client: Client,
    database: Database,
    collection: String,
}

impl Bookstore {
    /// Connect using an explicit database configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, BookstoreError> {
        let options = Self::client_options(config).await?;
        let client = Client::with_options(options)?;
        let database = client.database(&config.database);

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            collection = %config.collection,
            "connected bookstore client"
        );

        Ok(Self {
            client,
            database,
            collection: config.collection.clone(),
        })
    }

    /// Driver options for a configuration; parsing does not touch the network
    pub async fn client_options(config: &DatabaseConfig) -> Result<ClientOptions, BookstoreError> {
        let mut options = ClientOptions::parse(config.connection_string()).await?;
        options.app_name = Some("bookstore".to_string());
        options.min_pool_size = Some(config.min_connections);
        options.max_pool_size = Some(config.max_connections);
        options.connect_timeout = Some(Duration::from_secs(config.connection_timeout_seconds));
        Ok(options)
    }

    /// Load configuration from the environment and connect
    pub async fn from_env() -> Result<Self, BookstoreError> {
        let config = AppConfig::load()?;
        Self::connect(&config.database).await
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Engine for the configured books collection
    pub fn books(&self) -> MongoEngine {
        MongoEngine::new(self.database.clone(), &self.collection)
    }

    /// Engine for any other collection in the same database
    pub fn engine(&self, collection: &str) -> MongoEngine {
        MongoEngine::new(self.database.clone(), collection)
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), BookstoreError> {
        self.database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(username: &str, password: &str) -> DatabaseConfig {
        DatabaseConfig::new(
            "localhost".to_string(),
            27017,
            "library".to_string(),
            "books".to_string(),
            username.to_string(),
            password.to_string(),
            2,
            8,
            15,
        )
    }

    #[tokio::test]
    async fn test_client_options_carry_pool_settings() {
        let options = Bookstore::client_options(&config("", "")).await.unwrap();
        assert_eq!(options.min_pool_size, Some(2));
        assert_eq!(options.max_pool_size, Some(8));
        assert_eq!(options.connect_timeout, Some(Duration::from_secs(15)));
        assert!(options.credential.is_none());
    }

    #[tokio::test]
    async fn test_reserved_characters_in_password_survive_parsing() {
        let options = Bookstore::client_options(&config("reader", "p@ss:w/rd"))
            .await
            .unwrap();
        let credential = options.credential.unwrap();
        assert_eq!(credential.username.as_deref(), Some("reader"));
        assert_eq!(credential.password.as_deref(), Some("p@ss:w/rd"));
    }
}
