//! Book record shape shared by every named builder.

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Field names of a book record as stored in the collection.
pub mod fields {
    pub const ID: &str = "_id";
    pub const TITLE: &str = "title";
    pub const AUTHOR: &str = "author";
    pub const GENRE: &str = "genre";
    pub const PUBLISHED_YEAR: &str = "published_year";
    pub const PRICE: &str = "price";
    pub const IN_STOCK: &str = "in_stock";
}

/// A single book in the collection.
///
/// `title` is treated as a natural key by the update, delete and title-index
/// builders, but nothing enforces its uniqueness. With duplicate titles the
/// engine acts on whichever record it meets first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_year: i32,
    pub price: f64,
    pub in_stock: bool,
}

impl Book {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        genre: impl Into<String>,
        published_year: i32,
        price: f64,
        in_stock: bool,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            author: author.into(),
            genre: genre.into(),
            published_year,
            price,
            in_stock,
        }
    }
}
