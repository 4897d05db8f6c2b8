//! Point lookups, single-record mutations and bulk inserts.
//!
//! `title` is not unique in the collection. The update and delete builders
//! act on the first record the engine meets, so callers that need a specific
//! record must keep titles unique themselves.

use crate::descriptor::{DeleteDescriptor, FindDescriptor, InsertDescriptor, UpdateDescriptor};
use crate::errors::QueryObjectError;
use crate::model::{fields, Book};
use crate::query_builder::{QueryBuilder, QueryFilter, UpdateSet};

/// Books whose genre equals `genre`
pub fn find_by_genre(genre: &str) -> FindDescriptor {
    QueryBuilder::new()
        .filter(QueryFilter::eq(fields::GENRE, genre))
        .build()
}

/// Books published strictly after `year`
pub fn find_by_year_greater_than(year: i32) -> FindDescriptor {
    QueryBuilder::new()
        .filter(QueryFilter::gt(fields::PUBLISHED_YEAR, year))
        .build()
}

/// Books written by `author`
pub fn find_by_author(author: &str) -> FindDescriptor {
    QueryBuilder::new()
        .filter(QueryFilter::eq(fields::AUTHOR, author))
        .build()
}

/// Set the price of the first book titled `title`
pub fn update_book_price(title: &str, new_price: f64) -> UpdateDescriptor {
    UpdateDescriptor {
        filter: QueryBuilder::new()
            .filter(QueryFilter::eq(fields::TITLE, title))
            .build_filter_document(),
        update: UpdateSet::new().set(fields::PRICE, new_price).to_document(),
    }
}

/// Delete the first book titled `title`
pub fn delete_book_by_title(title: &str) -> DeleteDescriptor {
    DeleteDescriptor {
        filter: QueryBuilder::new()
            .filter(QueryFilter::eq(fields::TITLE, title))
            .build_filter_document(),
    }
}

/// Insert every book, in order
pub fn insert_books(books: &[Book]) -> Result<InsertDescriptor, QueryObjectError> {
    let documents = books
        .iter()
        .map(bson::to_document)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(InsertDescriptor { documents })
}
