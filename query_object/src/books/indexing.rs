//! Index management and explain requests.

use crate::descriptor::{ExplainDescriptor, IndexDescriptor};
use crate::model::fields;
use crate::query_builder::{QueryBuilder, QueryFilter};

/// Ascending index on `title`; creating it again is a no-op at the engine
pub fn create_title_index() -> IndexDescriptor {
    IndexDescriptor::new().ascending(fields::TITLE)
}

/// Compound ascending index on `(author, published_year)`
///
/// Field order decides which queries the index can serve: lookups by author
/// alone, or by author and year, but not by year alone.
pub fn create_author_year_index() -> IndexDescriptor {
    IndexDescriptor::new()
        .ascending(fields::AUTHOR)
        .ascending(fields::PUBLISHED_YEAR)
}

/// Execution statistics for a lookup by title
pub fn explain_by_title(title: &str) -> ExplainDescriptor {
    ExplainDescriptor::new(
        QueryBuilder::new()
            .filter(QueryFilter::eq(fields::TITLE, title))
            .build(),
    )
}

/// Execution statistics for a lookup by author and exact publication year
pub fn explain_by_author_year(author: &str, year: i32) -> ExplainDescriptor {
    ExplainDescriptor::new(
        QueryBuilder::new()
            .filter(QueryFilter::eq(fields::AUTHOR, author))
            .filter(QueryFilter::eq(fields::PUBLISHED_YEAR, year))
            .build(),
    )
}
