//! Grouped and derived statistics over the collection.

use crate::descriptor::AggregateDescriptor;
use crate::model::fields;
use crate::query_builder::{Accumulator, Expression, GroupBy, Pipeline, Projection, SortOrder};

/// Mean price per genre: one `{_id: genre, averagePrice}` record per genre
pub fn average_price_by_genre() -> AggregateDescriptor {
    let pipeline = Pipeline::new().group(
        GroupBy::single(fields::GENRE)
            .accumulate(Accumulator::avg(fields::PRICE).with_alias("averagePrice")),
    );
    AggregateDescriptor::new(pipeline.into_stages())
}

/// The author with the most books, as `{_id: author, bookCount}`
///
/// Ties on `bookCount` are broken by author name, ascending.
pub fn author_with_most_books() -> AggregateDescriptor {
    let pipeline = Pipeline::new()
        .group(GroupBy::single(fields::AUTHOR).accumulate(Accumulator::count().with_alias("bookCount")))
        .sort("bookCount", SortOrder::Desc)
        .sort(fields::ID, SortOrder::Asc)
        .limit(1);
    AggregateDescriptor::new(pipeline.into_stages())
}

/// Number of books per publication decade, oldest first
///
/// Negative years are outside the supported range.
pub fn books_by_decade() -> AggregateDescriptor {
    let pipeline = Pipeline::new()
        .project(Projection::new().computed(
            "decade",
            Expression::floor_to_multiple(fields::PUBLISHED_YEAR, 10),
        ))
        .group(GroupBy::single("decade").accumulate(Accumulator::count().with_alias("count")))
        .sort(fields::ID, SortOrder::Asc);
    AggregateDescriptor::new(pipeline.into_stages())
}
