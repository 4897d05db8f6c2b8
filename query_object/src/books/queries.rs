//! Read-only queries with projection, sorting and pagination.

use crate::descriptor::FindDescriptor;
use crate::model::fields;
use crate::query_builder::{
    Pagination, Projection, QueryBuilder, QueryFilter, SortOrder, DEFAULT_PAGE_SIZE,
};

/// In-stock books published strictly after `year`
pub fn find_in_stock_after_year(year: i32) -> FindDescriptor {
    QueryBuilder::new()
        .filter(QueryFilter::eq(fields::IN_STOCK, true))
        .filter(QueryFilter::gt(fields::PUBLISHED_YEAR, year))
        .build()
}

/// Books in `genre`, returning only title, author and price
pub fn projected_find_by_genre(genre: &str) -> FindDescriptor {
    QueryBuilder::new()
        .filter(QueryFilter::eq(fields::GENRE, genre))
        .project(
            Projection::new()
                .include_all(&[fields::TITLE, fields::AUTHOR, fields::PRICE])
                .exclude(fields::ID),
        )
        .build()
}

/// Whole collection ordered by price
pub fn sort_by_price(ascending: bool) -> FindDescriptor {
    QueryBuilder::new()
        .order_by(fields::PRICE, SortOrder::from_ascending(ascending))
        .build()
}

/// Whole collection ordered by price in the default (ascending) direction
pub fn sort_by_price_default() -> FindDescriptor {
    sort_by_price(SortOrder::default() == SortOrder::Asc)
}

/// One page of the whole collection using the default page size
pub fn paginate(page_number: i64) -> FindDescriptor {
    paginate_sized(page_number, DEFAULT_PAGE_SIZE)
}

/// One page of the whole collection; `page_number` starts at 1
pub fn paginate_sized(page_number: i64, page_size: i64) -> FindDescriptor {
    QueryBuilder::new()
        .paginate(Pagination::page(page_number, page_size))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_in_stock_after_year_is_a_flat_conjunction() {
        assert_eq!(
            find_in_stock_after_year(2010).filter,
            doc! { "in_stock": true, "published_year": { "$gt": 2010 } }
        );
    }

    #[test]
    fn test_projection_excludes_identity() {
        for genre in ["Fiction", "History", ""] {
            let find = projected_find_by_genre(genre);
            let projection = find.projection.unwrap();

            assert_eq!(projection.get_i32("_id").unwrap(), 0);
            let included: Vec<&String> = projection
                .iter()
                .filter(|(_, v)| v.as_i32() == Some(1))
                .map(|(k, _)| k)
                .collect();
            assert_eq!(included, vec!["title", "author", "price"]);
            assert_eq!(projection.len(), 4);
        }
    }

    #[test]
    fn test_sort_directions_are_opposite() {
        let asc = sort_by_price(true).sort.unwrap();
        let desc = sort_by_price(false).sort.unwrap();

        assert_eq!(asc, doc! { "price": 1 });
        assert_eq!(desc, doc! { "price": -1 });
        assert_eq!(sort_by_price_default(), sort_by_price(true));
    }

    #[test]
    fn test_sort_scans_whole_collection() {
        assert!(sort_by_price(true).filter.is_empty());
    }

    #[test]
    fn test_paginate_default_size() {
        let first = paginate(1);
        assert_eq!(first.skip, Some(0));
        assert_eq!(first.limit, Some(5));
        assert!(first.filter.is_empty());

        let third = paginate(3);
        assert_eq!(third.skip, Some(10));
    }

    #[test]
    fn test_paginate_sized() {
        for n in 1..=6_i64 {
            for s in [1_i64, 5, 20] {
                let page = paginate_sized(n, s);
                assert_eq!(page.skip, Some((n - 1) * s));
                assert_eq!(page.limit, Some(s));
            }
        }
    }

    #[test]
    fn test_paginate_passes_out_of_range_pages_through() {
        assert_eq!(paginate(0).skip, Some(-5));
    }
}
