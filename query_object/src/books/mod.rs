//! Named bookstore requests
//!
//! Every function here is a pure builder: it takes scalar parameters and
//! returns a descriptor, without touching any engine. Run the result through a
//! [`QueryEngine`](crate::traits::QueryEngine) to execute it.

pub mod aggregations;
pub mod crud;
pub mod indexing;
pub mod queries;

pub use aggregations::{author_with_most_books, average_price_by_genre, books_by_decade};
pub use crud::{
    delete_book_by_title, find_by_author, find_by_genre, find_by_year_greater_than, insert_books,
    update_book_price,
};
pub use indexing::{
    create_author_year_index, create_title_index, explain_by_author_year, explain_by_title,
};
pub use queries::{
    find_in_stock_after_year, paginate, paginate_sized, projected_find_by_genre, sort_by_price,
    sort_by_price_default,
};
