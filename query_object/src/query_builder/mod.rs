//! Query builder utilities
//!
//! This module provides document query construction utilities.

pub mod aggregation;
pub mod builder;
pub mod document_generation;
pub mod explain;
pub mod filter;
pub mod grouping;
pub mod ordering;
pub mod pagination;
pub mod pipeline;
pub mod projection;
pub mod update;


pub use aggregation::{Accumulator, AggregateFunction, Expression};
pub use builder::QueryBuilder;
pub use explain::Verbosity;
pub use filter::{QueryFilter, QueryOperator};
pub use grouping::GroupBy;
pub use ordering::SortOrder;
pub use pagination::{Pagination, DEFAULT_PAGE_SIZE};
pub use pipeline::{Pipeline, Stage};
pub use projection::Projection;
pub use update::UpdateSet;
