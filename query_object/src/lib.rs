//! Query Object - descriptor layer for the bookstore collection
//!
//! This crate provides typed query descriptors (filters, projections, sorts,
//! pagination, updates, aggregation pipelines, indexes and explain requests),
//! the named bookstore builders, and the `QueryEngine` seam that executes them.

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

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod books;
pub mod descriptor;
pub mod errors;
pub mod memory;
pub mod model;
pub mod prelude;
pub mod query_builder;
pub mod traits;

pub use descriptor::{
    AggregateDescriptor, DeleteDescriptor, DeleteSummary, ExplainDescriptor, FindDescriptor,
    IndexCreated, IndexDescriptor, InsertDescriptor, InsertSummary, UpdateDescriptor,
    UpdateSummary,
};
pub use errors::QueryObjectError;
pub use memory::MemoryEngine;
pub use model::{fields, Book};
pub use query_builder::{QueryBuilder, QueryFilter, QueryOperator, SortOrder};
pub use traits::QueryEngine;

pub use bson;
