//! Convenience re-exports for common query-object usage

// Engine seam
pub use crate::traits::QueryEngine;
pub use crate::memory::MemoryEngine;

// Error types
pub use crate::errors::QueryObjectError;

// Record model
pub use crate::model::{fields, Book};

// Named bookstore builders
pub use crate::books::{aggregations, crud, indexing, queries};

// Descriptors and engine summaries
pub use crate::descriptor::{
    AggregateDescriptor, DeleteDescriptor, DeleteSummary, ExplainDescriptor, FindDescriptor,
    IndexCreated, IndexDescriptor, InsertDescriptor, InsertSummary, UpdateDescriptor,
    UpdateSummary,
};

// Query building
pub use crate::query_builder::{
    Accumulator, Expression, GroupBy, Pagination, Pipeline, Projection, QueryBuilder,
    QueryFilter, SortOrder, UpdateSet, Verbosity,
};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use bson::{doc, Bson, Document};
pub use serde::{Deserialize, Serialize};
