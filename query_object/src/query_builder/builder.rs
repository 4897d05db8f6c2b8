//! Query builder utilities
//!
//! This module provides find query construction.

use crate::descriptor::FindDescriptor;
use crate::query_builder::document_generation::DocumentGenerator;
use crate::query_builder::filter::QueryFilter;
use crate::query_builder::ordering::SortOrder;
use crate::query_builder::pagination::Pagination;
use crate::query_builder::projection::Projection;
use bson::Document;

/// Query builder for constructing find descriptors
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    pub(crate) conditions: Vec<QueryFilter>,
    pub(crate) order_by: Vec<(String, SortOrder)>,
    pub(crate) pagination: Pagination,
    pub(crate) projection: Option<Projection>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
            order_by: Vec::new(),
            pagination: Pagination::new(),
            projection: None,
        }
    }

    /// Add a filter condition
    pub fn filter(mut self, filter: QueryFilter) -> Self {
        self.conditions.push(filter);
        self
    }

    /// Add multiple filters (combined with AND)
    pub fn filters(mut self, filters: Vec<QueryFilter>) -> Self {
        self.conditions.extend(filters);
        self
    }

    /// Add ordering
    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.order_by.push((field.to_string(), order));
        self
    }

    /// Add limit
    pub fn limit(mut self, limit: i64) -> Self {
        self.pagination.limit = Some(limit);
        self
    }

    /// Add skip
    pub fn skip(mut self, skip: i64) -> Self {
        self.pagination.skip = Some(skip);
        self
    }

    /// Replace skip and limit at once
    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Restrict returned fields
    pub fn project(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Build filter document
    pub fn build_filter_document(&self) -> Document {
        DocumentGenerator::build_filter_document(&self.conditions)
    }

    /// Build sort document, `None` when no ordering was requested
    pub fn build_sort_document(&self) -> Option<Document> {
        if self.order_by.is_empty() {
            None
        } else {
            Some(DocumentGenerator::build_sort_document(&self.order_by))
        }
    }

    /// Build projection document, `None` when all fields are returned
    pub fn build_projection_document(&self) -> Option<Document> {
        self.projection
            .as_ref()
            .filter(|p| !p.is_empty())
            .map(Projection::to_document)
    }

    /// Build the complete find descriptor
    pub fn build(&self) -> FindDescriptor {
        FindDescriptor {
            filter: self.build_filter_document(),
            projection: self.build_projection_document(),
            sort: self.build_sort_document(),
            skip: self.pagination.skip,
            limit: self.pagination.limit,
        }
    }
}
