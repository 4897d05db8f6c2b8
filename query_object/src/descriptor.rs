//! Request descriptors and the summaries engines return for them
//!
//! A descriptor describes one database request. Nothing runs until it is handed
//! to a [`QueryEngine`](crate::traits::QueryEngine).

use crate::query_builder::explain::Verbosity;
use crate::query_builder::ordering::SortOrder;
use crate::query_builder::pipeline::Stage;
use crate::query_builder::document_generation::DocumentGenerator;
use bson::{Bson, Document};

/// Read-only find request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindDescriptor {
    pub filter: Document,
    pub projection: Option<Document>,
    pub sort: Option<Document>,
    /// Signed so that out-of-range pages reach the engine unchanged
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl FindDescriptor {
    /// Equivalent `find` command for `collection`
    pub fn to_command(&self, collection: &str) -> Document {
        let mut command = Document::new();
        command.insert("find", collection);
        command.insert("filter", self.filter.clone());
        if let Some(projection) = &self.projection {
            command.insert("projection", projection.clone());
        }
        if let Some(sort) = &self.sort {
            command.insert("sort", sort.clone());
        }
        if let Some(skip) = self.skip {
            command.insert("skip", skip);
        }
        if let Some(limit) = self.limit {
            command.insert("limit", limit);
        }
        command
    }
}

/// Single-record update request (first match in engine order)
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateDescriptor {
    pub filter: Document,
    pub update: Document,
}

/// Single-record delete request (first match in engine order)
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteDescriptor {
    pub filter: Document,
}

/// Bulk insert request
#[derive(Debug, Clone, PartialEq)]
pub struct InsertDescriptor {
    pub documents: Vec<Document>,
}

/// Aggregation request holding an ordered list of stages
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateDescriptor {
    pub stages: Vec<Stage>,
}

impl AggregateDescriptor {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// Wire form of the pipeline
    pub fn pipeline(&self) -> Vec<Document> {
        DocumentGenerator::build_pipeline(&self.stages)
    }
}

/// Index creation request; key order is significant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexDescriptor {
    pub keys: Vec<(String, SortOrder)>,
    pub name: Option<String>,
}

impl IndexDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ascending(mut self, field: impl Into<String>) -> Self {
        self.keys.push((field.into(), SortOrder::Asc));
        self
    }

    pub fn descending(mut self, field: impl Into<String>) -> Self {
        self.keys.push((field.into(), SortOrder::Desc));
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Key document, e.g. `{author: 1, published_year: 1}`
    pub fn keys_document(&self) -> Document {
        DocumentGenerator::build_sort_document(&self.keys)
    }

    /// Explicit name, or the engine's default `field_dir` naming
    pub fn index_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .keys
                .iter()
                .map(|(field, order)| format!("{}_{}", field, order.to_direction()))
                .collect::<Vec<_>>()
                .join("_"),
        }
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.keys.iter().map(|(field, _)| field.as_str()).collect()
    }
}

/// Diagnostic request that reports how a find would execute
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainDescriptor {
    pub query: FindDescriptor,
    pub verbosity: Verbosity,
}

impl ExplainDescriptor {
    pub fn new(query: FindDescriptor) -> Self {
        Self {
            query,
            verbosity: Verbosity::ExecutionStats,
        }
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// `{explain: {find: ...}, verbosity: ...}` command for `collection`
    pub fn to_command(&self, collection: &str) -> Document {
        let mut command = Document::new();
        command.insert("explain", self.query.to_command(collection));
        command.insert("verbosity", self.verbosity.as_str());
        command
    }
}

/// Outcome of an update-one request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub matched_count: u64,
    pub modified_count: u64,
}

/// Outcome of a delete-one request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    pub deleted_count: u64,
}

/// Outcome of an insert-many request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertSummary {
    pub inserted_ids: Vec<Bson>,
}

/// Outcome of an index creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCreated {
    pub name: String,
}
