//! Aggregation pipeline stages
//!
//! Stage order is significant and is preserved exactly as built.

use super::document_generation::DocumentGenerator;
use super::filter::QueryFilter;
use super::grouping::GroupBy;
use super::ordering::SortOrder;
use super::projection::Projection;
use bson::{Bson, Document};

/// A single pipeline stage, rendered as a one-key document
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// `$match`: filters combined with AND
    Match(Vec<QueryFilter>),
    /// `$group`
    Group(GroupBy),
    /// `$sort`: keys in priority order
    Sort(Vec<(String, SortOrder)>),
    /// `$limit`
    Limit(i64),
    /// `$skip`
    Skip(i64),
    /// `$project`
    Project(Projection),
    /// `$count`: output field name
    Count(String),
}

impl Stage {
    /// Stage key, e.g. `$group`
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Match(_) => "$match",
            Stage::Group(_) => "$group",
            Stage::Sort(_) => "$sort",
            Stage::Limit(_) => "$limit",
            Stage::Skip(_) => "$skip",
            Stage::Project(_) => "$project",
            Stage::Count(_) => "$count",
        }
    }

    pub fn to_document(&self) -> Document {
        let body = match self {
            Stage::Match(filters) => Bson::Document(DocumentGenerator::build_filter_document(filters)),
            Stage::Group(group_by) => Bson::Document(group_by.to_document()),
            Stage::Sort(keys) => Bson::Document(DocumentGenerator::build_sort_document(keys)),
            Stage::Limit(n) | Stage::Skip(n) => Bson::Int64(*n),
            Stage::Project(projection) => Bson::Document(projection.to_document()),
            Stage::Count(field) => Bson::String(field.clone()),
        };
        let mut doc = Document::new();
        doc.insert(self.name(), body);
        doc
    }
}

/// Builder for an ordered list of stages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a `$match` stage
    pub fn filter(mut self, filters: Vec<QueryFilter>) -> Self {
        self.stages.push(Stage::Match(filters));
        self
    }

    /// Append a `$group` stage
    pub fn group(mut self, group_by: GroupBy) -> Self {
        self.stages.push(Stage::Group(group_by));
        self
    }

    /// Add a sort key; consecutive calls extend the same `$sort` stage
    pub fn sort(mut self, field: &str, order: SortOrder) -> Self {
        match self.stages.last_mut() {
            Some(Stage::Sort(keys)) => keys.push((field.to_string(), order)),
            _ => self
                .stages
                .push(Stage::Sort(vec![(field.to_string(), order)])),
        }
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.stages.push(Stage::Limit(limit));
        self
    }

    pub fn skip(mut self, skip: i64) -> Self {
        self.stages.push(Stage::Skip(skip));
        self
    }

    pub fn project(mut self, projection: Projection) -> Self {
        self.stages.push(Stage::Project(projection));
        self
    }

    pub fn count(mut self, field: impl Into<String>) -> Self {
        self.stages.push(Stage::Count(field.into()));
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn into_stages(self) -> Vec<Stage> {
        self.stages
    }

    pub fn to_documents(&self) -> Vec<Document> {
        DocumentGenerator::build_pipeline(&self.stages)
    }
}
