//! Query builder utilities
//!
//! This module provides field projections for finds and `$project` stages.

use super::aggregation::Expression;
use bson::{Bson, Document};

/// One entry of a projection
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionField {
    /// `field: 1`
    Include(String),
    /// `field: 0`
    Exclude(String),
    /// `field: <expression>`, only meaningful inside a `$project` stage
    Computed { field: String, expression: Expression },
}

impl ProjectionField {
    pub fn name(&self) -> &str {
        match self {
            ProjectionField::Include(field) | ProjectionField::Exclude(field) => field,
            ProjectionField::Computed { field, .. } => field,
        }
    }
}

/// Ordered projection specification
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub fields: Vec<ProjectionField>,
}

impl Projection {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Include a field in the output
    pub fn include(self, field: impl Into<String>) -> Self {
        self.push(ProjectionField::Include(field.into()))
    }

    /// Include several fields, in order
    pub fn include_all(self, fields: &[&str]) -> Self {
        fields
            .iter()
            .fold(self, |projection, field| projection.include(*field))
    }

    /// Drop a field from the output
    pub fn exclude(self, field: impl Into<String>) -> Self {
        self.push(ProjectionField::Exclude(field.into()))
    }

    /// Add a derived field
    pub fn computed(self, field: impl Into<String>, expression: Expression) -> Self {
        self.push(ProjectionField::Computed {
            field: field.into(),
            expression,
        })
    }

    // A later entry for the same field replaces the earlier one
    fn push(mut self, entry: ProjectionField) -> Self {
        self.fields.retain(|existing| existing.name() != entry.name());
        self.fields.push(entry);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Wire form: field name to 1, 0 or an expression
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        for entry in &self.fields {
            let value = match entry {
                ProjectionField::Include(_) => Bson::Int32(1),
                ProjectionField::Exclude(_) => Bson::Int32(0),
                ProjectionField::Computed { expression, .. } => expression.to_bson(),
            };
            doc.insert(entry.name(), value);
        }
        doc
    }
}
