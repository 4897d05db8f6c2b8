use super::aggregation::{Accumulator, Expression};
use bson::{Bson, Document};

/// Represents a `$group` stage
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBy {
    /// Fields to group by; none groups the whole input into one record
    pub fields: Vec<String>,
    /// Accumulated output fields, in order
    pub accumulators: Vec<Accumulator>,
}

impl GroupBy {
    /// Create a new group over the specified fields
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            accumulators: Vec::new(),
        }
    }

    /// Create a group keyed on a single field
    pub fn single(field: impl Into<String>) -> Self {
        Self::new(vec![field.into()])
    }

    /// Add an accumulated output field
    pub fn accumulate(mut self, accumulator: Accumulator) -> Self {
        self.accumulators.push(accumulator);
        self
    }

    /// Group key expression rendered for `_id`
    pub fn key(&self) -> Bson {
        match self.fields.as_slice() {
            [] => Bson::Null,
            [field] => Expression::field(field.as_str()).to_bson(),
            fields => {
                let mut compound = Document::new();
                for field in fields {
                    compound.insert(field.clone(), Expression::field(field.as_str()).to_bson());
                }
                Bson::Document(compound)
            }
        }
    }

    /// Body of the `$group` stage
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("_id", self.key());
        for accumulator in &self.accumulators {
            doc.insert(accumulator.output_name(), accumulator.to_document());
        }
        doc
    }
}
