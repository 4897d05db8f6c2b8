use bson::{Bson, Document};

/// Type of update operation to perform on a field
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOperation {
    /// Set field to a specific value: `$set`
    Set(Bson),

    /// Add to the field: `$inc`
    Increment(Bson),

    /// Multiply the field: `$mul`
    Multiply(Bson),

    /// Remove the field: `$unset`
    Unset,
}

impl UpdateOperation {
    /// Update operator this operation is grouped under
    pub fn to_operator(&self) -> &'static str {
        match self {
            UpdateOperation::Set(_) => "$set",
            UpdateOperation::Increment(_) => "$inc",
            UpdateOperation::Multiply(_) => "$mul",
            UpdateOperation::Unset => "$unset",
        }
    }

    /// Operand written next to the field name
    pub fn value(&self) -> Bson {
        match self {
            UpdateOperation::Set(v)
            | UpdateOperation::Increment(v)
            | UpdateOperation::Multiply(v) => v.clone(),
            UpdateOperation::Unset => Bson::String(String::new()),
        }
    }
}

/// Container for update operations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSet {
    pub operations: Vec<(String, UpdateOperation)>,
}

impl UpdateSet {
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
        }
    }

    /// Set a field to a specific value
    pub fn set(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.with(field.into(), UpdateOperation::Set(value.into()))
    }

    /// Increment a field by a value
    pub fn increment(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.with(field.into(), UpdateOperation::Increment(value.into()))
    }

    /// Multiply a field by a value
    pub fn multiply(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.with(field.into(), UpdateOperation::Multiply(value.into()))
    }

    /// Remove a field
    pub fn unset(self, field: impl Into<String>) -> Self {
        self.with(field.into(), UpdateOperation::Unset)
    }

    // One operation per field; the latest wins
    fn with(mut self, field: String, operation: UpdateOperation) -> Self {
        self.operations.retain(|(existing, _)| *existing != field);
        self.operations.push((field, operation));
        self
    }

    /// Check if there are any operations
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Get number of operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Update document grouped by operator, e.g. `{$set: {price: 12.5}}`
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        for (field, operation) in &self.operations {
            let operator = operation.to_operator();
            if !doc.contains_key(operator) {
                doc.insert(operator, Document::new());
            }
            if let Ok(fields) = doc.get_document_mut(operator) {
                fields.insert(field.clone(), operation.value());
            }
        }
        doc
    }
}
