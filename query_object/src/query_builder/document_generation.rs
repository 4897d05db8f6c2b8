//! Query builder utilities
//!
//! This module renders typed query parts into their BSON wire documents.

use crate::query_builder::filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
use crate::query_builder::ordering::SortOrder;
use crate::query_builder::pipeline::Stage;
use bson::{Bson, Document};

pub struct DocumentGenerator;

impl DocumentGenerator {
    /// Build a filter document from conditions combined with AND
    ///
    /// Conditions on distinct fields share one document. Operator objects on the
    /// same field are merged. Any other collision is moved into `$and`.
    pub fn build_filter_document(conditions: &[QueryFilter]) -> Document {
        let mut doc = Document::new();
        let mut conflicts = Vec::new();

        for filter in conditions {
            Self::merge_filter(&mut doc, filter, &mut conflicts);
        }

        if !conflicts.is_empty() {
            let mut clauses = match doc.remove("$and") {
                Some(Bson::Array(existing)) => existing,
                Some(other) => vec![other],
                None => Vec::new(),
            };
            clauses.extend(conflicts.into_iter().map(Bson::Document));
            doc.insert("$and", Bson::Array(clauses));
        }

        doc
    }

    fn merge_filter(doc: &mut Document, filter: &QueryFilter, conflicts: &mut Vec<Document>) {
        match filter {
            QueryFilter::Condition(condition) => {
                let rendered = Self::build_condition_value(condition);
                Self::merge_entry(doc, &condition.field, rendered, conflicts);
            }
            QueryFilter::Group {
                operator: LogicalOperator::And,
                filters,
            } => {
                for inner in filters {
                    Self::merge_filter(doc, inner, conflicts);
                }
            }
            QueryFilter::Group {
                operator: LogicalOperator::Or,
                filters,
            } => {
                let clauses: Vec<Bson> = filters
                    .iter()
                    .map(|f| Bson::Document(Self::build_filter_document(std::slice::from_ref(f))))
                    .collect();
                Self::merge_entry(doc, "$or", Bson::Array(clauses), conflicts);
            }
        }
    }

    fn merge_entry(doc: &mut Document, key: &str, value: Bson, conflicts: &mut Vec<Document>) {
        let Some(existing) = doc.get_mut(key) else {
            doc.insert(key, value);
            return;
        };

        if let (Bson::Document(current), Bson::Document(incoming)) = (&mut *existing, &value) {
            let both_operators = is_operator_document(current) && is_operator_document(incoming);
            let disjoint = incoming.keys().all(|k| !current.contains_key(k));
            if both_operators && disjoint {
                for (k, v) in incoming {
                    current.insert(k.clone(), v.clone());
                }
                return;
            }
        }

        let mut clause = Document::new();
        clause.insert(key, value);
        conflicts.push(clause);
    }

    /// Value written next to the field name for a single condition
    pub fn build_condition_value(condition: &QueryCondition) -> Bson {
        match &condition.operator {
            // A document with `$` keys would read as operators, so wrap it
            QueryOperator::Eq => match &condition.value {
                Some(Bson::Document(doc)) if is_operator_document(doc) => {
                    operator_object("$eq", Bson::Document(doc.clone()))
                }
                Some(value) => value.clone(),
                None => Bson::Null,
            },
            QueryOperator::IsNull => Bson::Null,
            QueryOperator::IsNotNull => operator_object("$ne", Bson::Null),
            other => {
                // to_key is only None for Eq and IsNull, handled above
                let key = other.to_key().unwrap_or("$eq");
                operator_object(key, condition.value.clone().unwrap_or(Bson::Null))
            }
        }
    }

    /// Build a sort document; key order is priority order
    pub fn build_sort_document(order_by: &[(String, SortOrder)]) -> Document {
        let mut doc = Document::new();
        for (field, order) in order_by {
            doc.insert(field.clone(), order.to_bson());
        }
        doc
    }

    /// Render every stage of a pipeline, in order
    pub fn build_pipeline(stages: &[Stage]) -> Vec<Document> {
        stages.iter().map(Stage::to_document).collect()
    }
}

fn operator_object(key: &str, value: Bson) -> Bson {
    let mut doc = Document::new();
    doc.insert(key, value);
    Bson::Document(doc)
}

fn is_operator_document(doc: &Document) -> bool {
    !doc.is_empty() && doc.keys().all(|k| k.starts_with('$'))
}
