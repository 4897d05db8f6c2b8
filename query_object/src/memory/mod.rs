//! In-process query engine
//!
//! `MemoryEngine` keeps one collection of records in memory and evaluates the
//! rendered descriptors against it. It understands the operators and stages
//! produced by this crate's builders.

pub mod evaluate;

use crate::descriptor::{
    AggregateDescriptor, DeleteDescriptor, DeleteSummary, ExplainDescriptor, FindDescriptor,
    IndexCreated, IndexDescriptor, InsertDescriptor, InsertSummary, UpdateDescriptor,
    UpdateSummary,
};
use crate::errors::QueryObjectError;
use crate::model::Book;
use crate::query_builder::explain::Verbosity;
use crate::traits::QueryEngine;
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use self::evaluate::{apply_projection, apply_update, matches_filter, run_pipeline, sort_documents};

const ID_INDEX: &str = "_id_";

/// In-memory engine over a single collection
pub struct MemoryEngine {
    collection: String,
    documents: RwLock<Vec<Document>>,
    indexes: RwLock<Vec<IndexDescriptor>>,
}

impl std::fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEngine")
            .field("collection", &self.collection)
            .field("documents", &self.documents.read().map(|d| d.len()).unwrap_or(0))
            .finish()
    }
}

impl MemoryEngine {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            documents: RwLock::new(Vec::new()),
            indexes: RwLock::new(Vec::new()),
        }
    }

    /// Create an engine seeded with records; records without `_id` get one
    pub fn with_documents(collection: impl Into<String>, documents: Vec<Document>) -> Self {
        let engine = Self::new(collection);
        if let Ok(mut stored) = engine.documents.write() {
            stored.extend(documents.into_iter().map(with_object_id));
        }
        engine
    }

    /// Create an engine seeded with typed books
    pub fn with_books(collection: impl Into<String>, books: &[Book]) -> Result<Self, QueryObjectError> {
        let documents = books
            .iter()
            .map(bson::to_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_documents(collection, documents))
    }

    /// Snapshot of the stored records in insertion order
    pub fn documents(&self) -> Result<Vec<Document>, QueryObjectError> {
        Ok(self.read_documents()?.clone())
    }

    pub fn len(&self) -> Result<usize, QueryObjectError> {
        Ok(self.read_documents()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, QueryObjectError> {
        Ok(self.read_documents()?.is_empty())
    }

    /// Names of all indexes, including the implicit `_id_` index
    pub fn index_names(&self) -> Result<Vec<String>, QueryObjectError> {
        let indexes = self.read_indexes()?;
        let mut names = vec![ID_INDEX.to_string()];
        names.extend(indexes.iter().map(IndexDescriptor::index_name));
        Ok(names)
    }

    fn read_documents(&self) -> Result<RwLockReadGuard<'_, Vec<Document>>, QueryObjectError> {
        self.documents
            .read()
            .map_err(|e| QueryObjectError::Poisoned(e.to_string()))
    }

    fn write_documents(&self) -> Result<RwLockWriteGuard<'_, Vec<Document>>, QueryObjectError> {
        self.documents
            .write()
            .map_err(|e| QueryObjectError::Poisoned(e.to_string()))
    }

    fn read_indexes(&self) -> Result<RwLockReadGuard<'_, Vec<IndexDescriptor>>, QueryObjectError> {
        self.indexes
            .read()
            .map_err(|e| QueryObjectError::Poisoned(e.to_string()))
    }

    fn run_find(&self, query: &FindDescriptor) -> Result<(Vec<Document>, usize), QueryObjectError> {
        let documents = self.read_documents()?;
        let examined = documents.len();

        let mut matched = Vec::new();
        for doc in documents.iter() {
            if matches_filter(doc, &query.filter)? {
                matched.push(doc.clone());
            }
        }
        drop(documents);

        if let Some(sort) = &query.sort {
            sort_documents(&mut matched, sort)?;
        }

        let skip = match query.skip {
            Some(skip) if skip < 0 => {
                return Err(QueryObjectError::MalformedDescriptor(format!(
                    "skip must be non-negative, got {}",
                    skip
                )))
            }
            Some(skip) => skip as usize,
            None => 0,
        };
        // A zero limit means no limit; a negative one is taken by magnitude
        let limit = match query.limit {
            Some(0) | None => usize::MAX,
            Some(limit) => limit.unsigned_abs() as usize,
        };

        let page = matched.into_iter().skip(skip).take(limit);
        let results = match &query.projection {
            Some(projection) => page
                .map(|doc| apply_projection(&doc, projection))
                .collect::<Result<Vec<_>, _>>()?,
            None => page.collect(),
        };
        Ok((results, examined))
    }

    // Index whose leading keys cover the most filter fields, if any
    fn plan_index(&self, filter: &Document) -> Result<Option<(String, Vec<String>)>, QueryObjectError> {
        if filter.contains_key("_id") {
            return Ok(Some((ID_INDEX.to_string(), vec!["_id".to_string()])));
        }

        let indexes = self.read_indexes()?;
        let best = indexes
            .iter()
            .map(|index| {
                let prefix: Vec<String> = index
                    .field_names()
                    .into_iter()
                    .take_while(|field| filter.contains_key(*field))
                    .map(str::to_string)
                    .collect();
                (index.index_name(), prefix)
            })
            .filter(|(_, prefix)| !prefix.is_empty())
            .max_by_key(|(_, prefix)| prefix.len());
        Ok(best)
    }
}

// Generated ids go first, matching how the server stores them
fn with_object_id(doc: Document) -> Document {
    if doc.contains_key("_id") {
        return doc;
    }
    let mut with_id = doc! { "_id": ObjectId::new() };
    with_id.extend(doc);
    with_id
}

#[async_trait]
impl QueryEngine for MemoryEngine {
    type Error = QueryObjectError;

    fn collection_name(&self) -> &str {
        &self.collection
    }

    async fn find(&self, query: &FindDescriptor) -> Result<Vec<Document>, Self::Error> {
        debug_log!("memory find on {}: {:?}", self.collection, query.filter);
        let (results, _) = self.run_find(query)?;
        trace_log!("memory find returned {} records", results.len());
        Ok(results)
    }

    async fn insert_many(&self, insert: &InsertDescriptor) -> Result<InsertSummary, Self::Error> {
        let mut documents = self.write_documents()?;
        let mut inserted_ids = Vec::with_capacity(insert.documents.len());
        for doc in &insert.documents {
            let doc = with_object_id(doc.clone());
            if let Some(id) = doc.get("_id") {
                inserted_ids.push(id.clone());
            }
            documents.push(doc);
        }
        debug_log!("memory insert of {} records into {}", inserted_ids.len(), self.collection);
        Ok(InsertSummary { inserted_ids })
    }

    async fn update_one(&self, update: &UpdateDescriptor) -> Result<UpdateSummary, Self::Error> {
        let mut documents = self.write_documents()?;
        let mut position = None;
        for (i, doc) in documents.iter().enumerate() {
            if matches_filter(doc, &update.filter)? {
                position = Some(i);
                break;
            }
        }

        let Some(position) = position else {
            debug_log!("memory update on {} matched nothing", self.collection);
            return Ok(UpdateSummary::default());
        };

        // Apply on a copy so a rejected update leaves the record untouched
        let mut updated = documents[position].clone();
        let modified = apply_update(&mut updated, &update.update)?;
        documents[position] = updated;

        Ok(UpdateSummary {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    async fn delete_one(&self, delete: &DeleteDescriptor) -> Result<DeleteSummary, Self::Error> {
        let mut documents = self.write_documents()?;
        let mut position = None;
        for (i, doc) in documents.iter().enumerate() {
            if matches_filter(doc, &delete.filter)? {
                position = Some(i);
                break;
            }
        }

        match position {
            Some(i) => {
                documents.remove(i);
                Ok(DeleteSummary { deleted_count: 1 })
            }
            None => Ok(DeleteSummary::default()),
        }
    }

    async fn aggregate(&self, aggregate: &AggregateDescriptor) -> Result<Vec<Document>, Self::Error> {
        let pipeline = aggregate.pipeline();
        debug_log!("memory aggregate on {} with {} stages", self.collection, pipeline.len());
        let snapshot = self.read_documents()?.clone();
        run_pipeline(snapshot, &pipeline)
    }

    async fn create_index(&self, index: &IndexDescriptor) -> Result<IndexCreated, Self::Error> {
        if index.keys.is_empty() {
            return Err(QueryObjectError::MalformedDescriptor(
                "index must have at least one key".to_string(),
            ));
        }

        let name = index.index_name();
        let mut indexes = self
            .indexes
            .write()
            .map_err(|e| QueryObjectError::Poisoned(e.to_string()))?;

        if let Some(existing) = indexes.iter().find(|i| i.index_name() == name) {
            if existing.keys != index.keys {
                return Err(QueryObjectError::MalformedDescriptor(format!(
                    "index {} already exists with different keys",
                    name
                )));
            }
            debug_log!("index {} already exists on {}", name, self.collection);
            return Ok(IndexCreated { name });
        }

        indexes.push(index.clone());
        debug_log!("created index {} on {}", name, self.collection);
        Ok(IndexCreated { name })
    }

    async fn explain(&self, explain: &ExplainDescriptor) -> Result<Document, Self::Error> {
        let query = &explain.query;
        let plan = self.plan_index(&query.filter)?;

        let winning_plan = match &plan {
            Some((index_name, key_fields)) => {
                let key_fields: Vec<Bson> = key_fields.iter().map(|f| Bson::String(f.clone())).collect();
                doc! {
                    "stage": "FETCH",
                    "inputStage": {
                        "stage": "IXSCAN",
                        "indexName": index_name.as_str(),
                        "keyFields": key_fields,
                    },
                }
            }
            None => doc! { "stage": "COLLSCAN" },
        };

        let mut report = doc! {
            "queryPlanner": {
                "namespace": format!("memory.{}", self.collection),
                "parsedQuery": query.filter.clone(),
                "winningPlan": winning_plan,
            },
        };

        if explain.verbosity != Verbosity::QueryPlanner {
            let (results, collection_size) = self.run_find(query)?;

            // An index scan only touches records matching the indexed prefix
            let (docs_examined, keys_examined) = match &plan {
                Some((_, key_fields)) => {
                    let mut prefix_filter = Document::new();
                    for field in key_fields {
                        if let Some(condition) = query.filter.get(field) {
                            prefix_filter.insert(field.clone(), condition.clone());
                        }
                    }
                    let documents = self.read_documents()?;
                    let mut hits = 0_i64;
                    for doc in documents.iter() {
                        if matches_filter(doc, &prefix_filter)? {
                            hits += 1;
                        }
                    }
                    (hits, hits)
                }
                None => (collection_size as i64, 0),
            };

            let returned = results.len() as i64;
            report.insert(
                "executionStats",
                doc! {
                    "executionSuccess": true,
                    "nReturned": returned,
                    "totalKeysExamined": keys_examined,
                    "totalDocsExamined": docs_examined,
                },
            );
        }

        debug_log!("memory explain on {} ({})", self.collection, explain.verbosity.as_str());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::explain::Verbosity;

    fn engine() -> MemoryEngine {
        MemoryEngine::with_documents(
            "books",
            vec![
                doc! { "title": "Dune", "author": "Frank Herbert", "published_year": 1965, "price": 9.99 },
                doc! { "title": "Emma", "author": "Jane Austen", "published_year": 1815, "price": 7.5 },
                doc! { "title": "Dune", "author": "Someone Else", "published_year": 2001, "price": 3.0 },
            ],
        )
    }

    #[test]
    fn test_seeded_records_receive_object_ids() {
        let engine = engine();
        let docs = engine.documents().unwrap();
        assert_eq!(docs.len(), 3);
        assert!(docs.iter().all(|d| matches!(d.get("_id"), Some(Bson::ObjectId(_)))));
        assert_eq!(docs[0].keys().next().map(String::as_str), Some("_id"));
    }

    #[tokio::test]
    async fn test_find_applies_sort_skip_and_limit() {
        let engine = engine();
        let query = FindDescriptor {
            sort: Some(doc! { "price": 1 }),
            skip: Some(1),
            limit: Some(1),
            ..FindDescriptor::default()
        };
        let found = engine.find(&query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get_str("title").unwrap(), "Emma");
    }

    #[tokio::test]
    async fn test_negative_skip_is_rejected() {
        let query = FindDescriptor {
            skip: Some(-5),
            limit: Some(5),
            ..FindDescriptor::default()
        };
        assert!(matches!(
            engine().find(&query).await,
            Err(QueryObjectError::MalformedDescriptor(_))
        ));
    }

    #[tokio::test]
    async fn test_mod_filter_on_extreme_value_keeps_engine_usable() {
        let engine = MemoryEngine::with_documents("books", vec![doc! { "published_year": -1e19 }]);
        let query = crate::query_builder::QueryBuilder::new()
            .filter(crate::query_builder::QueryFilter::modulo("published_year", -1, 0))
            .build();

        assert_eq!(engine.find(&query).await.unwrap().len(), 1);
        assert_eq!(engine.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_touch_first_match_only() {
        let engine = engine();
        let summary = engine
            .update_one(&UpdateDescriptor {
                filter: doc! { "title": "Dune" },
                update: doc! { "$set": { "price": 12.0 } },
            })
            .await
            .unwrap();
        assert_eq!(summary, UpdateSummary { matched_count: 1, modified_count: 1 });

        let docs = engine.documents().unwrap();
        assert_eq!(docs[0].get_f64("price").unwrap(), 12.0);
        assert_eq!(docs[2].get_f64("price").unwrap(), 3.0);

        let deleted = engine
            .delete_one(&DeleteDescriptor { filter: doc! { "title": "Dune" } })
            .await
            .unwrap();
        assert_eq!(deleted.deleted_count, 1);
        assert_eq!(engine.len().unwrap(), 2);

        let missing = engine
            .delete_one(&DeleteDescriptor { filter: doc! { "title": "Nope" } })
            .await
            .unwrap();
        assert_eq!(missing.deleted_count, 0);
    }

    #[tokio::test]
    async fn test_rejected_update_leaves_record_untouched() {
        let engine = engine();
        let result = engine
            .update_one(&UpdateDescriptor {
                filter: doc! { "title": "Emma" },
                update: doc! { "$set": { "price": 1.0 }, "$rename": { "title": "name" } },
            })
            .await;
        assert!(result.is_err());
        let docs = engine.documents().unwrap();
        assert_eq!(docs[1].get_f64("price").unwrap(), 7.5);
    }

    #[tokio::test]
    async fn test_index_creation_is_idempotent() {
        let engine = engine();
        let index = IndexDescriptor::new().ascending("title");
        let first = engine.create_index(&index).await.unwrap();
        let second = engine.create_index(&index).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.index_names().unwrap(), vec!["_id_", "title_1"]);

        let clash = IndexDescriptor::new().ascending("author").named("title_1");
        assert!(engine.create_index(&clash).await.is_err());
    }

    #[tokio::test]
    async fn test_explain_reports_index_usage() {
        let engine = engine();
        let query = FindDescriptor {
            filter: doc! { "title": "Dune" },
            ..FindDescriptor::default()
        };

        let before = engine.explain(&ExplainDescriptor::new(query.clone())).await.unwrap();
        let planner = before.get_document("queryPlanner").unwrap();
        assert_eq!(
            planner.get_document("winningPlan").unwrap().get_str("stage").unwrap(),
            "COLLSCAN"
        );
        let stats = before.get_document("executionStats").unwrap();
        assert_eq!(stats.get_i64("nReturned").unwrap(), 2);
        assert_eq!(stats.get_i64("totalDocsExamined").unwrap(), 3);

        engine
            .create_index(&IndexDescriptor::new().ascending("title"))
            .await
            .unwrap();
        let after = engine.explain(&ExplainDescriptor::new(query.clone())).await.unwrap();
        let input = after
            .get_document("queryPlanner")
            .unwrap()
            .get_document("winningPlan")
            .unwrap()
            .get_document("inputStage")
            .unwrap();
        assert_eq!(input.get_str("indexName").unwrap(), "title_1");
        assert_eq!(
            after.get_document("executionStats").unwrap().get_i64("totalDocsExamined").unwrap(),
            2
        );

        let planner_only = engine
            .explain(&ExplainDescriptor::new(query).with_verbosity(Verbosity::QueryPlanner))
            .await
            .unwrap();
        assert!(planner_only.get("executionStats").is_none());
    }

    #[tokio::test]
    async fn test_compound_index_prefix_is_chosen() {
        let engine = engine();
        engine
            .create_index(
                &IndexDescriptor::new()
                    .ascending("author")
                    .ascending("published_year"),
            )
            .await
            .unwrap();
        engine
            .create_index(&IndexDescriptor::new().ascending("author"))
            .await
            .unwrap();

        let plan = engine
            .plan_index(&doc! { "author": "Jane Austen", "published_year": 1815 })
            .unwrap();
        assert_eq!(
            plan.map(|(name, _)| name).as_deref(),
            Some("author_1_published_year_1")
        );
        assert!(engine.plan_index(&doc! { "published_year": 1815 }).unwrap().is_none());
    }
}
