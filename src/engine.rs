//! MongoDB execution of query-object descriptors
//!
//! `MongoEngine` hands every descriptor to the driver as is. Driver errors are
//! returned unchanged, including server rejections of out-of-range requests.

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Collection, Cursor, Database, IndexModel};
use query_object::descriptor::{
    AggregateDescriptor, DeleteDescriptor, DeleteSummary, ExplainDescriptor, FindDescriptor,
    IndexCreated, IndexDescriptor, InsertDescriptor, InsertSummary, UpdateDescriptor,
    UpdateSummary,
};
use query_object::QueryEngine;

/// Query engine backed by one MongoDB collection
#[derive(Clone, Debug)]
pub struct MongoEngine {
    database: Database,
    collection: Collection<Document>,
}

impl MongoEngine {
    pub fn new(database: Database, collection: &str) -> Self {
        let collection = database.collection::<Document>(collection);
        Self {
            database,
            collection,
        }
    }

    /// Underlying driver collection
    pub fn collection(&self) -> &Collection<Document> {
        &self.collection
    }

    // A negative skip cannot be expressed through FindOptions, so it is sent
    // as a raw find command and the server decides
    async fn find_with_command(
        &self,
        query: &FindDescriptor,
    ) -> Result<Vec<Document>, mongodb::error::Error> {
        let command = query.to_command(self.collection.name());
        debug_log!("raw find command: {:?}", command);
        let reply = self.database.run_command(command, None).await?;

        let batch = reply
            .get_document("cursor")
            .ok()
            .and_then(|cursor| cursor.get_array("firstBatch").ok())
            .map(|batch| {
                batch
                    .iter()
                    .filter_map(|entry| match entry {
                        Bson::Document(doc) => Some(doc.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(batch)
    }
}

async fn collect(mut cursor: Cursor<Document>) -> Result<Vec<Document>, mongodb::error::Error> {
    let mut documents = Vec::new();
    while cursor.advance().await? {
        documents.push(cursor.deserialize_current()?);
    }
    Ok(documents)
}

#[async_trait]
impl QueryEngine for MongoEngine {
    type Error = mongodb::error::Error;

    fn collection_name(&self) -> &str {
        self.collection.name()
    }

    async fn find(&self, query: &FindDescriptor) -> Result<Vec<Document>, Self::Error> {
        if query.skip.is_some_and(|skip| skip < 0) {
            return self.find_with_command(query).await;
        }

        debug_log!("find on {}: {:?}", self.collection.name(), query.filter);
        let mut options = FindOptions::default();
        options.projection = query.projection.clone();
        options.sort = query.sort.clone();
        options.skip = query.skip.and_then(|skip| u64::try_from(skip).ok());
        options.limit = query.limit;

        let cursor = self.collection.find(query.filter.clone(), options).await?;
        collect(cursor).await
    }

    async fn insert_many(&self, insert: &InsertDescriptor) -> Result<InsertSummary, Self::Error> {
        debug_log!(
            "insert_many on {}: {} documents",
            self.collection.name(),
            insert.documents.len()
        );
        let result = self
            .collection
            .insert_many(insert.documents.clone(), None)
            .await?;

        let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(position, _)| *position);
        Ok(InsertSummary {
            inserted_ids: ids.into_iter().map(|(_, id)| id).collect(),
        })
    }

    async fn update_one(&self, update: &UpdateDescriptor) -> Result<UpdateSummary, Self::Error> {
        debug_log!(
            "update_one on {}: {:?} -> {:?}",
            self.collection.name(),
            update.filter,
            update.update
        );
        let result = self
            .collection
            .update_one(update.filter.clone(), update.update.clone(), None)
            .await?;
        Ok(UpdateSummary {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    async fn delete_one(&self, delete: &DeleteDescriptor) -> Result<DeleteSummary, Self::Error> {
        debug_log!("delete_one on {}: {:?}", self.collection.name(), delete.filter);
        let result = self
            .collection
            .delete_one(delete.filter.clone(), None)
            .await?;
        Ok(DeleteSummary {
            deleted_count: result.deleted_count,
        })
    }

    async fn aggregate(&self, aggregate: &AggregateDescriptor) -> Result<Vec<Document>, Self::Error> {
        let pipeline = aggregate.pipeline();
        debug_log!("aggregate on {}: {:?}", self.collection.name(), pipeline);
        let cursor = self.collection.aggregate(pipeline, None).await?;
        collect(cursor).await
    }

    async fn create_index(&self, index: &IndexDescriptor) -> Result<IndexCreated, Self::Error> {
        let keys = index.keys_document();
        debug_log!("create_index on {}: {:?}", self.collection.name(), keys);

        let options = index
            .name
            .as_ref()
            .map(|name| IndexOptions::builder().name(name.clone()).build());
        let model = IndexModel::builder().keys(keys).options(options).build();

        let result = self.collection.create_index(model, None).await?;
        Ok(IndexCreated {
            name: result.index_name,
        })
    }

    async fn explain(&self, explain: &ExplainDescriptor) -> Result<Document, Self::Error> {
        let command = explain.to_command(self.collection.name());
        debug_log!("explain on {}: {:?}", self.collection.name(), command);
        self.database.run_command(command, None).await
    }
}
