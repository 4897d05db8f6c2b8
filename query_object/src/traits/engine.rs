use crate::descriptor::{
    AggregateDescriptor, DeleteDescriptor, DeleteSummary, ExplainDescriptor, FindDescriptor,
    IndexCreated, IndexDescriptor, InsertDescriptor, InsertSummary, UpdateDescriptor,
    UpdateSummary,
};
use async_trait::async_trait;
use bson::Document;

/// Executes request descriptors against one book collection.
///
/// Implementations hand engine failures back unchanged through `Error`;
/// they do not validate, wrap or retry.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Name of the collection requests are issued against
    fn collection_name(&self) -> &str;

    async fn find(&self, query: &FindDescriptor) -> Result<Vec<Document>, Self::Error>;

    async fn insert_many(&self, insert: &InsertDescriptor) -> Result<InsertSummary, Self::Error>;

    /// Update the first record matching the filter
    async fn update_one(&self, update: &UpdateDescriptor) -> Result<UpdateSummary, Self::Error>;

    /// Delete the first record matching the filter
    async fn delete_one(&self, delete: &DeleteDescriptor) -> Result<DeleteSummary, Self::Error>;

    async fn aggregate(&self, aggregate: &AggregateDescriptor)
        -> Result<Vec<Document>, Self::Error>;

    /// Create an index; an equivalent existing index is not an error
    async fn create_index(&self, index: &IndexDescriptor) -> Result<IndexCreated, Self::Error>;

    /// Execution report for a find, no records are returned
    async fn explain(&self, explain: &ExplainDescriptor) -> Result<Document, Self::Error>;
}
