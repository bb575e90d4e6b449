use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use mongodb::bson::Document;

use crate::core::{RequestContext, TallyError};
use crate::query::{DataQuery, DataQueryRecord, Pipeline};

/// A collection that can run an ordered aggregation pipeline.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Runs `pipeline` once and returns the raw result documents.
    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<Document>, TallyError>;

    /// Releases the underlying connection.
    async fn disconnect(&self) -> Result<(), TallyError>;
}

/// Runs count queries against a [`DocumentCollection`].
///
/// One aggregation call per [`get`](Self::get): no retries, no caching,
/// and no partial results when any document fails to decode. Records come
/// back in whatever order the collection produced them.
#[derive(Clone)]
pub struct DocumentQueryService {
    collection: Arc<dyn DocumentCollection>,
}

impl DocumentQueryService {
    pub fn new(collection: impl DocumentCollection + 'static) -> Self {
        Self {
            collection: Arc::new(collection),
        }
    }

    pub async fn get(
        &self,
        ctx: &RequestContext,
        query: &DataQuery,
    ) -> Result<Vec<DataQueryRecord>, TallyError> {
        let pipeline = Pipeline::for_query(query);
        let documents = ctx.run(self.collection.aggregate(&pipeline)).await?;
        debug!(
            "aggregation over {}..{} returned {} documents",
            query.start_date(),
            query.end_date(),
            documents.len()
        );
        documents
            .into_iter()
            .map(DataQueryRecord::try_from)
            .collect()
    }

    /// Only process shutdown should call this, and only once.
    pub async fn disconnect(&self) -> Result<(), TallyError> {
        self.collection.disconnect().await
    }
}
