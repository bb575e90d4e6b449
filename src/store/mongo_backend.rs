use async_trait::async_trait;
use log::info;
use mongodb::bson::{Document, doc};
use mongodb::{Client, Collection};
use tokio_stream::StreamExt;

use super::document::DocumentCollection;
use crate::conf::MongoConfig;
use crate::core::TallyError;
use crate::query::Pipeline;

/// The MongoDB collection holding count observations.
pub struct MongoCollection {
    client: Client,
    collection: Collection<Document>,
}

impl MongoCollection {
    /// Connects and pings the database; fails if MongoDB is unreachable.
    pub async fn connect(config: &MongoConfig) -> Result<Self, TallyError> {
        let client = Client::with_uri_str(&config.uri).await.map_err(|e| {
            TallyError::StorageUnavailable(format!("database connection error: {e}"))
        })?;
        let database = client.database(&config.database);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| {
                TallyError::StorageUnavailable(format!("unable to ping the primary: {e}"))
            })?;

        info!(
            "Connected to MongoDB collection {}.{}",
            config.database, config.collection
        );

        Ok(Self {
            collection: database.collection(&config.collection),
            client,
        })
    }
}

#[async_trait]
impl DocumentCollection for MongoCollection {
    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<Document>, TallyError> {
        let cursor = self
            .collection
            .aggregate(pipeline.to_documents())
            .await
            .map_err(|e| TallyError::StorageUnavailable(format!("aggregation failed: {e}")))?;

        cursor
            .collect::<Result<Vec<Document>, _>>()
            .await
            .map_err(|e| {
                TallyError::StorageUnavailable(format!("unable to iterate over the results: {e}"))
            })
    }

    async fn disconnect(&self) -> Result<(), TallyError> {
        self.client.clone().shutdown().await;
        info!("Disconnected from MongoDB");
        Ok(())
    }
}
