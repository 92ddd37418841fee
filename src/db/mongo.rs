use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use tracing::{info, warn};
use crate::config::MongoConfig;
use crate::db::{Connector, DeleteOutcome, DocumentStore, InsertOutcome, UpdateOutcome};
use crate::error::DatabaseError;

pub fn connection_uri(host: &str, port: u16) -> String {
    format!("mongodb://{}:{}", host, port)
}

pub struct MongoConnector {
    connect_timeout: Duration,
    app_name: String,
}

impl MongoConnector {
    pub fn new(connect_timeout: Duration, app_name: impl Into<String>) -> Self {
        Self {
            connect_timeout,
            app_name: app_name.into(),
        }
    }

    pub fn from_config(config: &MongoConfig) -> Self {
        Self::new(config.connect_timeout(), config.app_name.clone())
    }
}

#[async_trait]
impl Connector for MongoConnector {
    async fn connect(&self, host: &str, port: u16) -> Result<Arc<dyn DocumentStore>, DatabaseError> {
        let uri = connection_uri(host, port);

        let mut options = ClientOptions::parse(&uri)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;
        options.app_name = Some(self.app_name.clone());
        options.connect_timeout = Some(self.connect_timeout);
        options.server_selection_timeout = Some(self.connect_timeout);

        let client = Client::with_options(options)
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        // The driver connects lazily; a ping forces server selection.
        client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                warn!("Connection to {} failed: {}", uri, e);
                DatabaseError::ConnectionError(e.to_string())
            })?;

        info!("Connected to {}", uri);
        Ok(Arc::new(MongoStore::new(client)))
    }
}

/// Session handle backed by a driver `Client`.
pub struct MongoStore {
    client: Client,
}

impl MongoStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn collection(&self, database: &str, collection: &str) -> Collection<Document> {
        self.client.database(database).collection::<Document>(collection)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn list_database_names(&self) -> Result<Vec<String>, DatabaseError> {
        Ok(self.client.list_database_names(None, None).await?)
    }

    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>, DatabaseError> {
        Ok(self.client.database(database).list_collection_names(None).await?)
    }

    async fn find(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
    ) -> Result<Vec<Document>, DatabaseError> {
        let cursor = self.collection(database, collection).find(filter, None).await?;
        Ok(cursor.try_collect::<Vec<Document>>().await?)
    }

    async fn insert_many(
        &self,
        database: &str,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<InsertOutcome, DatabaseError> {
        let result = self
            .collection(database, collection)
            .insert_many(documents, None)
            .await?;

        let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);

        // The driver surfaces unacknowledged writes as errors.
        Ok(InsertOutcome {
            acknowledged: true,
            inserted_ids: ids.into_iter().map(|(_, id)| id).collect(),
        })
    }

    async fn delete_one(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
    ) -> Result<DeleteOutcome, DatabaseError> {
        let result = self
            .collection(database, collection)
            .delete_one(filter, None)
            .await?;

        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }

    async fn update_one(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateOutcome, DatabaseError> {
        let result = self
            .collection(database, collection)
            .update_one(filter, update, None)
            .await?;

        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    async fn replace_one(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        replacement: Document,
    ) -> Result<UpdateOutcome, DatabaseError> {
        let result = self
            .collection(database, collection)
            .replace_one(filter, replacement, None)
            .await?;

        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    async fn create_collection(&self, database: &str, collection: &str) -> Result<(), DatabaseError> {
        Ok(self
            .client
            .database(database)
            .create_collection(collection, None)
            .await?)
    }

    async fn drop_database(&self, database: &str) -> Result<(), DatabaseError> {
        Ok(self.client.database(database).drop(None).await?)
    }

    async fn drop_collection(&self, database: &str, collection: &str) -> Result<(), DatabaseError> {
        Ok(self.collection(database, collection).drop(None).await?)
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
    }
}
