//! Database module for the gateway
//!
//! `Connector` opens connections to a MongoDB server and `DocumentStore`
//! is the handle each session owns. Route handlers only ever talk to the
//! traits, so the driver-backed implementation lives in `mongo`.

pub mod convert;
pub mod mongo;

use std::sync::Arc;
use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use crate::error::DatabaseError;

pub use mongo::{MongoConnector, MongoStore};

#[derive(Debug, Clone, PartialEq)]
pub struct InsertOutcome {
    pub acknowledged: bool,
    /// Ids in the order the documents were submitted.
    pub inserted_ids: Vec<Bson>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteOutcome {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

/// An open connection to a database server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_database_names(&self) -> Result<Vec<String>, DatabaseError>;

    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>, DatabaseError>;

    async fn find(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
    ) -> Result<Vec<Document>, DatabaseError>;

    async fn insert_many(
        &self,
        database: &str,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<InsertOutcome, DatabaseError>;

    async fn delete_one(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
    ) -> Result<DeleteOutcome, DatabaseError>;

    async fn update_one(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateOutcome, DatabaseError>;

    async fn replace_one(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        replacement: Document,
    ) -> Result<UpdateOutcome, DatabaseError>;

    async fn create_collection(&self, database: &str, collection: &str) -> Result<(), DatabaseError>;

    async fn drop_database(&self, database: &str) -> Result<(), DatabaseError>;

    async fn drop_collection(&self, database: &str, collection: &str) -> Result<(), DatabaseError>;

    /// Called when the owning session goes away.
    async fn close(&self);
}

/// Opens new connections; one call per `/connect` request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, host: &str, port: u16) -> Result<Arc<dyn DocumentStore>, DatabaseError>;
}
