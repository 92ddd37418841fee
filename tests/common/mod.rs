//! In-memory stand-ins for the MongoDB connector used by the API tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use mongo_gateway::db::{DeleteOutcome, InsertOutcome, UpdateOutcome};
use mongo_gateway::{AppState, Connector, DatabaseError, DocumentStore, Settings};

type Databases = BTreeMap<String, BTreeMap<String, Vec<Document>>>;

#[derive(Default)]
pub struct MemoryStore {
    databases: Mutex<Databases>,
    pub closed: AtomicBool,
}

fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, value)| doc.get(key) == Some(value))
}

impl MemoryStore {
    fn with_collection<T>(
        &self,
        database: &str,
        collection: &str,
        f: impl FnOnce(&mut Vec<Document>) -> T,
    ) -> T {
        let mut databases = self.databases.lock().unwrap();
        let docs = databases
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();
        f(docs)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_database_names(&self) -> Result<Vec<String>, DatabaseError> {
        Ok(self.databases.lock().unwrap().keys().cloned().collect())
    }

    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>, DatabaseError> {
        Ok(self
            .databases
            .lock()
            .unwrap()
            .get(database)
            .map(|cols| cols.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn find(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
    ) -> Result<Vec<Document>, DatabaseError> {
        let databases = self.databases.lock().unwrap();
        Ok(databases
            .get(database)
            .and_then(|cols| cols.get(collection))
            .map(|docs| docs.iter().filter(|d| matches(d, &filter)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert_many(
        &self,
        database: &str,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<InsertOutcome, DatabaseError> {
        let inserted_ids: Vec<Bson> = self.with_collection(database, collection, |docs| {
            documents
                .into_iter()
                .map(|mut doc| {
                    if !doc.contains_key("_id") {
                        doc.insert("_id", ObjectId::new());
                    }
                    let id = doc.get("_id").cloned().unwrap_or(Bson::Null);
                    docs.push(doc);
                    id
                })
                .collect()
        });

        Ok(InsertOutcome { acknowledged: true, inserted_ids })
    }

    async fn delete_one(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
    ) -> Result<DeleteOutcome, DatabaseError> {
        let deleted_count: u64 = self.with_collection(database, collection, |docs| {
            match docs.iter().position(|d| matches(d, &filter)) {
                Some(index) => {
                    docs.remove(index);
                    1
                }
                None => 0,
            }
        });

        Ok(DeleteOutcome { acknowledged: true, deleted_count })
    }

    async fn update_one(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateOutcome, DatabaseError> {
        let unset = update.get_document("$unset").cloned().unwrap_or_default();

        let (matched_count, modified_count): (u64, u64) = self.with_collection(database, collection, |docs| {
            match docs.iter_mut().find(|d| matches(d, &filter)) {
                Some(doc) => {
                    let removed = unset.keys().filter(|key| doc.remove(key.as_str()).is_some()).count();
                    (1, u64::from(removed > 0))
                }
                None => (0, 0),
            }
        });

        Ok(UpdateOutcome { acknowledged: true, matched_count, modified_count })
    }

    async fn replace_one(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        replacement: Document,
    ) -> Result<UpdateOutcome, DatabaseError> {
        let matched_count: u64 = self.with_collection(database, collection, |docs| {
            match docs.iter_mut().find(|d| matches(d, &filter)) {
                Some(doc) => {
                    let mut replaced = Document::new();
                    if let Some(id) = doc.get("_id") {
                        replaced.insert("_id", id.clone());
                    }
                    for (key, value) in replacement {
                        replaced.insert(key, value);
                    }
                    *doc = replaced;
                    1
                }
                None => 0,
            }
        });

        Ok(UpdateOutcome { acknowledged: true, matched_count, modified_count: matched_count })
    }

    async fn create_collection(&self, database: &str, collection: &str) -> Result<(), DatabaseError> {
        let mut databases = self.databases.lock().unwrap();
        let cols = databases.entry(database.to_string()).or_default();
        if cols.contains_key(collection) {
            return Err(DatabaseError::QueryError(format!(
                "Collection {}.{} already exists",
                database, collection
            )));
        }
        cols.insert(collection.to_string(), Vec::new());
        Ok(())
    }

    async fn drop_database(&self, database: &str) -> Result<(), DatabaseError> {
        self.databases.lock().unwrap().remove(database);
        Ok(())
    }

    async fn drop_collection(&self, database: &str, collection: &str) -> Result<(), DatabaseError> {
        if let Some(cols) = self.databases.lock().unwrap().get_mut(database) {
            cols.remove(collection);
        }
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Hands out a fresh `MemoryStore` per connect; hosts starting with
/// `unreachable` fail like a refused connection.
#[derive(Default)]
pub struct MemoryConnector {
    pub opened: Mutex<HashMap<String, Arc<MemoryStore>>>,
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, host: &str, port: u16) -> Result<Arc<dyn DocumentStore>, DatabaseError> {
        if host.starts_with("unreachable") {
            return Err(DatabaseError::ConnectionError(format!(
                "{}:{} connection refused",
                host, port
            )));
        }

        let store = Arc::new(MemoryStore::default());
        self.opened
            .lock()
            .unwrap()
            .insert(format!("{}:{}", host, port), store.clone());
        Ok(store)
    }
}

pub fn test_state() -> (AppState, Arc<MemoryConnector>) {
    let config = Settings::new_for_test().expect("Failed to load test config");
    let connector = Arc::new(MemoryConnector::default());
    let state = AppState::with_connector(config, connector.clone());
    (state, connector)
}

/// Posts to `/connect` and returns the session cookie.
#[macro_export]
macro_rules! connect {
    ($app:expr) => {
        connect!($app, "localhost", "27017")
    };
    ($app:expr, $host:expr, $port:expr) => {{
        let resp = actix_web::test::TestRequest::post()
            .uri("/connect")
            .set_form([("host", $host), ("port", $port)])
            .send_request(&$app)
            .await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
        resp.response()
            .cookies()
            .find(|c| c.name() == mongo_gateway::session::SESSION_COOKIE)
            .map(|c| c.into_owned())
            .expect("connect should set the session cookie")
    }};
}
