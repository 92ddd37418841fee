use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse};
use mongodb::bson::{doc, Document};
use serde_json::Value;
use tracing::{info, warn};
use crate::admin::requests::{
    required, ConnectRequest, FilterRequest, InsertRequest, NamespaceRequest, UpdateRequest,
};
use crate::db::convert::{bson_to_json, document_to_json, json_to_document, parse_object_id, parse_query};
use crate::error::{AppError, DatabaseError};
use crate::session::{ActiveConnection, Session};
use crate::AppState;

fn text(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(ContentType::plaintext())
        .body(body)
}

fn acknowledged(acknowledged: bool) -> Result<(), AppError> {
    if acknowledged {
        Ok(())
    } else {
        Err(DatabaseError::NotAcknowledged.into())
    }
}

fn expect_count(operation: &'static str, expected: u64, actual: u64) -> Result<(), AppError> {
    if expected == actual {
        Ok(())
    } else {
        Err(DatabaseError::UnexpectedCount { operation, expected, actual }.into())
    }
}

pub fn form_config() -> web::FormConfig {
    web::FormConfig::default().error_handler(|err, _req| {
        warn!("Rejected form body: {}", err);
        AppError::Validation("Cannot parse data".into()).into()
    })
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        warn!("Rejected JSON body: {}", err);
        AppError::Validation(format!("Cannot parse data: {}", err)).into()
    })
}

pub async fn connect(
    form: web::Form<ConnectRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (host, port) = form.into_inner().validate()?;
    info!("Received connect request for {}:{}", host, port);

    let connection = state.connector.connect(&host, port).await?;
    let id = state.sessions.put(Session::new(host, port, connection)).await;

    Ok(HttpResponse::Ok()
        .insert_header(ContentType::plaintext())
        .cookie(state.cookies.session_cookie(&id))
        .body(id.to_string()))
}

pub async fn disconnect(
    conn: ActiveConnection,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    if let Some(session) = state.sessions.remove(&conn.session_id).await {
        session.connection.close().await;
    }

    Ok(HttpResponse::Ok()
        .insert_header(ContentType::plaintext())
        .cookie(state.cookies.removal_cookie())
        .body("Disconnected"))
}

pub async fn show_dbs(conn: ActiveConnection) -> Result<HttpResponse, AppError> {
    let names = conn.store.list_database_names().await?;
    Ok(HttpResponse::Ok().json(names))
}

pub async fn show_cols(
    conn: ActiveConnection,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let db = required(Some(path.into_inner()), "database")?;
    let names = conn.store.list_collection_names(&db).await?;
    Ok(HttpResponse::Ok().json(names))
}

pub async fn fetch_data(
    conn: ActiveConnection,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (db, col) = path.into_inner();
    let db = required(Some(db), "database")?;
    let col = required(Some(col), "collection")?;

    let docs = conn.store.find(&db, &col, doc! {}).await?;
    let docs: Vec<Value> = docs.into_iter().map(document_to_json).collect();
    Ok(HttpResponse::Ok().json(docs))
}

// MongoDB creates a database with its first collection, so both routes
// come down to createCollection.
async fn create_namespace(
    conn: &ActiveConnection,
    body: NamespaceRequest,
) -> Result<(String, String), AppError> {
    let (db, col) = body.validate()?;
    conn.store.create_collection(&db, &col).await?;
    info!("Created collection {}.{}", db, col);
    Ok((db, col))
}

pub async fn create_db(
    conn: ActiveConnection,
    body: web::Json<NamespaceRequest>,
) -> Result<HttpResponse, AppError> {
    let (db, col) = create_namespace(&conn, body.into_inner()).await?;
    Ok(text(format!("Database {} created with collection {}", db, col)))
}

pub async fn create_coll(
    conn: ActiveConnection,
    body: web::Json<NamespaceRequest>,
) -> Result<HttpResponse, AppError> {
    let (db, col) = create_namespace(&conn, body.into_inner()).await?;
    Ok(text(format!("Collection {} created in database {}", col, db)))
}

pub async fn drop_db(
    conn: ActiveConnection,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let db = required(Some(path.into_inner()), "database")?;
    conn.store.drop_database(&db).await?;
    info!("Dropped database {}", db);
    Ok(text(format!("Database {} dropped", db)))
}

pub async fn drop_col(
    conn: ActiveConnection,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (db, col) = path.into_inner();
    let db = required(Some(db), "database")?;
    let col = required(Some(col), "collection")?;

    conn.store.drop_collection(&db, &col).await?;
    info!("Dropped collection {}.{}", db, col);
    Ok(text(format!("Collection {} dropped from database {}", col, db)))
}

pub async fn insert_doc(
    conn: ActiveConnection,
    body: web::Json<InsertRequest>,
) -> Result<HttpResponse, AppError> {
    let (db, col, data) = body.into_inner().validate()?;
    let docs = data
        .into_iter()
        .map(json_to_document)
        .collect::<Result<Vec<_>, _>>()?;
    let expected = docs.len() as u64;

    let outcome = conn.store.insert_many(&db, &col, docs).await?;
    acknowledged(outcome.acknowledged)?;
    expect_count("insert", expected, outcome.inserted_ids.len() as u64)?;

    let ids: Vec<Value> = outcome.inserted_ids.into_iter().map(bson_to_json).collect();
    Ok(HttpResponse::Ok().json(ids))
}

pub async fn delete_doc(
    conn: ActiveConnection,
    path: web::Path<(String, String, String)>,
) -> Result<HttpResponse, AppError> {
    let (db, col, id) = path.into_inner();
    let db = required(Some(db), "database")?;
    let col = required(Some(col), "collection")?;
    let oid = parse_object_id(&required(Some(id), "document id")?)?;

    let outcome = conn.store.delete_one(&db, &col, doc! { "_id": oid }).await?;
    acknowledged(outcome.acknowledged)?;
    expect_count("delete", 1, outcome.deleted_count)?;

    Ok(text(format!("Document {} deleted", oid.to_hex())))
}

pub async fn delete_field(
    conn: ActiveConnection,
    path: web::Path<(String, String, String, String)>,
) -> Result<HttpResponse, AppError> {
    let (db, col, id, key) = path.into_inner();
    let db = required(Some(db), "database")?;
    let col = required(Some(col), "collection")?;
    let oid = parse_object_id(&required(Some(id), "document id")?)?;
    let key = required(Some(key), "field")?;

    let mut unset = Document::new();
    unset.insert(key.clone(), "");

    let outcome = conn
        .store
        .update_one(&db, &col, doc! { "_id": oid }, doc! { "$unset": unset })
        .await?;
    acknowledged(outcome.acknowledged)?;
    expect_count("delete field", 1, outcome.matched_count)?;

    Ok(text(format!("Field {} removed from document {}", key, oid.to_hex())))
}

pub async fn update_doc(
    conn: ActiveConnection,
    body: web::Json<UpdateRequest>,
) -> Result<HttpResponse, AppError> {
    let (db, col, id, replacement) = body.into_inner().validate()?;
    let oid = parse_object_id(&id)?;
    let replacement = json_to_document(replacement)?;

    let outcome = conn
        .store
        .replace_one(&db, &col, doc! { "_id": oid }, replacement)
        .await?;
    acknowledged(outcome.acknowledged)?;
    expect_count("update", 1, outcome.matched_count)?;

    Ok(text(format!("Document {} updated", oid.to_hex())))
}

pub async fn filter_docs(
    conn: ActiveConnection,
    body: web::Json<FilterRequest>,
) -> Result<HttpResponse, AppError> {
    let (db, col, query) = body.into_inner().validate()?;
    let filter = parse_query(&query)?;

    let docs = conn.store.find(&db, &col, filter).await?;
    let docs: Vec<Value> = docs.into_iter().map(document_to_json).collect();
    Ok(HttpResponse::Ok().json(docs))
}
