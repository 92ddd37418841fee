//! JSON ⇄ BSON conversion at the HTTP boundary.
//!
//! ObjectIds leave the service as plain hex strings so clients can feed
//! them straight back into the by-id routes; every other BSON value uses
//! relaxed extended JSON.

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use serde_json::{Map, Value};
use crate::error::{AppError, DatabaseError};

pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::Document(doc) => document_to_json(doc),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

pub fn document_to_json(doc: Document) -> Value {
    let map: Map<String, Value> = doc
        .into_iter()
        .map(|(key, value)| (key, bson_to_json(value)))
        .collect();
    Value::Object(map)
}

/// Converts a JSON object into a document, accepting extended JSON forms.
pub fn json_to_document(value: Value) -> Result<Document, AppError> {
    match Bson::try_from(value) {
        Ok(Bson::Document(doc)) => Ok(doc),
        Ok(_) => Err(AppError::Validation("Expected a JSON object".into())),
        Err(e) => Err(AppError::Validation(format!("Invalid document: {}", e))),
    }
}

pub fn parse_object_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id.trim())
        .map_err(|_| AppError::Validation(format!("'{}' is not a valid document id", id)))
}

/// Parses the query string sent to `filter_docs`.
///
/// A top-level `_id` given as a hex string is matched as an ObjectId.
pub fn parse_query(query: &str) -> Result<Document, DatabaseError> {
    let value: Value = serde_json::from_str(query)
        .map_err(|e| DatabaseError::InvalidQuery(e.to_string()))?;

    let mut filter = match Bson::try_from(value) {
        Ok(Bson::Document(doc)) => doc,
        Ok(_) => return Err(DatabaseError::InvalidQuery("query must be a JSON object".into())),
        Err(e) => return Err(DatabaseError::InvalidQuery(e.to_string())),
    };

    let oid = match filter.get("_id") {
        Some(Bson::String(id)) => ObjectId::parse_str(id).ok(),
        _ => None,
    };
    if let Some(oid) = oid {
        filter.insert("_id", oid);
    }

    Ok(filter)
}
