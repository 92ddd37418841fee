use serde::Deserialize;
use serde_json::Value;
use crate::error::AppError;

/// Form body of `/connect`.
#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub host: Option<String>,
    pub port: Option<String>,
}

impl ConnectRequest {
    pub fn validate(self) -> Result<(String, u16), AppError> {
        let host = required(self.host, "host")?;
        url::Host::parse(&host)
            .map_err(|e| AppError::Validation(format!("Invalid host '{}': {}", host, e)))?;

        let port = required(self.port, "port")?;
        let port = port
            .parse::<u16>()
            .map_err(|_| AppError::Validation(format!("Invalid port '{}'", port)))?;

        Ok((host, port))
    }
}

/// Body of `/create_db` and `/create_coll`.
#[derive(Debug, Deserialize)]
pub struct NamespaceRequest {
    pub database: Option<String>,
    pub collection: Option<String>,
}

impl NamespaceRequest {
    pub fn validate(self) -> Result<(String, String), AppError> {
        Ok((
            required(self.database, "database")?,
            required(self.collection, "collection")?,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct InsertRequest {
    pub database: Option<String>,
    pub collection: Option<String>,
    pub data: Option<Value>,
}

impl InsertRequest {
    pub fn validate(self) -> Result<(String, String, Vec<Value>), AppError> {
        let database = required(self.database, "database")?;
        let collection = required(self.collection, "collection")?;

        let data = match self.data {
            Some(Value::Array(items)) if !items.is_empty() => items,
            Some(Value::Array(_)) => {
                return Err(AppError::Validation("No documents to insert".into()))
            }
            Some(_) => return Err(AppError::Validation("data must be an array of documents".into())),
            None => return Err(AppError::Validation("Missing data".into())),
        };

        Ok((database, collection, data))
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub database: Option<String>,
    pub collection: Option<String>,
    #[serde(rename = "updatedDoc")]
    pub updated_doc: Option<Value>,
}

impl UpdateRequest {
    /// Splits the document into its `_id` and the replacement body.
    pub fn validate(self) -> Result<(String, String, String, Value), AppError> {
        let database = required(self.database, "database")?;
        let collection = required(self.collection, "collection")?;

        let mut doc = match self.updated_doc {
            Some(Value::Object(map)) => map,
            Some(_) => return Err(AppError::Validation("updatedDoc must be an object".into())),
            None => return Err(AppError::Validation("Missing updatedDoc".into())),
        };

        let id = match doc.remove("_id") {
            Some(Value::String(id)) => id,
            Some(_) => return Err(AppError::Validation("updatedDoc._id must be a string".into())),
            None => return Err(AppError::Validation("Missing updatedDoc._id".into())),
        };

        Ok((database, collection, id, Value::Object(doc)))
    }
}

#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    pub database: Option<String>,
    pub collection: Option<String>,
    pub query: Option<String>,
}

impl FilterRequest {
    pub fn validate(self) -> Result<(String, String, String), AppError> {
        Ok((
            required(self.database, "database")?,
            required(self.collection, "collection")?,
            required(self.query, "query")?,
        ))
    }
}

/// Rejects absent or blank values; anything else is returned as sent.
pub fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("Missing {}", name))),
    }
}
