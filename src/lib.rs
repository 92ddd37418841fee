pub mod admin;
pub mod config;
pub mod db;
pub mod error;
pub mod session;

use std::sync::Arc;
use actix_cors::Cors;
use actix_web::dev::HttpServiceFactory;
use actix_web::http::header;
use actix_web::middleware::from_fn;
use actix_web::{web, HttpResponse, Route};

pub use error::{AppError, DatabaseError};
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::{CorsConfig, Settings};

pub use db::{Connector, DocumentStore, MongoConnector};
pub use session::{CookieSigner, SessionStore};

/// Health check endpoint handler
/// Returns a JSON response with server status, timestamp and open sessions
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "sessions": state.sessions.len().await,
    }))
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub sessions: Arc<SessionStore>,
    pub connector: Arc<dyn Connector>,
    pub cookies: CookieSigner,
}

impl AppState {
    pub fn new(config: Settings) -> Self {
        let connector = Arc::new(MongoConnector::from_config(&config.mongo));
        Self::with_connector(config, connector)
    }

    pub fn with_connector(config: Settings, connector: Arc<dyn Connector>) -> Self {
        let sessions = SessionStore::new(config.session.idle_timeout());
        let cookies = CookieSigner::new(&config.session.cookie_secret);

        Self {
            config: Arc::new(config),
            sessions: Arc::new(sessions),
            connector,
            cookies,
        }
    }
}

/// CORS policy: the one configured origin, with credentials so the
/// session cookie is sent cross-site.
pub fn cors(config: &CorsConfig) -> Cors {
    Cors::default()
        .allowed_origin(&config.allowed_origin)
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .supports_credentials()
        .max_age(config.max_age as usize)
}

fn protected(path: &str, route: Route) -> impl HttpServiceFactory {
    web::resource(path)
        .wrap(from_fn(session::require_session))
        .route(route)
}

/// Registers every route. `/connect` and `/health` are reachable without a
/// session; everything else goes through `require_session`. Unknown paths
/// fall through to the default 404.
pub fn configure(cfg: &mut web::ServiceConfig) {
    use admin::handlers;

    cfg.app_data(handlers::form_config())
        .app_data(handlers::json_config())
        .service(web::resource("/health").route(web::get().to(health_check)))
        .service(web::resource("/connect").route(web::post().to(handlers::connect)))
        .service(protected("/disconnect", web::post().to(handlers::disconnect)))
        .service(protected("/show_dbs", web::get().to(handlers::show_dbs)))
        .service(protected("/show_cols/{db}", web::get().to(handlers::show_cols)))
        .service(protected("/fetch_data/{db}/{col}", web::get().to(handlers::fetch_data)))
        .service(protected("/create_db", web::post().to(handlers::create_db)))
        .service(protected("/create_coll", web::post().to(handlers::create_coll)))
        .service(protected("/drop_db/{db}", web::delete().to(handlers::drop_db)))
        .service(protected("/drop_col/{db}/{col}", web::delete().to(handlers::drop_col)))
        .service(protected("/insert_doc", web::post().to(handlers::insert_doc)))
        .service(protected(
            "/delete_doc/{db}/{col}/{id}",
            web::delete().to(handlers::delete_doc),
        ))
        .service(protected(
            "/delete_field/{db}/{col}/{id}/{key}",
            web::delete().to(handlers::delete_field),
        ))
        .service(protected("/update_doc", web::put().to(handlers::update_doc)))
        .service(protected("/filter_docs", web::post().to(handlers::filter_docs)));
}
