use std::future::{ready, Ready};
use std::sync::Arc;
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use tracing::warn;
use uuid::Uuid;
use crate::db::DocumentStore;
use crate::error::AppError;
use crate::session::cookie::SESSION_COOKIE;
use crate::AppState;

/// The connection resolved from the request's session cookie.
#[derive(Clone)]
pub struct ActiveConnection {
    pub session_id: Uuid,
    pub store: Arc<dyn DocumentStore>,
}

impl FromRequest for ActiveConnection {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<ActiveConnection>()
                .cloned()
                .ok_or(AppError::MissingSession),
        )
    }
}

async fn resolve(req: &ServiceRequest) -> Result<ActiveConnection, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("application state is not configured".into()))?;

    let cookie = req.cookie(SESSION_COOKIE).ok_or(AppError::MissingSession)?;
    let value = state.cookies.verify(cookie).ok_or_else(|| {
        warn!("Rejected session cookie with an invalid signature");
        AppError::MissingSession
    })?;

    let session_id = Uuid::parse_str(&value).map_err(|_| AppError::UnknownSession)?;
    let store = state.sessions.get(&session_id).await.ok_or_else(|| {
        warn!("Request for unknown session {}", session_id);
        AppError::UnknownSession
    })?;

    Ok(ActiveConnection { session_id, store })
}

/// Rejects requests that do not carry a live session.
///
/// Errors are rendered here rather than propagated so that outer
/// middleware (CORS) still decorates the response.
pub async fn require_session<B: MessageBody + 'static>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    match resolve(&req).await {
        Ok(connection) => {
            req.extensions_mut().insert(connection);
            next.call(req).await.map(ServiceResponse::map_into_left_body)
        }
        Err(e) => {
            let (req, _) = req.into_parts();
            let response = actix_web::ResponseError::error_response(&e);
            Ok(ServiceResponse::new(req, response).map_into_right_body())
        }
    }
}
