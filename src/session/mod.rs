//! Session module for the gateway
//!
//! A session binds the signed `sessionid` cookie handed out by `/connect`
//! to the database connection opened for it.

mod cookie;
pub mod middleware;
mod store;

pub use cookie::{CookieSigner, SESSION_COOKIE};
pub use middleware::{require_session, ActiveConnection};
pub use store::{Session, SessionStore};
