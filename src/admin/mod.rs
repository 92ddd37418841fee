//! Administrative routes
//!
//! Each handler validates its parameters, runs one operation on the
//! session's connection and turns the outcome into a response.

pub mod handlers;
pub mod requests;
