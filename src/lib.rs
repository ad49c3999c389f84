//! Users API library
//!
//! HTTP bindings for the user resource: an ordered route table with per-route
//! middleware, the handlers it dispatches to, and the ambient pieces
//! (configuration, errors, tracing) the server binary wires together.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
