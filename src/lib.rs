//! An inventory item manager with a REST API.
//!
//! - [`domain`] holds the item service, its repository contract and mapping.
//! - [`api`] exposes the service over HTTP.
//! - [`infra`] covers configuration, persistence, errors, logging and middleware.
//! - [`app`] wires everything into an axum application.

pub mod api;
pub mod app;
pub mod domain;
pub mod infra;
