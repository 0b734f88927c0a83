//! # relayhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **JSON API** a dashboard polls: device list, per-device
//!   status snapshots, start and cancel requests
//! - Map HTTP requests into [`RelayService`](relayhub_app::services::relay_service::RelayService) calls
//! - Map domain errors into status codes with a `{"ok": false, "error": …}` body
//!
//! ## Dependency rule
//! Depends on `relayhub-app` (for the port trait and service) and
//! `relayhub-domain` (for request/response types). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
