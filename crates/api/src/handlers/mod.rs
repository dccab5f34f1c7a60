//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource.
//! Handlers delegate to the repositories in `startline_db` or the services
//! in `startline_alerts` and map errors via [`crate::error::AppError`].

pub mod alerts;
pub mod auth;
pub mod channels;
pub mod dispatch;
pub mod events;
