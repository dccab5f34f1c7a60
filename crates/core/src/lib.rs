//! Domain types for the registration-alert service.
//!
//! This crate has zero internal dependencies so it can be used by the
//! repository layer, the alert pipeline, and the API crate alike.

pub mod alert;
pub mod error;
pub mod notification;
pub mod types;
