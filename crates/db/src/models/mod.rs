//! Entity models (`FromRow` structs) and handler input types.

pub mod alert;
pub mod event;
pub mod user;
