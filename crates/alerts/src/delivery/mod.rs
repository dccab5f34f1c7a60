//! External delivery channels (push, email).
//!
//! Each channel is independent: a failure on one never affects the other,
//! and neither failure aborts the dispatch batch.

pub mod email;
pub mod push;
