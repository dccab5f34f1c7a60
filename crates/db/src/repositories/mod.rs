//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod alert_repo;
pub mod event_repo;
pub mod user_repo;

pub use alert_repo::{AlertPreferenceRepo, ScheduledAlertRepo};
pub use event_repo::RaceEventRepo;
pub use user_repo::{NotificationChannelRepo, UserRepo};
