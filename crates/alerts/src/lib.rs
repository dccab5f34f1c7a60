//! Registration-alert pipeline.
//!
//! Two independently invoked services over the `scheduled_alerts` table:
//!
//! - [`AlertScheduler`] turns a user's lead-time choices into concrete
//!   pending alert rows (synchronous request path).
//! - [`Dispatcher`] claims due rows, fans out to the delivery channels,
//!   and records a terminal status per row (cron / worker path).
//! - [`delivery`] holds the push and email channels behind trait seams so
//!   the dispatcher can be exercised without live providers.

pub mod delivery;
pub mod dispatcher;
pub mod scheduler;

pub use delivery::email::{EmailChannel, EmailConfig, EmailDelivery};
pub use delivery::push::{PushChannel, PushConfig, PushDelivery};
pub use dispatcher::{DispatchReport, DispatchSettings, Dispatcher};
pub use scheduler::{AlertScheduler, ScheduleError, ScheduleOutcome};
