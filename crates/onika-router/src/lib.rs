//! Onika's routing core.
//!
//! - [`budget::BudgetTracker`] — daily spend gate for paid layers
//! - [`router::Router`] — tries layers in order with retries and backoff
//! - [`status::StatusReporter`] — read-only snapshot of layers and budget
//! - [`rollover::BudgetRollover`] — resets the tracker at the daily boundary

pub mod budget;
pub mod rollover;
pub mod router;
pub mod status;

pub use budget::BudgetTracker;
pub use rollover::BudgetRollover;
pub use router::{RouteOutcome, Router};
pub use status::{LayerStatus, StatusReporter, StatusView};
