//! Trait seams between the lifecycle core and its external collaborators.

pub mod extractor;
pub mod store;
pub mod transport;

pub use extractor::PlanExtractor;
pub use store::{ObligationStore, ReminderStore, SubscriptionStore, TaskStore};
pub use transport::PushTransport;
