//! # LifeClaw Notify
//!
//! Push delivery: the dispatcher resolves an owner's subscription, hands the
//! payload to the transport, and self-heals permanently dead destinations by
//! purging their subscription. Transient failures are logged and dropped —
//! the periodic sweep is the retry mechanism.

pub mod dispatcher;
pub mod transport;

pub use dispatcher::{DeliveryStatus, Dispatcher};
pub use transport::HttpPushTransport;
