//! In-process notification hub.
//!
//! Tracks the sessions of every connected client and fans messages out to
//! all of them, to one user, or to a set of users. Delivery is best-effort and
//! never blocks the producer: a session whose outbound buffer is full is
//! disconnected instead of being waited on.

mod message;
mod registry;
mod session;

pub use message::{DeliveryReport, EncodedMessage};
pub use registry::{Hub, HubStats};
pub use session::{EnqueueError, Session, SessionId, UserId};
