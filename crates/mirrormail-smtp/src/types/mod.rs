//! Core SMTP types.

mod address;
mod envelope;
mod mechanism;
mod reply;

pub use address::Address;
pub use envelope::{Credentials, Envelope};
pub use mechanism::{AuthMechanism, Security};
pub use reply::{Reply, ReplyCode};
