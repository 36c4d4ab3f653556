mod client;
pub mod messages;

pub use client::{DisabledNotifier, PushoverNotifier};
pub use messages::{MessageFormatter, Notification};
