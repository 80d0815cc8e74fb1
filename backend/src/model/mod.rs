// Wire models for outbound subscriber messages.

mod message;

pub use message::GestureMessage;
