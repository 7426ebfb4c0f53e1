//! Domain models for the family network.

mod network;
mod notification;
mod relationship;
mod request;

pub use network::*;
pub use notification::*;
pub use relationship::*;
pub use request::*;
