//! Request/response messaging between the UI and the background.
//!
//! Both sides share the [`Message`] contracts in [`catalog`]. The background
//! registers one handler per message on a [`Dispatcher`]; the UI calls them
//! through a [`MessageClient`] over any [`Transport`].

pub mod caller;
pub mod catalog;
pub mod dispatcher;
pub mod error;
pub mod message;
#[cfg(unix)]
pub mod socket;
pub mod transport;
pub mod wire;

pub use caller::MessageClient;
pub use dispatcher::{Dispatcher, Envelope};
pub use error::{CallError, DispatchError, RegistrationError, TransportError, WireError};
pub use message::{Message, Request};
pub use transport::{ChannelTransport, Transport};
