//! Background-side use cases.
//!
//! Each interactor wraps one business operation and returns a tagged
//! `Result`; none of them panics or leaks a rich error to its caller.

mod client_id;
mod clear_token;
mod connect;
mod get_token;
mod set_token;
mod validate_token;

#[cfg(test)]
pub(crate) mod testing;

pub use clear_token::ClearTokenInteractor;
pub use client_id::ClientIdInteractor;
pub use connect::{ConnectInteractor, ConnectResponse};
pub use get_token::GetTokenInteractor;
pub use set_token::SetTokenInteractor;
pub use validate_token::ValidateTokenInteractor;
