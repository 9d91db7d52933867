//! Client bridge errors.

use std::time::Duration;
use thiserror::Error;

/// Result type for client bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Failures reported to the caller of a bridged call.
///
/// None of these panic; every call resolves to a value or one of these
/// errors, except a call without a deadline whose host never settles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum BridgeError {
	/// The arguments could not be represented as a JSON array.
	#[error("error marshalling arguments: {0}")]
	ArgumentConversion(String),

	/// The payload of a successful envelope did not decode into the requested type.
	#[error("error decoding response: {0}")]
	Decode(String),

	/// The host, or the resolution callback, reported a failure.
	#[error("error calling function: {0}")]
	Host(String),

	/// The call could not be issued.
	#[error("transport error: {0}")]
	Transport(String),

	/// The bridge was constructed against a broken embedding.
	#[error("bridge setup error: {0}")]
	Setup(String),

	/// The resolution callback was released without ever settling.
	#[error("resolution callback released without settling")]
	ResolutionDropped,

	/// The call did not settle before its deadline.
	#[error("call did not settle within {0:?}")]
	DeadlineExceeded(Duration),
}

impl BridgeError {
	/// The host-reported message, if this is a passthrough failure.
	pub fn host_message(&self) -> Option<&str> {
		match self {
			Self::Host(message) => Some(message),
			_ => None,
		}
	}
}
