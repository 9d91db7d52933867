//! Host-side error types.
//!
//! Every variant except [`IpcError::Io`] and [`IpcError::EmptyFunctionName`]
//! is produced while answering a single request and is reported to the caller
//! through the envelope `error` field; none of them affect other requests.

use thiserror::Error;

/// Result type for host operations.
pub type Result<T> = std::result::Result<T, IpcError>;

/// Errors raised by the registry, router, invoker and server.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IpcError {
	/// Registration was attempted with an empty name.
	#[error("function name must not be empty")]
	EmptyFunctionName,

	/// The request path carries no function-name segment.
	#[error("no function name specified")]
	MissingFunctionName,

	/// The function-name segment lacks the `.callback` suffix.
	#[error("invalid function name")]
	InvalidFunctionName(String),

	/// No function is registered under the requested name.
	#[error("callback not found")]
	FunctionNotFound(String),

	/// The target takes parameters but the request has no body.
	#[error("no args specified")]
	MissingArguments(String),

	/// The request body is not valid JSON.
	#[error("{0}")]
	DecodeError(String),

	/// The request body decoded to something other than a JSON array.
	#[error("args is not an array")]
	ArgumentsNotArray,

	/// Argument count differs from the declared parameter count.
	#[error("wrong number of args: expected {expected}, got {got}")]
	ArityMismatch {
		/// Declared parameter count.
		expected: usize,
		/// Number of arguments received.
		got: usize,
	},

	/// An argument is neither of the declared type nor coercible to it.
	#[error("wrong type for arg {index}: expected {expected}, got {got}")]
	TypeMismatch {
		/// Zero-based argument position.
		index: usize,
		/// Declared parameter type.
		expected: String,
		/// Observed argument kind.
		got: String,
	},

	/// An integer argument does not fit the declared integer type.
	#[error("arg {index} out of range for {expected}: {value}")]
	ArgumentOutOfRange {
		/// Zero-based argument position.
		index: usize,
		/// Declared parameter type.
		expected: String,
		/// The rejected number as sent.
		value: String,
	},

	/// The request body exceeds the configured limit.
	#[error("request body exceeds {limit} bytes")]
	BodyTooLarge {
		/// Configured limit in bytes.
		limit: usize,
	},

	/// The request body could not be read, e.g. the peer hung up mid-upload.
	#[error("error reading request body: {0}")]
	BodyRead(String),

	/// The target returned an error value.
	#[error("{0}")]
	Target(String),

	/// The target panicked while running.
	#[error("host function panicked: {0}")]
	TargetPanicked(String),

	/// Settings failed validation.
	#[error("invalid settings: {0}")]
	InvalidSettings(String),

	/// IO error while serving.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

impl IpcError {
	/// Returns `true` for errors produced by the target itself rather than
	/// by routing, decoding or type checking.
	pub fn is_target_error(&self) -> bool {
		matches!(self, Self::Target(_) | Self::TargetPanicked(_))
	}
}
