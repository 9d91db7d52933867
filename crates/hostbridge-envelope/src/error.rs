//! Envelope codec errors.

use thiserror::Error;

/// Result type for envelope encoding and decoding.
pub type Result<T> = std::result::Result<T, EnvelopeError>;

/// Errors raised while encoding or decoding an envelope.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EnvelopeError {
	/// Malformed JSON or a payload that does not match the expected shape.
	#[error("invalid envelope: {0}")]
	Json(#[from] serde_json::Error),

	/// The decoded value is not a JSON object.
	#[error("envelope is not an object")]
	NotAnObject,

	/// None of `data`, `ok` or `error` were present and a value was expected.
	#[error("envelope has no data, ok or error field")]
	MissingFields,
}
