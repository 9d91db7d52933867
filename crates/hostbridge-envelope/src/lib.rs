//! Envelope protocol shared by both directions of the host bridge.
//!
//! Every response crossing the boundary is a three-field JSON object:
//!
//! ```json
//! { "data": <any>, "ok": <bool>, "error": <string> }
//! ```
//!
//! A non-empty `error` means the call failed and receivers ignore `data` and
//! `ok`. A successful envelope always carries an empty `error`.
//!
//! ## Example
//!
//! ```
//! use hostbridge_envelope::{Envelope, Expect, decode, encode};
//!
//! let sent = Envelope::success(vec![5]);
//! let bytes = encode(&sent).unwrap();
//! let received: Envelope<Vec<i64>> = decode(&bytes, Expect::Value).unwrap();
//! assert_eq!(received, sent);
//! ```

mod codec;
mod error;

pub use codec::{Expect, decode, decode_value, encode, encode_to_value};
pub use error::{EnvelopeError, Result};

use serde::{Deserialize, Serialize};

/// The `{data, ok, error}` structure exchanged by host and client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
	serialize = "T: Serialize",
	deserialize = "T: Deserialize<'de> + Default"
))]
pub struct Envelope<T> {
	/// Payload of a successful call.
	#[serde(default)]
	pub data: T,
	/// Application-level success flag.
	#[serde(default)]
	pub ok: bool,
	/// Failure message; empty on success.
	#[serde(default)]
	pub error: String,
}

impl<T> Envelope<T> {
	/// Creates a successful envelope carrying `data`.
	pub fn success(data: T) -> Self {
		Self {
			data,
			ok: true,
			error: String::new(),
		}
	}

	/// Returns `true` when the envelope reports a failure.
	pub fn is_error(&self) -> bool {
		!self.error.is_empty()
	}

	/// Returns the failure message, if any.
	pub fn error_message(&self) -> Option<&str> {
		if self.error.is_empty() {
			None
		} else {
			Some(&self.error)
		}
	}

	/// Converts the envelope into its payload, or the failure message.
	///
	/// `error` always wins over `ok`.
	pub fn into_result(self) -> std::result::Result<T, String> {
		if self.error.is_empty() {
			Ok(self.data)
		} else {
			Err(self.error)
		}
	}

	/// Maps the payload, keeping `ok` and `error` untouched.
	pub fn map<U, F>(self, f: F) -> Envelope<U>
	where
		F: FnOnce(T) -> U,
	{
		Envelope {
			data: f(self.data),
			ok: self.ok,
			error: self.error,
		}
	}
}

impl<T: Default> Envelope<T> {
	/// Creates a failed envelope with an empty payload.
	///
	/// An empty message is replaced so the result is still recognised as a failure.
	pub fn failure(message: impl Into<String>) -> Self {
		let mut error = message.into();
		if error.is_empty() {
			error = "unknown error".to_string();
		}
		Self {
			data: T::default(),
			ok: false,
			error,
		}
	}

	/// Creates the placeholder used for calls that produce no values.
	pub fn empty_ok() -> Self {
		Self::success(T::default())
	}
}

impl<T: Default> Default for Envelope<T> {
	fn default() -> Self {
		Self {
			data: T::default(),
			ok: false,
			error: String::new(),
		}
	}
}
