//! JSON codec for [`Envelope`].

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Envelope;
use crate::error::{EnvelopeError, Result};

const FIELDS: [&str; 3] = ["data", "ok", "error"];

/// What the receiver expects from a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
	/// The call produces values; a structurally empty envelope is an error.
	Value,
	/// The call produces nothing; an empty body or `{}` is a valid success.
	Nothing,
}

/// Encodes an envelope into its JSON wire bytes.
pub fn encode<T: Serialize>(envelope: &Envelope<T>) -> Result<Vec<u8>> {
	Ok(serde_json::to_vec(envelope)?)
}

/// Encodes an envelope into a JSON value.
pub fn encode_to_value<T: Serialize>(envelope: &Envelope<T>) -> Result<Value> {
	Ok(serde_json::to_value(envelope)?)
}

/// Decodes an envelope from wire bytes.
pub fn decode<T>(bytes: &[u8], expect: Expect) -> Result<Envelope<T>>
where
	T: DeserializeOwned + Default,
{
	if bytes.iter().all(u8::is_ascii_whitespace) {
		return match expect {
			Expect::Nothing => Ok(Envelope::empty_ok()),
			Expect::Value => Err(EnvelopeError::MissingFields),
		};
	}
	let value: Value = serde_json::from_slice(bytes)?;
	decode_value(value, expect)
}

/// Decodes an envelope from an already parsed JSON value.
pub fn decode_value<T>(value: Value, expect: Expect) -> Result<Envelope<T>>
where
	T: DeserializeOwned + Default,
{
	let Value::Object(map) = &value else {
		return Err(EnvelopeError::NotAnObject);
	};
	if !FIELDS.iter().any(|field| map.contains_key(*field)) {
		return match expect {
			Expect::Nothing => Ok(Envelope::empty_ok()),
			Expect::Value => Err(EnvelopeError::MissingFields),
		};
	}
	Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_success_round_trip() {
		// Arrange
		let sent = Envelope::success(vec![json!(5), json!("five")]);

		// Act
		let bytes = encode(&sent).unwrap();
		let received: Envelope<Vec<Value>> = decode(&bytes, Expect::Value).unwrap();

		// Assert
		assert_eq!(received, sent);
	}

	#[rstest]
	fn test_error_round_trip() {
		// Arrange
		let sent: Envelope<Vec<Value>> = Envelope::failure("callback not found");

		// Act
		let bytes = encode(&sent).unwrap();
		let received: Envelope<Vec<Value>> = decode(&bytes, Expect::Value).unwrap();

		// Assert
		assert_eq!(received, sent);
	}

	#[rstest]
	fn test_wire_shape_has_three_fields() {
		// Act
		let value = encode_to_value(&Envelope::success(json!([5]))).unwrap();

		// Assert
		assert_eq!(value, json!({"data": [5], "ok": true, "error": ""}));
	}

	#[rstest]
	fn test_error_only_object_decodes() {
		// Act
		let envelope: Envelope<Vec<Value>> =
			decode(br#"{"error":"no args specified"}"#, Expect::Value).unwrap();

		// Assert
		assert!(!envelope.ok);
		assert!(envelope.data.is_empty());
		assert_eq!(envelope.error, "no args specified");
	}

	#[rstest]
	#[case::empty_body(b"".as_slice())]
	#[case::whitespace(b"  \n".as_slice())]
	#[case::empty_object(b"{}".as_slice())]
	fn test_empty_is_placeholder_when_nothing_expected(#[case] body: &[u8]) {
		// Act
		let envelope: Envelope<Vec<Value>> = decode(body, Expect::Nothing).unwrap();

		// Assert
		assert!(envelope.ok);
		assert!(envelope.data.is_empty());
		assert!(!envelope.is_error());
	}

	#[rstest]
	#[case::empty_body(b"".as_slice())]
	#[case::empty_object(b"{}".as_slice())]
	fn test_empty_is_rejected_when_value_expected(#[case] body: &[u8]) {
		// Act
		let result: Result<Envelope<Vec<Value>>> = decode(body, Expect::Value);

		// Assert
		assert!(matches!(result, Err(EnvelopeError::MissingFields)));
	}

	#[rstest]
	fn test_non_object_is_rejected() {
		// Act
		let result: Result<Envelope<Value>> = decode(b"[1,2]", Expect::Nothing);

		// Assert
		assert!(matches!(result, Err(EnvelopeError::NotAnObject)));
	}

	#[rstest]
	fn test_malformed_json_is_rejected() {
		// Act
		let result: Result<Envelope<Value>> = decode(b"{\"data\":", Expect::Value);

		// Assert
		assert!(matches!(result, Err(EnvelopeError::Json(_))));
	}

	#[rstest]
	fn test_payload_shape_mismatch_is_rejected() {
		// Act
		let result: Result<Envelope<Vec<i64>>> =
			decode(br#"{"data":"text","ok":true}"#, Expect::Value);

		// Assert
		assert!(matches!(result, Err(EnvelopeError::Json(_))));
	}

	proptest! {
		#[test]
		fn prop_round_trip_preserves_fields(data in proptest::collection::vec(any::<i64>(), 0..8), message in "[a-z ]{1,24}") {
			let ok = Envelope::success(data.clone());
			let bytes = encode(&ok).unwrap();
			prop_assert_eq!(decode::<Vec<i64>>(&bytes, Expect::Value).unwrap(), ok);

			let failed: Envelope<Vec<i64>> = Envelope::failure(message);
			let bytes = encode(&failed).unwrap();
			prop_assert_eq!(decode::<Vec<i64>>(&bytes, Expect::Value).unwrap(), failed);
		}
	}
}
