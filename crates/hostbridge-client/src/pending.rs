//! Single-slot bookkeeping for one in-flight call.

use hostbridge_envelope::{Envelope, Expect, decode_value};
use serde_json::Value;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::time::Duration;

use crate::callback::ResolutionCallback;
use crate::error::{BridgeError, Result};

/// Error written when a call that needs a value settles with none.
pub const NO_RETURN_VALUE: &str = "no arguments passed to callback";

/// The waiting half of one bridged call.
///
/// Created together with the [`ResolutionCallback`] that fills it. The slot
/// holds exactly one envelope, the callback can write at most once, and
/// [`PendingCall::wait`] consumes the pending call, so the slot is read once
/// and closed right after.
#[derive(Debug)]
pub struct PendingCall {
	slot: Receiver<Envelope<Value>>,
}

impl PendingCall {
	/// Allocates the slot and the callback bound to it.
	pub fn new(requires_return: bool) -> (Self, ResolutionCallback) {
		let (tx, rx) = mpsc::sync_channel(1);
		let callback = ResolutionCallback::new(move |values| {
			write_once(tx, resolve(values, requires_return));
		});
		(Self { slot: rx }, callback)
	}

	/// Blocks until the callback settles, or until `deadline` passes.
	pub fn wait(self, deadline: Option<Duration>) -> Result<Envelope<Value>> {
		match deadline {
			None => self.slot.recv().map_err(|_| BridgeError::ResolutionDropped),
			Some(limit) => self.slot.recv_timeout(limit).map_err(|e| match e {
				RecvTimeoutError::Timeout => BridgeError::DeadlineExceeded(limit),
				RecvTimeoutError::Disconnected => BridgeError::ResolutionDropped,
			}),
		}
	}
}

fn write_once(tx: SyncSender<Envelope<Value>>, envelope: Envelope<Value>) {
	// The sender is consumed here and the slot has room for one value, so the
	// only possible failure is a caller that already gave up waiting.
	if tx.try_send(envelope).is_err() {
		tracing::debug!(target: "hostbridge::client", "call settled after its caller stopped waiting");
	}
}

/// Turns the values a call settled with into the envelope the caller reads.
///
/// - no values: a failure if a value was required, otherwise an empty success
/// - one or more values: the first is decoded as an envelope; a decode failure
///   becomes a failed envelope carrying the decode error
pub fn resolve(values: Vec<Value>, requires_return: bool) -> Envelope<Value> {
	let expect = if requires_return {
		Expect::Value
	} else {
		Expect::Nothing
	};
	match values.into_iter().next() {
		None if requires_return => Envelope::failure(NO_RETURN_VALUE),
		None => Envelope::empty_ok(),
		Some(first) => decode_value(first, expect).unwrap_or_else(|e| Envelope::failure(e.to_string())),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use std::thread;

	#[rstest]
	fn test_no_values_required() {
		// Act
		let envelope = resolve(Vec::new(), true);

		// Assert
		assert_eq!(envelope.error, NO_RETURN_VALUE);
		assert!(!envelope.ok);
	}

	#[rstest]
	fn test_no_values_not_required() {
		// Act
		let envelope = resolve(Vec::new(), false);

		// Assert
		assert!(envelope.ok);
		assert!(!envelope.is_error());
		assert_eq!(envelope.data, Value::Null);
	}

	#[rstest]
	#[case(true)]
	#[case(false)]
	fn test_first_value_is_decoded_verbatim(#[case] requires_return: bool) {
		// Arrange
		let values = vec![
			json!({"data": "v", "ok": true, "error": ""}),
			json!({"data": "ignored", "ok": false, "error": "ignored"}),
		];

		// Act
		let envelope = resolve(values, requires_return);

		// Assert
		assert_eq!(envelope, Envelope::success(json!("v")));
	}

	#[rstest]
	fn test_undecodable_value_becomes_failure() {
		// Act
		let envelope = resolve(vec![json!(42)], true);

		// Assert
		assert!(envelope.is_error());
		assert_eq!(envelope.error, "envelope is not an object");
	}

	#[rstest]
	fn test_empty_object_depends_on_expectation() {
		// Act
		let lenient = resolve(vec![json!({})], false);
		let strict = resolve(vec![json!({})], true);

		// Assert
		assert!(lenient.ok);
		assert!(strict.is_error());
	}

	#[rstest]
	fn test_wait_receives_value_from_other_thread() {
		// Arrange
		let (pending, callback) = PendingCall::new(true);

		// Act
		thread::spawn(move || callback.settle(vec![json!({"data": [5], "ok": true})]));
		let envelope = pending.wait(None).unwrap();

		// Assert
		assert_eq!(envelope.data, json!([5]));
	}

	#[rstest]
	fn test_dropped_callback_wakes_caller() {
		// Arrange
		let (pending, callback) = PendingCall::new(false);

		// Act
		drop(callback);

		// Assert
		assert_eq!(pending.wait(None), Err(BridgeError::ResolutionDropped));
	}

	#[rstest]
	fn test_deadline() {
		// Arrange
		let (pending, _callback) = PendingCall::new(false);

		// Act
		let result = pending.wait(Some(Duration::from_millis(20)));

		// Assert
		assert_eq!(result, Err(BridgeError::DeadlineExceeded(Duration::from_millis(20))));
	}

	#[rstest]
	fn test_late_settle_after_deadline_is_harmless() {
		// Arrange
		let (pending, callback) = PendingCall::new(false);
		let _ = pending.wait(Some(Duration::from_millis(1)));

		// Act & Assert: must not panic
		callback.settle(vec![json!({"ok": true})]);
	}
}
