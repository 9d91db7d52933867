//! Asynchronous call primitives the bridge sits on.

use hostbridge_envelope::{Envelope, encode_to_value};
use hostbridge_host::{CALLBACK_SUFFIX, IpcRouter};
use serde_json::Value;
use std::thread;

use crate::callback::ResolutionCallback;
use crate::error::{BridgeError, Result};

/// Starts a host call and settles `callback` when it completes.
///
/// `invoke` must return without waiting for the result. The callback is
/// settled at most once from any thread; dropping it unsettled tells the
/// waiting caller that no result will come.
pub trait HostCallPrimitive: Send + Sync {
	fn invoke(&self, function: &str, args: Vec<Value>, callback: ResolutionCallback) -> Result<()>;
}

/// Calls an in-process [`IpcRouter`] from a fresh thread.
///
/// The callback receives the router's response envelope as its only value,
/// exactly as a script engine would after `fetch`. A panicking target settles
/// the call with the same failure envelope the HTTP router sends.
#[derive(Clone)]
pub struct LocalCallPrimitive {
	router: IpcRouter,
}

impl LocalCallPrimitive {
	/// Creates a primitive that dispatches straight into `router`.
	pub fn new(router: IpcRouter) -> Self {
		Self { router }
	}
}

impl HostCallPrimitive for LocalCallPrimitive {
	fn invoke(&self, function: &str, args: Vec<Value>, callback: ResolutionCallback) -> Result<()> {
		let body = serde_json::to_vec(&args).map_err(|e| BridgeError::ArgumentConversion(e.to_string()))?;
		let segment = format!("{}{}", function, CALLBACK_SUFFIX);
		let router = self.router.clone();

		thread::Builder::new()
			.name(format!("hostbridge-call-{}", function))
			.spawn(move || {
				let envelope = match router.dispatch_isolated(&segment, &body) {
					Ok(data) => Envelope::success(data),
					Err(e) => Envelope::failure(e.to_string()),
				};
				match encode_to_value(&envelope) {
					Ok(value) => callback.settle(vec![value]),
					Err(e) => {
						tracing::warn!(target: "hostbridge::client", error = %e, "failed to encode local response");
					}
				}
			})
			.map(|_| ())
			.map_err(|e| BridgeError::Transport(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::pending::PendingCall;
	use hostbridge_host::CallRegistry;
	use rstest::rstest;
	use serde_json::json;
	use std::sync::Arc;

	#[rstest]
	fn test_local_primitive_settles_with_router_envelope() {
		// Arrange
		let registry = Arc::new(CallRegistry::new());
		registry.register("add", |a: i64, b: i64| a + b).unwrap();
		let primitive = LocalCallPrimitive::new(IpcRouter::new(registry));
		let (pending, callback) = PendingCall::new(true);

		// Act
		primitive.invoke("add", vec![json!(2), json!(3)], callback).unwrap();
		let envelope = pending.wait(None).unwrap();

		// Assert
		assert_eq!(envelope, Envelope::success(json!([5])));
	}

	#[rstest]
	fn test_local_primitive_reports_routing_errors() {
		// Arrange
		let primitive = LocalCallPrimitive::new(IpcRouter::new(Arc::new(CallRegistry::new())));
		let (pending, callback) = PendingCall::new(true);

		// Act
		primitive.invoke("ghost", Vec::new(), callback).unwrap();
		let envelope = pending.wait(None).unwrap();

		// Assert
		assert_eq!(envelope.error, "callback not found");
	}

	#[rstest]
	fn test_local_primitive_reports_panicking_target() {
		// Arrange
		let registry = Arc::new(CallRegistry::new());
		registry
			.register("explode", || -> i32 { panic!("boom") })
			.unwrap();
		let primitive = LocalCallPrimitive::new(IpcRouter::new(registry));
		let (pending, callback) = PendingCall::new(true);

		// Act
		primitive.invoke("explode", Vec::new(), callback).unwrap();
		let envelope = pending.wait(None).unwrap();

		// Assert
		assert!(!envelope.ok);
		assert_eq!(envelope.error, "host function panicked: boom");
	}
}
