//! Blocking wrapper over an asynchronous host call primitive.

use hostbridge_envelope::{Envelope, Expect, decode_value};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{BridgeError, Result};
use crate::options::CallOptions;
use crate::pending::{NO_RETURN_VALUE, PendingCall};
use crate::primitive::HostCallPrimitive;

/// Turns a promise-style host call into a blocking one.
///
/// Each call owns its own [`PendingCall`] and callback; concurrent calls from
/// different threads share nothing but the primitive.
///
/// Without a deadline a call whose host never settles blocks forever.
#[derive(Clone)]
pub struct ClientBridge {
	primitive: Arc<dyn HostCallPrimitive>,
	defaults: CallOptions,
}

impl ClientBridge {
	pub fn new(primitive: Arc<dyn HostCallPrimitive>) -> Self {
		Self {
			primitive,
			defaults: CallOptions::default(),
		}
	}

	/// Options used by [`ClientBridge::call`] and [`ClientBridge::call_typed`].
	pub fn with_options(mut self, defaults: CallOptions) -> Self {
		self.defaults = defaults;
		self
	}

	pub fn options(&self) -> CallOptions {
		self.defaults
	}

	/// Calls `function` and returns its return values in declared order.
	///
	/// `args` must serialize to a JSON array; use a tuple such as `(2, 3)` or
	/// `("KEY",)`. `()` passes no arguments.
	pub fn call<A: Serialize>(&self, function: &str, args: A) -> Result<Vec<Value>> {
		self.call_with(function, args, self.defaults)
	}

	pub fn call_with<A: Serialize>(&self, function: &str, args: A, options: CallOptions) -> Result<Vec<Value>> {
		let envelope = self.call_raw(function, args, options)?;
		let data = envelope.into_result().map_err(BridgeError::Host)?;
		Ok(into_values(data))
	}

	/// Calls a function returning a single value and decodes it as `T`.
	///
	/// A call with no return value decodes `T` from `null`, so `()` and
	/// `Option<_>` work for functions that return nothing.
	pub fn call_typed<T, A>(&self, function: &str, args: A) -> Result<T>
	where
		T: DeserializeOwned,
		A: Serialize,
	{
		let value = self.call(function, args)?.into_iter().next().unwrap_or(Value::Null);
		serde_json::from_value(value).map_err(|e| BridgeError::Decode(e.to_string()))
	}

	/// Calls a host function that itself answers with an [`Envelope`].
	///
	/// The inner envelope is returned as is, so its `ok` flag stays visible
	/// and its `error` is left for the caller to inspect.
	pub fn call_envelope<T, A>(&self, function: &str, args: A, options: CallOptions) -> Result<Envelope<T>>
	where
		T: DeserializeOwned + Default,
		A: Serialize,
	{
		let mut values = self.call_with(function, args, options)?.into_iter();
		match values.next() {
			None if options.requires_return => Ok(Envelope::failure(NO_RETURN_VALUE)),
			None => Ok(Envelope::empty_ok()),
			Some(first) => decode_value(first, Expect::Value).map_err(|e| BridgeError::Decode(e.to_string())),
		}
	}

	/// Issues the call and waits for the envelope the callback settled with.
	pub fn call_raw<A: Serialize>(&self, function: &str, args: A, options: CallOptions) -> Result<Envelope<Value>> {
		let args = to_arguments(args)?;
		let (pending, callback) = PendingCall::new(options.requires_return);

		tracing::debug!(target: "hostbridge::client", function, argc = args.len(), "bridged call");
		self.primitive.invoke(function, args, callback)?;

		let envelope = pending.wait(options.deadline)?;
		if let Some(error) = envelope.error_message() {
			tracing::debug!(target: "hostbridge::client", function, error, "bridged call failed");
		}
		Ok(envelope)
	}
}

impl std::fmt::Debug for ClientBridge {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ClientBridge")
			.field("defaults", &self.defaults)
			.finish_non_exhaustive()
	}
}

/// Converts call arguments into the positional wire form.
pub fn to_arguments<A: Serialize>(args: A) -> Result<Vec<Value>> {
	match serde_json::to_value(args) {
		Ok(Value::Array(values)) => Ok(values),
		Ok(Value::Null) => Ok(Vec::new()),
		Ok(other) => Err(BridgeError::ArgumentConversion(format!(
			"arguments must be a sequence, got {}",
			hostbridge_host::signature::kind_of(&other)
		))),
		Err(e) => Err(BridgeError::ArgumentConversion(e.to_string())),
	}
}

fn into_values(data: Value) -> Vec<Value> {
	match data {
		Value::Array(values) => values,
		Value::Null => Vec::new(),
		other => vec![other],
	}
}
