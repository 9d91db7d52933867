//! Type-checked invocation of registered functions.

use serde_json::Value;

use crate::error::{IpcError, Result};
use crate::function::HostFunction;
use crate::signature::{ParamType, is_whole_number, kind_of};

/// Checks decoded arguments against a target's signature, coerces them and
/// runs the target.
///
/// The invoker is stateless; any number of requests may use it at once.
#[derive(Debug, Default, Clone, Copy)]
pub struct DynamicInvoker;

impl DynamicInvoker {
	/// Creates an invoker.
	pub fn new() -> Self {
		Self
	}

	/// Invokes `target` with `args`, returning its data values.
	///
	/// Arity and every argument type are verified before the target runs, so
	/// a rejected call has no side effects. A trailing error returned by the
	/// target becomes [`IpcError::Target`].
	pub fn invoke(&self, target: &dyn HostFunction, args: Vec<Value>) -> Result<Vec<Value>> {
		let coerced = self.coerce_arguments(target, args)?;
		let outcome = target.call(coerced)?;
		match outcome.error {
			Some(message) => Err(IpcError::Target(message)),
			None => Ok(outcome.data),
		}
	}

	/// Validates and coerces `args` without running the target.
	pub fn coerce_arguments(&self, target: &dyn HostFunction, args: Vec<Value>) -> Result<Vec<Value>> {
		let params = target.signature().params();
		if args.len() != params.len() {
			return Err(IpcError::ArityMismatch {
				expected: params.len(),
				got: args.len(),
			});
		}

		params
			.iter()
			.zip(args)
			.enumerate()
			.map(|(index, (param, arg))| {
				param
					.coerce(arg)
					.map_err(|rejected| rejection(index, param, &rejected))
			})
			.collect()
	}
}

fn rejection(index: usize, param: &ParamType, rejected: &Value) -> IpcError {
	if param.is_integer() && is_whole_number(rejected) {
		return IpcError::ArgumentOutOfRange {
			index,
			expected: param.to_string(),
			value: rejected.to_string(),
		};
	}
	IpcError::TypeMismatch {
		index,
		expected: param.to_string(),
		got: kind_of(rejected).to_string(),
	}
}
