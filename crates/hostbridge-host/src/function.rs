//! Typed adapters between plain Rust functions and the uniform call interface.
//!
//! Registering a closure goes through [`IntoHostFunction`], which records the
//! parameter types and return arity once and produces a [`HostFunction`]. At
//! call time the adapter only converts already type-checked values.
//!
//! ```
//! use hostbridge_host::{HostFunction, IntoHostFunction};
//! use serde_json::json;
//!
//! let add = (|a: i64, b: i64| a + b).into_host_function();
//! assert_eq!(add.signature().arity(), 2);
//!
//! let outcome = add.call(vec![json!(2), json!(3)]).unwrap();
//! assert_eq!(outcome.data, vec![json!(5)]);
//! ```

use hostbridge_envelope::Envelope;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{IpcError, Result};
use crate::signature::{ParamType, Signature, kind_of};

/// Message used when a target fails with an empty error message.
pub const UNKNOWN_TARGET_ERROR: &str = "host function returned an error";

/// Values produced by one invocation, already split into data and error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOutcome {
	/// Return values other than a trailing error, in declaration order.
	pub data: Vec<Value>,
	/// Message of the trailing error, when the target failed.
	pub error: Option<String>,
}

impl CallOutcome {
	/// A successful outcome carrying `data`.
	pub fn values(data: Vec<Value>) -> Self {
		Self { data, error: None }
	}

	/// A failed outcome. An empty message is replaced by
	/// [`UNKNOWN_TARGET_ERROR`].
	pub fn failed(message: impl Into<String>) -> Self {
		let mut message = message.into();
		if message.is_empty() {
			message = UNKNOWN_TARGET_ERROR.to_string();
		}
		Self {
			data: Vec::new(),
			error: Some(message),
		}
	}
}

/// Uniform interface every registered target is stored behind.
pub trait HostFunction: Send + Sync {
	/// Signature captured at registration.
	fn signature(&self) -> &Signature;

	/// Runs the target with arguments already coerced to its signature.
	fn call(&self, args: Vec<Value>) -> Result<CallOutcome>;
}

/// Conversion from a coerced argument into a parameter value.
pub trait FromArg: Sized {
	/// Type the invoker checks the argument against.
	fn param_type() -> ParamType;

	/// Converts the value, returning a description of what was received on failure.
	fn from_arg(value: Value) -> std::result::Result<Self, String>;
}

/// A single return value.
pub trait HostValue {
	/// Serializes the value, returning a description of the failure.
	fn into_value(self) -> std::result::Result<Value, String>;
}

/// Everything a target may return: nothing, one value, several values, or a
/// `Result` whose error is split off from the data.
pub trait HostReturn {
	/// Declared number of return values.
	fn arity() -> usize;

	/// Splits the return into data values and an optional error.
	fn into_outcome(self) -> CallOutcome;
}

/// Wrapper for parameters and return values handled through serde.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
	/// Unwraps the inner value.
	pub fn into_inner(self) -> T {
		self.0
	}
}

macro_rules! impl_from_arg_int {
	($param:expr, $as:ident, $($ty:ty),*) => {
		$(
			impl FromArg for $ty {
				fn param_type() -> ParamType {
					$param
				}

				fn from_arg(value: Value) -> std::result::Result<Self, String> {
					value
						.$as()
						.and_then(|n| <$ty>::try_from(n).ok())
						.ok_or_else(|| format!("{} out of range for {}", value, stringify!($ty)))
				}
			}
		)*
	};
}

impl_from_arg_int!(ParamType::Int, as_i64, i8, i16, i32, i64, isize);
impl_from_arg_int!(ParamType::Uint, as_u64, u8, u16, u32, u64, usize);

impl FromArg for f64 {
	fn param_type() -> ParamType {
		ParamType::Float
	}

	fn from_arg(value: Value) -> std::result::Result<Self, String> {
		value.as_f64().ok_or_else(|| kind_of(&value).to_string())
	}
}

impl FromArg for f32 {
	fn param_type() -> ParamType {
		ParamType::Float
	}

	fn from_arg(value: Value) -> std::result::Result<Self, String> {
		value
			.as_f64()
			.map(|f| f as f32)
			.ok_or_else(|| kind_of(&value).to_string())
	}
}

impl FromArg for bool {
	fn param_type() -> ParamType {
		ParamType::Bool
	}

	fn from_arg(value: Value) -> std::result::Result<Self, String> {
		value.as_bool().ok_or_else(|| kind_of(&value).to_string())
	}
}

impl FromArg for String {
	fn param_type() -> ParamType {
		ParamType::String
	}

	fn from_arg(value: Value) -> std::result::Result<Self, String> {
		match value {
			Value::String(s) => Ok(s),
			other => Err(kind_of(&other).to_string()),
		}
	}
}

impl FromArg for Value {
	fn param_type() -> ParamType {
		ParamType::Any
	}

	fn from_arg(value: Value) -> std::result::Result<Self, String> {
		Ok(value)
	}
}

impl<T: FromArg> FromArg for Vec<T> {
	fn param_type() -> ParamType {
		ParamType::Array
	}

	fn from_arg(value: Value) -> std::result::Result<Self, String> {
		let Value::Array(items) = value else {
			return Err(kind_of(&value).to_string());
		};
		let element = T::param_type();
		items
			.into_iter()
			.map(|item| {
				let coerced = element
					.coerce(item)
					.map_err(|got| format!("array containing {}", kind_of(&got)))?;
				T::from_arg(coerced)
			})
			.collect()
	}
}

impl<T: FromArg> FromArg for Option<T> {
	fn param_type() -> ParamType {
		ParamType::Optional(Box::new(T::param_type()))
	}

	fn from_arg(value: Value) -> std::result::Result<Self, String> {
		match value {
			Value::Null => Ok(None),
			other => T::from_arg(other).map(Some),
		}
	}
}

impl<T: DeserializeOwned> FromArg for Json<T> {
	fn param_type() -> ParamType {
		ParamType::Custom(short_type_name::<T>())
	}

	fn from_arg(value: Value) -> std::result::Result<Self, String> {
		let kind = kind_of(&value);
		serde_json::from_value(value)
			.map(Json)
			.map_err(|e| format!("{} ({})", kind, e))
	}
}

fn short_type_name<T>() -> &'static str {
	let full = std::any::type_name::<T>();
	let base = full.split('<').next().unwrap_or(full);
	base.rsplit("::").next().unwrap_or(base)
}

macro_rules! impl_host_value_serialize {
	($($ty:ty),*) => {
		$(
			impl HostValue for $ty {
				fn into_value(self) -> std::result::Result<Value, String> {
					serde_json::to_value(self).map_err(|e| e.to_string())
				}
			}
		)*
	};
}

impl_host_value_serialize!(
	bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String, &'static str
);

impl HostValue for Value {
	fn into_value(self) -> std::result::Result<Value, String> {
		Ok(self)
	}
}

impl<T: Serialize> HostValue for Vec<T> {
	fn into_value(self) -> std::result::Result<Value, String> {
		serde_json::to_value(self).map_err(|e| e.to_string())
	}
}

impl<T: Serialize> HostValue for Option<T> {
	fn into_value(self) -> std::result::Result<Value, String> {
		serde_json::to_value(self).map_err(|e| e.to_string())
	}
}

impl<T: Serialize> HostValue for Json<T> {
	fn into_value(self) -> std::result::Result<Value, String> {
		serde_json::to_value(self.0).map_err(|e| e.to_string())
	}
}

impl<T: Serialize> HostValue for Envelope<T> {
	fn into_value(self) -> std::result::Result<Value, String> {
		serde_json::to_value(self).map_err(|e| e.to_string())
	}
}

fn serialization_failure(error: String) -> CallOutcome {
	CallOutcome::failed(format!("failed to serialize return value: {}", error))
}

impl HostReturn for () {
	fn arity() -> usize {
		0
	}

	fn into_outcome(self) -> CallOutcome {
		CallOutcome::default()
	}
}

impl<T: HostValue> HostReturn for T {
	fn arity() -> usize {
		1
	}

	fn into_outcome(self) -> CallOutcome {
		match self.into_value() {
			Ok(value) => CallOutcome::values(vec![value]),
			Err(e) => serialization_failure(e),
		}
	}
}

macro_rules! impl_host_return_tuple {
	($count:expr; $($name:ident),+) => {
		impl<$($name: HostValue),+> HostReturn for ($($name,)+) {
			fn arity() -> usize {
				$count
			}

			#[allow(non_snake_case)]
			fn into_outcome(self) -> CallOutcome {
				let ($($name,)+) = self;
				let mut data = Vec::with_capacity($count);
				$(
					match $name.into_value() {
						Ok(value) => data.push(value),
						Err(e) => return serialization_failure(e),
					}
				)+
				CallOutcome::values(data)
			}
		}
	};
}

impl_host_return_tuple!(2; A, B);
impl_host_return_tuple!(3; A, B, C);
impl_host_return_tuple!(4; A, B, C, D);

impl<T: HostReturn, E: Display> HostReturn for std::result::Result<T, E> {
	fn arity() -> usize {
		T::arity() + 1
	}

	fn into_outcome(self) -> CallOutcome {
		match self {
			Ok(value) => value.into_outcome(),
			Err(e) => CallOutcome::failed(e.to_string()),
		}
	}
}

/// Conversion of a Rust closure or function into a [`HostFunction`].
///
/// Implemented for `Fn` items of up to six [`FromArg`] parameters returning
/// any [`HostReturn`].
pub trait IntoHostFunction<Args>: Send + Sync + 'static {
	fn into_host_function(self) -> Arc<dyn HostFunction>;
}

struct TypedFunction<F, Args> {
	f: F,
	signature: Signature,
	_args: PhantomData<fn() -> Args>,
}

macro_rules! impl_into_host_function {
	($($arg:ident),*) => {
		impl<F, R, $($arg,)*> IntoHostFunction<($($arg,)*)> for F
		where
			F: Fn($($arg),*) -> R + Send + Sync + 'static,
			R: HostReturn + 'static,
			$($arg: FromArg + 'static,)*
		{
			fn into_host_function(self) -> Arc<dyn HostFunction> {
				Arc::new(TypedFunction {
					f: self,
					signature: Signature::new(vec![$($arg::param_type()),*], R::arity()),
					_args: PhantomData::<fn() -> ($($arg,)*)>,
				})
			}
		}

		impl<F, R, $($arg,)*> HostFunction for TypedFunction<F, ($($arg,)*)>
		where
			F: Fn($($arg),*) -> R + Send + Sync + 'static,
			R: HostReturn + 'static,
			$($arg: FromArg + 'static,)*
		{
			fn signature(&self) -> &Signature {
				&self.signature
			}

			#[allow(non_snake_case, unused_mut, unused_variables)]
			fn call(&self, args: Vec<Value>) -> Result<CallOutcome> {
				let got = args.len();
				if got != self.signature.arity() {
					return Err(IpcError::ArityMismatch {
						expected: self.signature.arity(),
						got,
					});
				}
				let mut args = args.into_iter().enumerate();
				$(
					let $arg = match args.next() {
						Some((index, value)) => $arg::from_arg(value).map_err(|got| {
							IpcError::TypeMismatch {
								index,
								expected: $arg::param_type().to_string(),
								got,
							}
						})?,
						None => {
							return Err(IpcError::ArityMismatch {
								expected: self.signature.arity(),
								got,
							});
						}
					};
				)*
				Ok((self.f)($($arg),*).into_outcome())
			}
		}
	};
}

impl_into_host_function!();
impl_into_host_function!(A1);
impl_into_host_function!(A1, A2);
impl_into_host_function!(A1, A2, A3);
impl_into_host_function!(A1, A2, A3, A4);
impl_into_host_function!(A1, A2, A3, A4, A5);
impl_into_host_function!(A1, A2, A3, A4, A5, A6);
