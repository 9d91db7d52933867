//! Parameter types and argument coercion.
//!
//! A [`Signature`] is captured once, when a function is registered. At call
//! time each decoded argument is checked against its [`ParamType`] and, where
//! the representations are compatible, rewritten into the canonical form the
//! typed adapter expects.

use serde_json::{Number, Value};
use std::fmt;

/// Declared type of a single positional parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
	/// JSON `true` or `false`.
	Bool,
	/// Signed integer.
	Int,
	/// Unsigned integer.
	Uint,
	/// Any JSON number.
	Float,
	/// JSON string.
	String,
	/// JSON array; elements are checked by the typed adapter.
	Array,
	/// JSON object.
	Object,
	/// `null` or the inner type.
	Optional(Box<ParamType>),
	/// A user type decoded with serde; the name is only used in messages.
	Custom(&'static str),
	/// Any JSON value, passed through unchanged.
	Any,
}

impl fmt::Display for ParamType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Bool => f.write_str("bool"),
			Self::Int => f.write_str("int"),
			Self::Uint => f.write_str("uint"),
			Self::Float => f.write_str("float"),
			Self::String => f.write_str("string"),
			Self::Array => f.write_str("array"),
			Self::Object => f.write_str("object"),
			Self::Optional(inner) => write!(f, "optional {}", inner),
			Self::Custom(name) => f.write_str(name),
			Self::Any => f.write_str("any"),
		}
	}
}

impl ParamType {
	/// Checks `value` against this type and converts it to the canonical form.
	///
	/// On failure the original value is handed back so the caller can report
	/// its kind.
	pub fn coerce(&self, value: Value) -> Result<Value, Value> {
		match (self, value) {
			(Self::Any | Self::Custom(_), value) => Ok(value),
			(Self::Optional(_), Value::Null) => Ok(Value::Null),
			(Self::Optional(inner), value) => inner.coerce(value),
			(Self::Bool, value @ Value::Bool(_)) => Ok(value),
			(Self::String, value @ Value::String(_)) => Ok(value),
			(Self::Array, value @ Value::Array(_)) => Ok(value),
			(Self::Object, value @ Value::Object(_)) => Ok(value),
			(Self::Int, Value::Number(n)) => integral_i64(&n)
				.map(Value::from)
				.ok_or(Value::Number(n)),
			(Self::Uint, Value::Number(n)) => integral_u64(&n)
				.map(Value::from)
				.ok_or(Value::Number(n)),
			(Self::Float, Value::Number(n)) => match n.as_f64().and_then(Number::from_f64) {
				Some(float) => Ok(Value::Number(float)),
				None => Err(Value::Number(n)),
			},
			(_, value) => Err(value),
		}
	}

	/// Returns `true` for integer types, including an optional integer.
	pub fn is_integer(&self) -> bool {
		match self {
			Self::Int | Self::Uint => true,
			Self::Optional(inner) => inner.is_integer(),
			_ => false,
		}
	}
}

fn integral_i64(n: &Number) -> Option<i64> {
	if let Some(i) = n.as_i64() {
		return Some(i);
	}
	if n.is_u64() {
		return None;
	}
	let f = n.as_f64()?;
	if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
		Some(f as i64)
	} else {
		None
	}
}

fn integral_u64(n: &Number) -> Option<u64> {
	if let Some(u) = n.as_u64() {
		return Some(u);
	}
	if n.is_i64() {
		return None;
	}
	let f = n.as_f64()?;
	if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 {
		Some(f as u64)
	} else {
		None
	}
}

/// Returns `true` when `value` is a whole number, whatever its range.
pub fn is_whole_number(value: &Value) -> bool {
	match value {
		Value::Number(n) if n.is_f64() => n.as_f64().is_some_and(|f| f.fract() == 0.0),
		Value::Number(_) => true,
		_ => false,
	}
}

/// Describes the kind of a decoded value for error messages.
pub fn kind_of(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "bool",
		Value::Number(n) if n.is_f64() => "float",
		Value::Number(_) => "int",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

/// Parameter types and return arity of a registered function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
	params: Vec<ParamType>,
	returns: usize,
}

impl Signature {
	/// Creates a signature from parameter types and the return arity.
	pub fn new(params: Vec<ParamType>, returns: usize) -> Self {
		Self { params, returns }
	}

	/// Declared parameter types in positional order.
	pub fn params(&self) -> &[ParamType] {
		&self.params
	}

	/// Number of declared parameters.
	pub fn arity(&self) -> usize {
		self.params.len()
	}

	/// Number of declared return values, including a trailing error.
	pub fn returns(&self) -> usize {
		self.returns
	}

	/// Returns `true` when at least one parameter is declared.
	pub fn takes_arguments(&self) -> bool {
		!self.params.is_empty()
	}
}
