//! Call registry: the name-to-target table consulted by the router.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{IpcError, Result};
use crate::function::{HostFunction, IntoHostFunction};
use crate::logging::{IpcLogger, LogLevel, LogRecord, default_logger};
use crate::signature::Signature;

/// A target stored under its registration name.
pub struct RegisteredFunction {
	name: String,
	target: Arc<dyn HostFunction>,
}

impl RegisteredFunction {
	/// Registration name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Signature captured at registration.
	pub fn signature(&self) -> &Signature {
		self.target.signature()
	}

	/// The type-erased target.
	pub fn target(&self) -> &dyn HostFunction {
		self.target.as_ref()
	}
}

impl fmt::Debug for RegisteredFunction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RegisteredFunction")
			.field("name", &self.name)
			.field("signature", self.signature())
			.finish()
	}
}

/// Thread-safe mapping from function name to target.
///
/// Lookups take a shared lock and hand out an `Arc`, so in-flight calls never
/// hold the lock while a target runs. Registering an existing name replaces
/// the previous target.
pub struct CallRegistry {
	functions: RwLock<HashMap<String, Arc<RegisteredFunction>>>,
	logger: Arc<dyn IpcLogger>,
}

impl Default for CallRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl CallRegistry {
	/// Creates an empty registry that logs through `tracing`.
	pub fn new() -> Self {
		Self::with_logger(default_logger())
	}

	/// Creates an empty registry that logs through `logger`.
	pub fn with_logger(logger: Arc<dyn IpcLogger>) -> Self {
		Self {
			functions: RwLock::new(HashMap::new()),
			logger,
		}
	}

	/// Registers a Rust function or closure under `name`.
	///
	/// # Example
	///
	/// ```
	/// use hostbridge_host::CallRegistry;
	///
	/// let registry = CallRegistry::new();
	/// registry.register("add", |a: i64, b: i64| a + b).unwrap();
	/// assert!(registry.contains("add"));
	/// ```
	pub fn register<F, Args>(&self, name: impl Into<String>, target: F) -> Result<()>
	where
		F: IntoHostFunction<Args>,
	{
		self.register_function(name, target.into_host_function())
	}

	/// Registers a target that already implements [`HostFunction`].
	pub fn register_function(
		&self,
		name: impl Into<String>,
		target: Arc<dyn HostFunction>,
	) -> Result<()> {
		let name = name.into();
		if name.is_empty() {
			return Err(IpcError::EmptyFunctionName);
		}

		let entry = Arc::new(RegisteredFunction {
			name: name.clone(),
			target,
		});
		let previous = self.functions.write().insert(name.clone(), entry);

		let event = if previous.is_some() {
			"replace callback"
		} else {
			"register callback"
		};
		self.logger
			.log(&LogRecord::new(LogLevel::Debug, "registry", event).with_detail(name));
		Ok(())
	}

	/// Looks up the target registered under `name`.
	pub fn get(&self, name: &str) -> Option<Arc<RegisteredFunction>> {
		self.functions.read().get(name).cloned()
	}

	/// Returns `true` when `name` is registered.
	pub fn contains(&self, name: &str) -> bool {
		self.functions.read().contains_key(name)
	}

	/// Number of registered functions.
	pub fn len(&self) -> usize {
		self.functions.read().len()
	}

	/// Returns `true` when nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.functions.read().is_empty()
	}

	/// Registered names in ascending order.
	pub fn names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.functions.read().keys().cloned().collect();
		names.sort();
		names
	}
}

impl fmt::Debug for CallRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CallRegistry")
			.field("functions", &self.names())
			.finish()
	}
}
