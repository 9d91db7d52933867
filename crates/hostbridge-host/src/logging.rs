//! Injected logging for the registry and router.
//!
//! Diagnostics go through an [`IpcLogger`] handed to each component at
//! construction. [`TracingLogger`] is the default and forwards to `tracing`.

use parking_lot::Mutex;
use std::sync::Arc;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
	/// Per-call detail such as successful dispatches.
	Debug,
	/// Lifecycle events such as startup and shutdown.
	Info,
	/// Rejected or failed requests.
	Warning,
	/// Failures of the host itself.
	Error,
}

/// A single diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
	/// Severity.
	pub level: LogLevel,
	/// Component emitting the record, e.g. `"registry"` or `"router"`.
	pub component: &'static str,
	/// Short, stable event name, e.g. `"404"` or `"function registered"`.
	pub event: &'static str,
	/// Free-form context such as a path, a function name or an error message.
	pub detail: Option<String>,
}

impl LogRecord {
	/// Creates a record without detail.
	pub fn new(level: LogLevel, component: &'static str, event: &'static str) -> Self {
		Self {
			level,
			component,
			event,
			detail: None,
		}
	}

	/// Attaches detail to the record.
	pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
		self.detail = Some(detail.into());
		self
	}
}

/// Sink for host-side diagnostics.
pub trait IpcLogger: Send + Sync {
	/// Receives one record. Called from any thread.
	fn log(&self, record: &LogRecord);
}

/// Forwards records to `tracing` under the `hostbridge::ipc` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl IpcLogger for TracingLogger {
	fn log(&self, record: &LogRecord) {
		let detail = record.detail.as_deref().unwrap_or("");
		match record.level {
			LogLevel::Debug => tracing::debug!(
				target: "hostbridge::ipc",
				component = record.component,
				detail,
				"{}",
				record.event
			),
			LogLevel::Info => tracing::info!(
				target: "hostbridge::ipc",
				component = record.component,
				detail,
				"{}",
				record.event
			),
			LogLevel::Warning => tracing::warn!(
				target: "hostbridge::ipc",
				component = record.component,
				detail,
				"{}",
				record.event
			),
			LogLevel::Error => tracing::error!(
				target: "hostbridge::ipc",
				component = record.component,
				detail,
				"{}",
				record.event
			),
		}
	}
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl IpcLogger for NoopLogger {
	fn log(&self, _record: &LogRecord) {}
}

/// Keeps records in memory for later inspection.
#[derive(Debug, Default)]
pub struct MemoryLogger {
	records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
	/// Creates an empty logger.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a snapshot of the collected records.
	pub fn records(&self) -> Vec<LogRecord> {
		self.records.lock().clone()
	}

	/// Returns the event names collected so far, in order.
	pub fn events(&self) -> Vec<&'static str> {
		self.records.lock().iter().map(|r| r.event).collect()
	}

	/// Discards the collected records.
	pub fn clear(&self) {
		self.records.lock().clear();
	}
}

impl IpcLogger for MemoryLogger {
	fn log(&self, record: &LogRecord) {
		self.records.lock().push(record.clone());
	}
}

pub(crate) fn default_logger() -> Arc<dyn IpcLogger> {
	Arc::new(TracingLogger)
}
