//! Host side of the bridge: registered functions reachable over HTTP.
//!
//! Functions are registered by name in a [`CallRegistry`]. An [`IpcRouter`]
//! maps `/<base_path>/<name>.callback` onto the registry, decodes the JSON
//! argument array from the request body, and hands it to the
//! [`DynamicInvoker`], which checks arity and argument types before running
//! the target. Every outcome is answered with an envelope.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use hostbridge_host::{CallRegistry, IpcRouter};
//!
//! let registry = Arc::new(CallRegistry::new());
//! registry.register("add", |a: i64, b: i64| a + b).unwrap();
//!
//! let router = IpcRouter::new(registry);
//! let data = router.dispatch("add.callback", b"[2, 3]").unwrap();
//! assert_eq!(data, vec![serde_json::json!(5)]);
//! ```
//!
//! [`IpcServer`] serves a router over HTTP/1.

pub mod error;
pub mod function;
pub mod invoker;
pub mod logging;
pub mod registry;
pub mod router;
pub mod server;
pub mod settings;
pub mod signature;

pub use error::{IpcError, Result};
pub use function::{
	CallOutcome, FromArg, HostFunction, HostReturn, HostValue, IntoHostFunction, Json,
	UNKNOWN_TARGET_ERROR,
};
pub use invoker::DynamicInvoker;
pub use logging::{IpcLogger, LogLevel, LogRecord, MemoryLogger, NoopLogger, TracingLogger};
pub use registry::{CallRegistry, RegisteredFunction};
pub use router::{CALLBACK_SUFFIX, IpcRouter, RouteMatch};
pub use server::IpcServer;
pub use settings::{IpcSettings, StatusPolicy};
pub use signature::{ParamType, Signature};

pub use hostbridge_envelope::Envelope;
