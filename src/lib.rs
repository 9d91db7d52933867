//! # hostbridge
//!
//! Call bridge between a privileged host process and a sandboxed script
//! engine.
//!
//! The host registers named Rust functions and serves them at
//! `/<base_path>/<name>.callback`. The script side calls them through a
//! blocking [`ClientBridge`](client::ClientBridge) that waits on a one-shot
//! slot filled by the call's resolution callback. Both directions speak the
//! same `{data, ok, error}` [`Envelope`].
//!
//! ## Feature Flags
//!
//! - `host` - call registry, dynamic invoker, router and HTTP server
//! - `client` - blocking client bridge and call primitives
//! - `env` - environment-variable and file collaborators
//! - `full` (default) - everything above
//!
//! ## Quick Example
//!
//! ```
//! use std::sync::Arc;
//! use hostbridge::prelude::*;
//!
//! let registry = Arc::new(CallRegistry::new());
//! registry.register("add", |a: i64, b: i64| a + b).unwrap();
//! registry.register("noop", || ()).unwrap();
//!
//! let primitive = LocalCallPrimitive::new(IpcRouter::new(registry));
//! let bridge = ClientBridge::new(Arc::new(primitive));
//!
//! assert_eq!(bridge.call("add", (2, 3)).unwrap(), vec![serde_json::json!(5)]);
//! assert!(bridge.call("noop", ()).unwrap().is_empty());
//! ```

pub use hostbridge_envelope as envelope;
pub use hostbridge_envelope::{Envelope, EnvelopeError, Expect};

#[cfg(feature = "host")]
pub use hostbridge_host as host;

#[cfg(feature = "client")]
pub use hostbridge_client as client;

#[cfg(feature = "env")]
pub use hostbridge_env as env;

/// Commonly used items.
pub mod prelude {
	pub use hostbridge_envelope::{Envelope, Expect};

	#[cfg(feature = "host")]
	pub use hostbridge_host::{
		CallRegistry, DynamicInvoker, IntoHostFunction, IpcError, IpcLogger, IpcRouter, IpcServer,
		IpcSettings, Json, StatusPolicy,
	};

	#[cfg(feature = "client")]
	pub use hostbridge_client::{
		BridgeError, CallOptions, ClientBridge, HostCallPrimitive, HttpCallPrimitive,
		LocalCallPrimitive, ResolutionCallback,
	};

	#[cfg(feature = "env")]
	pub use hostbridge_env::{EnvClient, Environment, File, FileConstraint, FileFlags};
}
