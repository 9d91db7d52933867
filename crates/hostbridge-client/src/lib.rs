//! Client side of the bridge: blocking calls into host functions.
//!
//! A [`ClientBridge`] sits on a [`HostCallPrimitive`], an asynchronous call
//! mechanism that settles a [`ResolutionCallback`] once the host answers. For
//! every call the bridge allocates a [`PendingCall`], a single-slot channel,
//! and blocks on it until the callback writes the resolved envelope.
//!
//! ```
//! use std::sync::Arc;
//! use hostbridge_client::{ClientBridge, LocalCallPrimitive};
//! use hostbridge_host::{CallRegistry, IpcRouter};
//!
//! let registry = Arc::new(CallRegistry::new());
//! registry.register("add", |a: i64, b: i64| a + b).unwrap();
//!
//! let bridge = ClientBridge::new(Arc::new(LocalCallPrimitive::new(IpcRouter::new(registry))));
//! let sum: i64 = bridge.call_typed("add", (2, 3)).unwrap();
//! assert_eq!(sum, 5);
//! ```

mod bridge;
mod callback;
mod error;
mod http;
mod options;
mod pending;
mod primitive;

pub use bridge::{ClientBridge, to_arguments};
pub use callback::ResolutionCallback;
pub use error::{BridgeError, Result};
pub use http::HttpCallPrimitive;
pub use options::CallOptions;
pub use pending::{NO_RETURN_VALUE, PendingCall, resolve};
pub use primitive::{HostCallPrimitive, LocalCallPrimitive};
