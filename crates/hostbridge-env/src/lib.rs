//! Environment collaborators reachable across the bridge.
//!
//! [`Environment`] implements environment-variable access and path-driven
//! file reads and writes on the host and registers them under their wire
//! names. [`EnvClient`] calls them from the script side.
//!
//! ```
//! use std::sync::Arc;
//! use hostbridge_client::{ClientBridge, LocalCallPrimitive};
//! use hostbridge_env::{EnvClient, Environment};
//! use hostbridge_host::{CallRegistry, IpcRouter};
//!
//! let registry = Arc::new(CallRegistry::new());
//! Environment::new().register(&registry).unwrap();
//!
//! let bridge = ClientBridge::new(Arc::new(LocalCallPrimitive::new(IpcRouter::new(registry))));
//! let env = EnvClient::new(bridge);
//! assert_eq!(env.get_env("HOSTBRIDGE_DOC_UNSET_VARIABLE").unwrap(), None);
//! ```

mod client;
mod host;
mod types;

pub use client::EnvClient;
pub use host::{Environment, GET_ENV, READ_FILE, SAVE_FILE, SET_ENV, UNSET_ENV};
pub use types::{BaseConstraint, File, FileConstraint, FileFlags, Filter};
