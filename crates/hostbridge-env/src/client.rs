//! Typed client wrappers for the environment collaborators.

use hostbridge_client::{BridgeError, CallOptions, ClientBridge, Result};
use hostbridge_envelope::Envelope;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::host::{GET_ENV, READ_FILE, SAVE_FILE, SET_ENV, UNSET_ENV};
use crate::types::{File, FileConstraint, FileFlags};

/// Calls the environment collaborators through a [`ClientBridge`].
#[derive(Debug, Clone)]
pub struct EnvClient {
	bridge: ClientBridge,
	options: CallOptions,
}

impl EnvClient {
	pub fn new(bridge: ClientBridge) -> Self {
		Self {
			bridge,
			options: CallOptions::new().requires_return(true),
		}
	}

	/// Bounds every call made by this client.
	pub fn with_deadline(mut self, deadline: std::time::Duration) -> Self {
		self.options = self.options.deadline(deadline);
		self
	}

	/// Returns the value of `key`, or `None` when it is not set.
	pub fn get_env(&self, key: &str) -> Result<Option<String>> {
		let envelope = self.call::<String, _>(GET_ENV, (key,))?;
		if let Some(error) = envelope.error_message() {
			return Err(BridgeError::Host(error.to_string()));
		}
		Ok(envelope.ok.then_some(envelope.data))
	}

	pub fn set_env(&self, key: &str, value: &str) -> Result<()> {
		self.call::<bool, _>(SET_ENV, (key, value))
			.and_then(into_unit)
	}

	pub fn unset_env(&self, key: &str) -> Result<()> {
		self.call::<bool, _>(UNSET_ENV, (key,)).and_then(into_unit)
	}

	pub fn read_file(&self, constraint: &FileConstraint) -> Result<File> {
		self.call::<File, _>(READ_FILE, (constraint,))?
			.into_result()
			.map_err(BridgeError::Host)
	}

	pub fn save_file(&self, file: &File, flags: FileFlags) -> Result<()> {
		self.call::<bool, _>(SAVE_FILE, (file, flags)).and_then(into_unit)
	}

	fn call<T, A>(&self, function: &str, args: A) -> Result<Envelope<T>>
	where
		T: DeserializeOwned + Default,
		A: Serialize,
	{
		self.bridge.call_envelope(function, args, self.options)
	}
}

fn into_unit(envelope: Envelope<bool>) -> Result<()> {
	envelope.into_result().map(|_| ()).map_err(BridgeError::Host)
}
