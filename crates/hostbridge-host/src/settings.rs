//! Router and server configuration.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

use crate::error::{IpcError, Result};

/// How envelope outcomes map onto HTTP status codes.
///
/// Unmatched paths always answer `404 Not Found`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPolicy {
	/// Every matched request answers `200 OK`; failures live in `error` only.
	#[default]
	Uniform,
	/// Failed calls answer `500 Internal Server Error`.
	Classified,
}

/// Settings for the IPC router and its HTTP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpcSettings {
	/// Path segment under which functions are exposed (`/<base_path>/<name>.callback`).
	pub base_path: String,

	/// Address the server binds to.
	pub bind_address: SocketAddr,

	/// Status-code mapping for failed calls.
	pub status_policy: StatusPolicy,

	/// Largest accepted request body in bytes.
	pub max_body_bytes: usize,
}

impl Default for IpcSettings {
	fn default() -> Self {
		Self {
			base_path: "ipc".to_string(),
			bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, 34115)),
			status_policy: StatusPolicy::Uniform,
			max_body_bytes: 16 * 1024 * 1024,
		}
	}
}

impl IpcSettings {
	/// Creates settings with default values.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses settings from a TOML document. Missing keys keep their defaults.
	pub fn from_toml_str(source: &str) -> Result<Self> {
		let settings: Self =
			toml::from_str(source).map_err(|e| IpcError::InvalidSettings(e.to_string()))?;
		settings.validate()?;
		Ok(settings)
	}

	/// Sets the base path. Leading and trailing slashes are ignored.
	pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
		self.base_path = base_path.into();
		self
	}

	/// Sets the address [`IpcServer::run`](crate::IpcServer::run) binds to.
	pub fn bind_address(mut self, addr: SocketAddr) -> Self {
		self.bind_address = addr;
		self
	}

	/// Sets the status-code mapping for failed calls.
	pub fn status_policy(mut self, policy: StatusPolicy) -> Self {
		self.status_policy = policy;
		self
	}

	/// Sets the largest accepted request body in bytes.
	pub fn max_body_bytes(mut self, limit: usize) -> Self {
		self.max_body_bytes = limit;
		self
	}

	/// Returns the base path without surrounding slashes.
	pub fn normalized_base_path(&self) -> &str {
		self.base_path.trim_matches('/')
	}

	/// Checks the settings for values the router cannot serve with.
	pub fn validate(&self) -> Result<()> {
		if self.normalized_base_path().is_empty() {
			return Err(IpcError::InvalidSettings(
				"base_path must not be empty".to_string(),
			));
		}
		if self.max_body_bytes == 0 {
			return Err(IpcError::InvalidSettings(
				"max_body_bytes must be greater than zero".to_string(),
			));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_default_values() {
		// Arrange & Act
		let settings = IpcSettings::default();

		// Assert
		assert_eq!(settings.base_path, "ipc");
		assert_eq!(settings.bind_address.port(), 34115);
		assert_eq!(settings.status_policy, StatusPolicy::Uniform);
		assert_eq!(settings.max_body_bytes, 16 * 1024 * 1024);
		assert!(settings.validate().is_ok());
	}

	#[rstest]
	fn test_builder_chain() {
		// Arrange & Act
		let settings = IpcSettings::new()
			.base_path("/environment/")
			.status_policy(StatusPolicy::Classified)
			.max_body_bytes(1024);

		// Assert
		assert_eq!(settings.normalized_base_path(), "environment");
		assert_eq!(settings.status_policy, StatusPolicy::Classified);
		assert_eq!(settings.max_body_bytes, 1024);
	}

	#[rstest]
	fn test_from_toml_partial() {
		// Arrange
		let source = r#"
			base_path = "env"
			status_policy = "classified"
		"#;

		// Act
		let settings = IpcSettings::from_toml_str(source).unwrap();

		// Assert
		assert_eq!(settings.base_path, "env");
		assert_eq!(settings.status_policy, StatusPolicy::Classified);
		assert_eq!(settings.max_body_bytes, IpcSettings::default().max_body_bytes);
	}

	#[rstest]
	fn test_from_toml_bind_address() {
		// Act
		let settings = IpcSettings::from_toml_str(r#"bind_address = "0.0.0.0:9000""#).unwrap();

		// Assert
		assert_eq!(settings.bind_address.port(), 9000);
	}

	#[rstest]
	#[case::slashes_only(r#"base_path = "//""#)]
	#[case::zero_limit("max_body_bytes = 0")]
	#[case::unknown_policy(r#"status_policy = "sometimes""#)]
	fn test_from_toml_rejects_invalid(#[case] source: &str) {
		// Act
		let result = IpcSettings::from_toml_str(source);

		// Assert
		assert!(matches!(result, Err(IpcError::InvalidSettings(_))));
	}
}
