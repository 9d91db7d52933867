//! Host implementations of the environment collaborators.

use hostbridge_envelope::Envelope;
use hostbridge_host::{CallRegistry, Json};
use std::io::{Read, Write};
use std::path::Path;

use crate::types::{File, FileConstraint, FileFlags, base_name, extension};

pub const GET_ENV: &str = "GetEnv";
pub const SET_ENV: &str = "SetEnv";
pub const UNSET_ENV: &str = "UnsetEnv";
pub const READ_FILE: &str = "ReadFile";
pub const SAVE_FILE: &str = "SaveFile";

/// Environment variables and path-driven file access for the script side.
///
/// Every operation answers with an [`Envelope`], so failures reach the client
/// as the inner envelope's `error`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Environment;

impl Environment {
	pub fn new() -> Self {
		Self
	}

	/// Registers every collaborator under its wire name.
	pub fn register(self, registry: &CallRegistry) -> hostbridge_host::Result<()> {
		registry.register(GET_ENV, move |key: String| self.get_env(&key))?;
		registry.register(SET_ENV, move |key: String, value: String| self.set_env(&key, &value))?;
		registry.register(UNSET_ENV, move |key: String| self.unset_env(&key))?;
		registry.register(READ_FILE, move |constraint: Json<FileConstraint>| {
			self.read_file(&constraint.0)
		})?;
		registry.register(SAVE_FILE, move |file: Json<File>, flags: u32| {
			self.save_file(&file.0, FileFlags::from_bits(flags))
		})?;
		Ok(())
	}

	/// `ok` reports whether the variable is set.
	pub fn get_env(&self, key: &str) -> Envelope<String> {
		if !valid_key(key) {
			return Envelope::default();
		}
		match std::env::var(key) {
			Ok(value) => Envelope::success(value),
			Err(_) => Envelope::default(),
		}
	}

	pub fn set_env(&self, key: &str, value: &str) -> Envelope<bool> {
		if !valid_key(key) {
			return Envelope::failure(format!("invalid environment variable name: {:?}", key));
		}
		if value.contains('\0') {
			return Envelope::failure("environment variable value contains a NUL byte");
		}
		// SAFETY: the key and value were checked for the characters `set_var`
		// rejects. Concurrent access from foreign code reading the environment
		// is the embedding application's responsibility.
		unsafe { std::env::set_var(key, value) };
		Envelope::success(true)
	}

	pub fn unset_env(&self, key: &str) -> Envelope<bool> {
		if !valid_key(key) {
			return Envelope::failure(format!("invalid environment variable name: {:?}", key));
		}
		// SAFETY: see `set_env`.
		unsafe { std::env::remove_var(key) };
		Envelope::success(true)
	}

	/// Reads the file at `constraint.path`, enforcing its size limits.
	///
	/// With `open_directory` set the path must be a directory and only its
	/// name is reported.
	pub fn read_file(&self, constraint: &FileConstraint) -> Envelope<File> {
		if constraint.path.is_empty() {
			return Envelope::failure("no file path specified");
		}
		let path = constraint.path.replace('\\', "/");
		let result = if constraint.open_directory {
			describe_directory(&path)
		} else {
			read_regular_file(&path, constraint)
		};
		match result {
			Ok(file) => Envelope::success(file),
			Err(message) => {
				tracing::debug!(target: "hostbridge::env", path = %path, error = %message, "read file failed");
				Envelope::failure(message)
			}
		}
	}

	/// Writes `file.data` to `file.path` opened with `flags` (mode 0644 on Unix).
	pub fn save_file(&self, file: &File, flags: FileFlags) -> Envelope<bool> {
		if file.path.is_empty() {
			return Envelope::failure("no file path specified");
		}
		let mut options = flags.to_open_options();
		#[cfg(unix)]
		{
			use std::os::unix::fs::OpenOptionsExt;
			options.mode(0o644);
		}
		let result = options
			.open(&file.path)
			.and_then(|mut handle| handle.write_all(file.data.as_bytes()));
		match result {
			Ok(()) => Envelope::success(true),
			Err(e) => {
				tracing::warn!(target: "hostbridge::env", path = %file.path, error = %e, "save file failed");
				Envelope::failure(e.to_string())
			}
		}
	}
}

fn valid_key(key: &str) -> bool {
	!key.is_empty() && !key.contains('=') && !key.contains('\0')
}

fn describe_directory(path: &str) -> Result<File, String> {
	let metadata = std::fs::metadata(path).map_err(|e| e.to_string())?;
	if !metadata.is_dir() {
		return Err(format!("{} is not a directory", path));
	}
	Ok(File {
		name: base_name(path).to_string(),
		path: path.to_string(),
		is_dir: true,
		..File::default()
	})
}

fn read_regular_file(path: &str, constraint: &FileConstraint) -> Result<File, String> {
	let mut handle = std::fs::File::open(Path::new(path)).map_err(|e| e.to_string())?;
	let size = handle.metadata().map_err(|e| e.to_string())?.len();
	constraint.base.check_size(size).map_err(str::to_string)?;

	let mut bytes = Vec::with_capacity(size as usize);
	handle.read_to_end(&mut bytes).map_err(|e| e.to_string())?;
	let data = String::from_utf8(bytes).map_err(|_| "file is not valid UTF-8".to_string())?;

	Ok(File {
		name: base_name(path).to_string(),
		extension: extension(path).to_string(),
		path: path.to_string(),
		size: data.len() as u64,
		data,
		is_dir: false,
	})
}
