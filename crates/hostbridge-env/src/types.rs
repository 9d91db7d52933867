//! Values exchanged by the file collaborators.

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::ops::{BitOr, BitOrAssign};

/// Open flags for [`SaveFile`](crate::Environment::save_file), as sent over the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileFlags(u32);

impl FileFlags {
	pub const O_RDONLY: Self = Self(1);
	pub const O_WRONLY: Self = Self(2);
	pub const O_RDWR: Self = Self(4);
	pub const O_APPEND: Self = Self(8);
	pub const O_CREATE: Self = Self(16);
	pub const O_EXCL: Self = Self(32);
	pub const O_SYNC: Self = Self(64);
	pub const O_TRUNC: Self = Self(128);

	pub const fn from_bits(bits: u32) -> Self {
		Self(bits)
	}

	pub const fn bits(self) -> u32 {
		self.0
	}

	pub const fn contains(self, other: Self) -> bool {
		self.0 & other.0 == other.0
	}

	/// Builds the matching [`OpenOptions`].
	///
	/// `O_SYNC` has no portable counterpart and is ignored. Unknown bits are
	/// ignored as well.
	pub fn to_open_options(self) -> OpenOptions {
		let mut options = OpenOptions::new();
		options
			.read(self.contains(Self::O_RDONLY) || self.contains(Self::O_RDWR))
			.write(self.contains(Self::O_WRONLY) || self.contains(Self::O_RDWR))
			.append(self.contains(Self::O_APPEND))
			.truncate(self.contains(Self::O_TRUNC));
		if self.contains(Self::O_EXCL) && self.contains(Self::O_CREATE) {
			options.create_new(true);
		} else {
			options.create(self.contains(Self::O_CREATE));
		}
		options
	}
}

impl BitOr for FileFlags {
	type Output = Self;

	fn bitor(self, rhs: Self) -> Self {
		Self(self.0 | rhs.0)
	}
}

impl BitOrAssign for FileFlags {
	fn bitor_assign(&mut self, rhs: Self) {
		self.0 |= rhs.0;
	}
}

/// A named group of file extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
	#[serde(rename = "name")]
	pub display_name: String,
	pub extensions: Vec<String>,
}

/// Size limits and filters applied when a file is read.
///
/// Only the size limits are enforced here. A `max_size` of zero means no
/// upper limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaseConstraint {
	pub max_size: u64,
	pub min_size: u64,
	pub allowed_extensions: Vec<Filter>,
	pub allowed_mime_types: Vec<String>,
}

impl BaseConstraint {
	/// Checks a file size against the limits.
	pub fn check_size(&self, size: u64) -> Result<(), &'static str> {
		if self.max_size > 0 && size > self.max_size {
			return Err("File too large");
		}
		if size < self.min_size {
			return Err("File too small");
		}
		Ok(())
	}
}

/// Which file to read, and the limits it must satisfy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileConstraint {
	pub path: String,
	/// Describe the directory at `path` instead of reading a file.
	pub open_directory: bool,
	#[serde(flatten)]
	pub base: BaseConstraint,
}

impl FileConstraint {
	pub fn path(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			..Self::default()
		}
	}

	pub fn max_size(mut self, max_size: u64) -> Self {
		self.base.max_size = max_size;
		self
	}

	pub fn min_size(mut self, min_size: u64) -> Self {
		self.base.min_size = min_size;
		self
	}
}

/// A file as seen by the script side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct File {
	pub name: String,
	/// Extension including the leading dot, or empty.
	pub extension: String,
	/// Path with `/` separators.
	pub path: String,
	/// UTF-8 contents.
	pub data: String,
	pub size: u64,
	pub is_dir: bool,
}

impl File {
	pub fn new(path: impl Into<String>, data: impl Into<String>) -> Self {
		let path = path.into();
		let data = data.into();
		Self {
			name: base_name(&path).to_string(),
			extension: extension(&path).to_string(),
			size: data.len() as u64,
			path,
			data,
			is_dir: false,
		}
	}
}

pub(crate) fn base_name(path: &str) -> &str {
	path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

pub(crate) fn extension(path: &str) -> &str {
	let name = base_name(path);
	match name.rfind('.') {
		Some(index) => &name[index..],
		None => "",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_flags_combine() {
		// Act
		let flags = FileFlags::O_WRONLY | FileFlags::O_CREATE | FileFlags::O_TRUNC;

		// Assert
		assert_eq!(flags.bits(), 2 | 16 | 128);
		assert!(flags.contains(FileFlags::O_CREATE));
		assert!(!flags.contains(FileFlags::O_APPEND));
	}

	#[rstest]
	fn test_flags_serialize_as_number() {
		assert_eq!(serde_json::to_value(FileFlags::O_RDWR).unwrap(), json!(4));
	}

	#[rstest]
	#[case(0, 10, 0, true)]
	#[case(10, 10, 0, true)]
	#[case(11, 10, 0, false)]
	#[case(1, 0, 5, false)]
	#[case(1_000_000, 0, 0, true)]
	fn test_check_size(#[case] size: u64, #[case] max: u64, #[case] min: u64, #[case] accepted: bool) {
		// Arrange
		let constraint = BaseConstraint {
			max_size: max,
			min_size: min,
			..BaseConstraint::default()
		};

		// Act & Assert
		assert_eq!(constraint.check_size(size).is_ok(), accepted);
	}

	#[rstest]
	fn test_constraint_wire_shape() {
		// Arrange
		let wire = json!({
			"path": "/tmp/a.txt",
			"openDirectory": false,
			"maxSize": 100,
			"minSize": 1,
			"allowedExtensions": [{"name": "Text", "extensions": ["txt"]}],
			"allowedMimeTypes": ["text/plain"]
		});

		// Act
		let constraint: FileConstraint = serde_json::from_value(wire).unwrap();

		// Assert
		assert_eq!(constraint.path, "/tmp/a.txt");
		assert_eq!(constraint.base.max_size, 100);
		assert_eq!(constraint.base.allowed_extensions[0].display_name, "Text");
	}

	#[rstest]
	#[case("/tmp/notes.txt", "notes.txt", ".txt")]
	#[case("/tmp/archive.tar.gz", "archive.tar.gz", ".gz")]
	#[case("README", "README", "")]
	#[case("/tmp/dir/", "dir", "")]
	fn test_file_names(#[case] path: &str, #[case] name: &str, #[case] ext: &str) {
		// Act
		let file = File::new(path, "");

		// Assert
		assert_eq!(file.name, name);
		assert_eq!(file.extension, ext);
	}
}
