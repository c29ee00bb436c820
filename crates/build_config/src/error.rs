//! Error types for compilation-database loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a compilation database.
#[derive(Debug, Error)]
pub enum BuildConfigError {
	/// Error reading the database file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The database is not valid JSON or does not have the expected shape.
	#[error("malformed compilation database {path}: {error}")]
	Json {
		/// Path to the malformed database.
		path: PathBuf,
		/// The underlying parse error.
		error: serde_json::Error,
	},

	/// A `command` string could not be split into arguments.
	#[error("unsplittable command for {file}: {reason}")]
	Command {
		/// Source file the entry describes.
		file: String,
		/// Why splitting failed.
		reason: String,
	},

	/// No `compile_commands.json` exists in the directory or its ancestors.
	#[error("no compile_commands.json found in {0} or its ancestors")]
	NotFound(PathBuf),
}

/// Result type for build-configuration operations.
pub type Result<T> = std::result::Result<T, BuildConfigError>;
