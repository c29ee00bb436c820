use std::path::PathBuf;

use clara_engine::EngineError;
use thiserror::Error;

/// Session construction failures.
///
/// A session that failed to construct holds no worker and no parsed unit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
	/// The engine could not produce any semantic model for the file.
	#[error("failed to parse {path}: {source}")]
	Parse {
		/// The file under edit.
		path: PathBuf,
		/// What the engine reported.
		source: EngineError,
	},

	/// The worker thread could not be started.
	#[error("failed to start worker for {path}: {error}")]
	Spawn {
		/// The file under edit.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},
}

/// A convenient type alias for `Result` with `E` = [`SessionError`].
pub type Result<T, E = SessionError> = std::result::Result<T, E>;
