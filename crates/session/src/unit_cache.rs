//! On-disk cache of serialized parsed units.
//!
//! A unit for `dir/name.cpp` lives at `<cache dir>/name.cpp.ast`. It is only
//! trusted while it is at least as new as the source file.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::options::CacheOptions;

/// Name of the default cache directory under the working directory.
pub const CACHE_DIR_NAME: &str = ".clara";

/// Whether a cached unit may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
	Missing,
	/// Older than the source file.
	Stale,
	Fresh,
}

/// Where the unit of `filename` is cached, or `None` when caching is off.
pub fn cache_path(options: &CacheOptions, working_directory: &Path, filename: &Path) -> Option<PathBuf> {
	if !options.enabled {
		return None;
	}
	let name = filename.file_name()?;
	let dir = options.directory.clone().unwrap_or_else(|| working_directory.join(CACHE_DIR_NAME));
	let mut file = name.to_os_string();
	file.push(".ast");
	Some(dir.join(file))
}

/// Compares modification times. A source whose time cannot be read does not
/// invalidate the cache.
pub fn freshness(cache: &Path, source: &Path) -> Freshness {
	let Some(cached) = modified(cache) else {
		return Freshness::Missing;
	};
	match modified(source) {
		Some(source) if cached < source => Freshness::Stale,
		_ => Freshness::Fresh,
	}
}

/// Removes an unusable cache file.
pub fn discard(cache: &Path) {
	match std::fs::remove_file(cache) {
		Ok(()) => tracing::info!(path = %cache.display(), "session.cache.discarded"),
		Err(error) => tracing::warn!(path = %cache.display(), %error, "session.cache.discard_failed"),
	}
}

fn modified(path: &Path) -> Option<SystemTime> {
	std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
}
