use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::database::CompilationDatabase;
use crate::error::Result;

/// Compiler flags and working directory for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFlags {
	/// Arguments after the compiler executable, empty ones removed.
	pub flags: Vec<String>,
	/// Directory the compile command runs in.
	pub working_directory: Option<PathBuf>,
}

impl ResolvedFlags {
	/// Returns true when nothing was found for the file.
	pub fn is_empty(&self) -> bool {
		self.flags.is_empty() && self.working_directory.is_none()
	}
}

/// Process-wide map from a build context (an editor window, a project) to
/// its loaded compilation database.
///
/// Shared between sessions behind an `Arc`; every method takes `&self`.
#[derive(Debug, Default)]
pub struct BuildConfigCache {
	databases: RwLock<HashMap<String, Arc<CompilationDatabase>>>,
}

impl BuildConfigCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Detects and caches the database for `context`, starting the search at
	/// `directory`.
	///
	/// Returns `Ok(false)` when the context already has a database; it is not
	/// reloaded.
	pub fn load(&self, context: &str, directory: &Path) -> Result<bool> {
		if self.databases.read().contains_key(context) {
			return Ok(false);
		}
		let database = CompilationDatabase::auto_detect(directory)?;
		let entries = database.len();
		let mut databases = self.databases.write();
		if databases.contains_key(context) {
			return Ok(false);
		}
		databases.insert(context.to_string(), Arc::new(database));
		tracing::info!(context, directory = %directory.display(), entries, "build_config.cache.loaded");
		Ok(true)
	}

	/// Stores `database` for `context`, returning the one it replaces.
	pub fn insert(&self, context: impl Into<String>, database: CompilationDatabase) -> Option<Arc<CompilationDatabase>> {
		self.databases.write().insert(context.into(), Arc::new(database))
	}

	pub fn get(&self, context: &str) -> Option<Arc<CompilationDatabase>> {
		self.databases.read().get(context).cloned()
	}

	/// Flags for `filename` in `context`.
	///
	/// When several commands compile the same file the first one wins. The
	/// compiler executable and empty arguments are skipped. Unknown contexts
	/// and files resolve to [`ResolvedFlags::default`].
	pub fn resolve(&self, context: &str, filename: &Path) -> ResolvedFlags {
		let Some(database) = self.get(context) else {
			tracing::trace!(context, "build_config.cache.unknown_context");
			return ResolvedFlags::default();
		};
		let Some(command) = database.compile_commands(filename).next() else {
			tracing::trace!(context, file = %filename.display(), "build_config.cache.no_command");
			return ResolvedFlags::default();
		};
		ResolvedFlags {
			flags: command.command_line.iter().skip(1).filter(|arg| !arg.is_empty()).cloned().collect(),
			working_directory: Some(command.directory.clone()),
		}
	}

	/// Forgets the database of `context`.
	pub fn evict(&self, context: &str) -> bool {
		self.databases.write().remove(context).is_some()
	}

	/// Cached contexts, sorted.
	pub fn contexts(&self) -> Vec<String> {
		let mut contexts: Vec<_> = self.databases.read().keys().cloned().collect();
		contexts.sort();
		contexts
	}

	pub fn clear(&self) {
		self.databases.write().clear();
	}
}
