//! JSON compilation databases (`compile_commands.json`).

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::error::{BuildConfigError, Result};

/// File name searched for by [`CompilationDatabase::auto_detect`].
pub const DATABASE_FILE_NAME: &str = "compile_commands.json";

/// One entry of a compilation database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCommand {
	/// Working directory of the compilation.
	pub directory: PathBuf,
	/// Main source file, as written in the database.
	pub file: PathBuf,
	/// Full command line, compiler executable first.
	pub command_line: Vec<String>,
}

impl CompileCommand {
	/// Absolute, lexically normalized path of [`Self::file`].
	pub fn source_path(&self) -> PathBuf {
		normalize(&self.directory.join(&self.file))
	}
}

#[derive(Deserialize)]
struct RawEntry {
	directory: PathBuf,
	file: PathBuf,
	#[serde(default)]
	arguments: Option<Vec<String>>,
	#[serde(default)]
	command: Option<String>,
}

impl RawEntry {
	fn into_command(self) -> Result<CompileCommand> {
		let command_line = match (self.arguments, self.command) {
			(Some(arguments), _) => arguments,
			(None, Some(command)) => shell_words::split(&command).map_err(|e| BuildConfigError::Command {
				file: self.file.display().to_string(),
				reason: e.to_string(),
			})?,
			(None, None) => {
				return Err(BuildConfigError::Command {
					file: self.file.display().to_string(),
					reason: "entry has neither `arguments` nor `command`".to_string(),
				});
			}
		};
		Ok(CompileCommand {
			directory: self.directory,
			file: self.file,
			command_line,
		})
	}
}

/// A loaded compilation database.
#[derive(Debug, Clone, Default)]
pub struct CompilationDatabase {
	path: Option<PathBuf>,
	commands: Vec<CompileCommand>,
}

impl CompilationDatabase {
	/// Builds a database from already parsed entries.
	pub fn from_commands(commands: Vec<CompileCommand>) -> Self {
		Self { path: None, commands }
	}

	/// Reads a `compile_commands.json` file.
	pub fn from_json_file(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path).map_err(|error| BuildConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let mut database = Self::from_json_str(&text, path)?;
		database.path = Some(path.to_path_buf());
		Ok(database)
	}

	/// Parses database JSON. `origin` only labels errors.
	pub fn from_json_str(text: &str, origin: &Path) -> Result<Self> {
		let entries: Vec<RawEntry> = serde_json::from_str(text).map_err(|error| BuildConfigError::Json {
			path: origin.to_path_buf(),
			error,
		})?;
		let commands = entries.into_iter().map(RawEntry::into_command).collect::<Result<Vec<_>>>()?;
		Ok(Self::from_commands(commands))
	}

	/// Finds `compile_commands.json` in `directory` or the nearest ancestor
	/// that has one.
	pub fn auto_detect(directory: &Path) -> Result<Self> {
		for dir in directory.ancestors() {
			let candidate = dir.join(DATABASE_FILE_NAME);
			if candidate.is_file() {
				tracing::debug!(path = %candidate.display(), "build_config.database.detected");
				return Self::from_json_file(&candidate);
			}
		}
		Err(BuildConfigError::NotFound(directory.to_path_buf()))
	}

	/// Path the database was read from, if it came from disk.
	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	pub fn len(&self) -> usize {
		self.commands.len()
	}

	pub fn is_empty(&self) -> bool {
		self.commands.is_empty()
	}

	/// Entries compiling `filename`, in database order.
	pub fn compile_commands<'a>(&'a self, filename: &Path) -> impl Iterator<Item = &'a CompileCommand> + 'a {
		let wanted = normalize(filename);
		self.commands.iter().filter(move |command| command.source_path() == wanted)
	}
}

/// Resolves `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
	let mut out = PathBuf::new();
	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				if !out.pop() {
					out.push(component);
				}
			}
			other => out.push(other),
		}
	}
	out
}
