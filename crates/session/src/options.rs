//! Session configuration.
//!
//! Everything except `filename` has a default, so a minimal TOML document is
//! just:
//!
//! ```toml
//! filename = "/work/src/main.cpp"
//! ```

use std::path::{Path, PathBuf};

use clara_engine::{CompletionOptions, LanguageStandard};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading session options.
#[derive(Debug, Error)]
pub enum OptionsError {
	/// Error reading an options file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The document is not valid TOML or has the wrong shape.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),
}

/// What a session offers in completion results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompletionToggles {
	pub include_macros: bool,
	pub include_code_patterns: bool,
	pub include_globals: bool,
	pub include_brief_comments: bool,
	/// Expand optional groups (defaulted arguments) into labels and snippets.
	pub include_optional_arguments: bool,
}

impl Default for CompletionToggles {
	fn default() -> Self {
		Self {
			include_macros: true,
			include_code_patterns: true,
			include_globals: true,
			include_brief_comments: true,
			include_optional_arguments: false,
		}
	}
}

impl CompletionToggles {
	/// The subset the engine consumes.
	pub fn engine_options(&self) -> CompletionOptions {
		CompletionOptions {
			include_macros: self.include_macros,
			include_code_patterns: self.include_code_patterns,
			include_globals: self.include_globals,
			include_brief_comments: self.include_brief_comments,
		}
	}
}

/// How a submission that finds the worker busy is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
	/// Refuse the submission; no result is delivered for it.
	#[default]
	RejectIfBusy,
	/// Cancel the running job, wait for it to stop, then take its place.
	Preempt,
}

/// Semantic-model cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheOptions {
	pub enabled: bool,
	/// Defaults to `.clara` under the session's working directory.
	pub directory: Option<PathBuf>,
}

impl Default for CacheOptions {
	fn default() -> Self {
		Self {
			enabled: true,
			directory: None,
		}
	}
}

/// Everything a session needs at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionOptions {
	/// The file under edit.
	pub filename: PathBuf,
	#[serde(default)]
	pub system_headers: Vec<PathBuf>,
	#[serde(default)]
	pub frameworks: Vec<PathBuf>,
	#[serde(default)]
	pub builtin_headers: Option<PathBuf>,
	/// Compiler arguments used instead of the build configuration.
	#[serde(default)]
	pub flags: Option<Vec<String>>,
	/// Working directory used instead of the build configuration's.
	#[serde(default)]
	pub working_directory: Option<PathBuf>,
	/// Key of the compilation database in the shared build-config cache.
	#[serde(default)]
	pub build_context: Option<String>,
	#[serde(default)]
	pub language_standard: LanguageStandard,
	#[serde(default)]
	pub completion: CompletionToggles,
	#[serde(default)]
	pub policy: PolicyKind,
	#[serde(default)]
	pub cache: CacheOptions,
	/// Engine reparses per reparse request. Two also refresh the preamble on
	/// engines that only rebuild it on the second pass.
	#[serde(default = "default_reparse_passes")]
	pub reparse_passes: u32,
}

fn default_reparse_passes() -> u32 {
	1
}

impl SessionOptions {
	/// Default options for `filename`.
	pub fn new(filename: impl Into<PathBuf>) -> Self {
		Self {
			filename: filename.into(),
			system_headers: Vec::new(),
			frameworks: Vec::new(),
			builtin_headers: None,
			flags: None,
			working_directory: None,
			build_context: None,
			language_standard: LanguageStandard::default(),
			completion: CompletionToggles::default(),
			policy: PolicyKind::default(),
			cache: CacheOptions::default(),
			reparse_passes: default_reparse_passes(),
		}
	}

	pub fn from_toml_str(text: &str) -> Result<Self, OptionsError> {
		Ok(toml::from_str(text)?)
	}

	pub fn load(path: &Path) -> Result<Self, OptionsError> {
		let text = std::fs::read_to_string(path).map_err(|error| OptionsError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&text)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn minimal_document_fills_defaults() {
		let options = SessionOptions::from_toml_str(r#"filename = "/work/a.cpp""#).unwrap();
		assert_eq!(options, SessionOptions::new("/work/a.cpp"));
		assert_eq!(options.policy, PolicyKind::RejectIfBusy);
		assert!(options.cache.enabled);
		assert!(!options.completion.include_optional_arguments);
	}

	#[test]
	fn full_document() {
		let options = SessionOptions::from_toml_str(
			r#"
			filename = "/work/a.cpp"
			system_headers = ["/usr/include/c++/13"]
			flags = ["-DDEBUG", "-Iinclude"]
			build_context = "window-3"
			language_standard = "c++20"
			policy = "preempt"
			reparse_passes = 2

			[completion]
			include_macros = false
			include_optional_arguments = true

			[cache]
			enabled = false
			"#,
		)
		.unwrap();
		assert_eq!(options.language_standard, LanguageStandard::Cxx20);
		assert_eq!(options.policy, PolicyKind::Preempt);
		assert_eq!(options.flags.as_deref(), Some(&["-DDEBUG".to_string(), "-Iinclude".to_string()][..]));
		assert!(!options.completion.include_macros);
		assert!(options.completion.include_globals);
		assert!(options.completion.include_optional_arguments);
		assert!(!options.cache.enabled);
		assert_eq!(options.reparse_passes, 2);
	}

	#[test]
	fn unknown_standard_is_rejected() {
		let err = SessionOptions::from_toml_str("filename = \"a.cpp\"\nlanguage_standard = \"c++42\"").unwrap_err();
		assert!(matches!(err, OptionsError::Toml(_)));
	}

	#[test]
	fn missing_filename_is_rejected() {
		assert!(SessionOptions::from_toml_str("policy = \"preempt\"").is_err());
	}

	#[test]
	fn load_reports_path_on_io_error() {
		let dir = tempfile::tempdir().unwrap();
		let missing = dir.path().join("session.toml");
		match SessionOptions::load(&missing) {
			Err(OptionsError::Io { path, .. }) => assert_eq!(path, missing),
			other => panic!("unexpected {other:?}"),
		}
	}
}
