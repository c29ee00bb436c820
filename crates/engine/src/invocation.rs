//! What an engine needs to build and query a parsed unit.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Language standard used when no compile command supplies one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageStandard {
	#[serde(rename = "c99")]
	C99,
	#[serde(rename = "c11")]
	C11,
	#[serde(rename = "c17")]
	C17,
	#[serde(rename = "c++98")]
	Cxx98,
	#[serde(rename = "c++03")]
	Cxx03,
	#[serde(rename = "c++11")]
	Cxx11,
	#[serde(rename = "c++14")]
	Cxx14,
	#[default]
	#[serde(rename = "c++17")]
	Cxx17,
	#[serde(rename = "c++20")]
	Cxx20,
	#[serde(rename = "c++2b")]
	Cxx2b,
}

impl LanguageStandard {
	const ALL: [Self; 10] = [
		Self::C99,
		Self::C11,
		Self::C17,
		Self::Cxx98,
		Self::Cxx03,
		Self::Cxx11,
		Self::Cxx14,
		Self::Cxx17,
		Self::Cxx20,
		Self::Cxx2b,
	];

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::C99 => "c99",
			Self::C11 => "c11",
			Self::C17 => "c17",
			Self::Cxx98 => "c++98",
			Self::Cxx03 => "c++03",
			Self::Cxx11 => "c++11",
			Self::Cxx14 => "c++14",
			Self::Cxx17 => "c++17",
			Self::Cxx20 => "c++20",
			Self::Cxx2b => "c++2b",
		}
	}

	pub const fn is_cxx(self) -> bool {
		!matches!(self, Self::C99 | Self::C11 | Self::C17)
	}

	/// Compiler flag selecting this standard.
	pub fn flag(self) -> String {
		format!("-std={}", self.as_str())
	}
}

/// Returned when parsing an unsupported standard name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language standard '{0}'")]
pub struct UnknownStandard(pub String);

impl FromStr for LanguageStandard {
	type Err = UnknownStandard;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|standard| standard.as_str().eq_ignore_ascii_case(s))
			.ok_or_else(|| UnknownStandard(s.to_string()))
	}
}

/// Content toggles forwarded to every completion pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionOptions {
	pub include_macros: bool,
	pub include_code_patterns: bool,
	pub include_globals: bool,
	pub include_brief_comments: bool,
}

impl Default for CompletionOptions {
	fn default() -> Self {
		Self {
			include_macros: true,
			include_code_patterns: true,
			include_globals: true,
			include_brief_comments: true,
		}
	}
}

/// Compiler invocation for one translation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
	/// Main source file.
	pub filename: PathBuf,
	/// Compiler arguments, without the compiler executable.
	pub arguments: Vec<String>,
	/// Directory relative paths in `arguments` resolve against.
	pub working_directory: PathBuf,
	pub system_headers: Vec<PathBuf>,
	pub frameworks: Vec<PathBuf>,
	/// Engine-bundled builtin headers, searched before the system ones.
	pub builtin_headers: Option<PathBuf>,
	pub language_standard: LanguageStandard,
	/// Function bodies are irrelevant to completion outside the cursor's body.
	pub skip_function_bodies: bool,
	pub completion: CompletionOptions,
}

/// One completion request against a parsed unit.
#[derive(Debug, Clone, Copy)]
pub struct CompletionQuery<'a> {
	pub filename: &'a Path,
	/// Replaces the on-disk content of `filename` for this call only.
	pub buffer: &'a str,
	/// 1-based.
	pub row: u32,
	/// 1-based.
	pub column: u32,
	pub options: CompletionOptions,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn standards_round_trip_through_names() {
		for standard in LanguageStandard::ALL {
			assert_eq!(standard.as_str().parse::<LanguageStandard>(), Ok(standard));
		}
		assert_eq!("C++14".parse::<LanguageStandard>(), Ok(LanguageStandard::Cxx14));
		assert_eq!("c++42".parse::<LanguageStandard>(), Err(UnknownStandard("c++42".into())));
	}

	#[test]
	fn flag_spelling() {
		assert_eq!(LanguageStandard::Cxx17.flag(), "-std=c++17");
		assert_eq!(LanguageStandard::C11.flag(), "-std=c11");
		assert!(!LanguageStandard::C17.is_cxx());
	}
}
