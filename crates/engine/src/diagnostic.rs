use std::path::Path;

use serde::{Deserialize, Serialize};

/// Severity of an engine diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
	Note,
	Remark,
	Warning,
	Error,
	Fatal,
}

impl DiagnosticKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Note => "note",
			Self::Remark => "remark",
			Self::Warning => "warning",
			Self::Error => "error",
			Self::Fatal => "fatal",
		}
	}
}

impl std::fmt::Display for DiagnosticKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Location as the engine presents it to the user, after line directives and
/// macro expansion have been accounted for. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresumedLocation {
	pub filename: String,
	pub line: u32,
	pub column: u32,
}

impl PresumedLocation {
	pub fn new(filename: impl Into<String>, line: u32, column: u32) -> Self {
		Self {
			filename: filename.into(),
			line,
			column,
		}
	}
}

/// Receives diagnostics while an engine pass runs.
///
/// The engine resolves the location at the moment it emits; sinks must not
/// hold on to engine state between calls.
pub trait DiagnosticSink {
	/// A pass over `file` starts.
	fn begin_pass(&mut self, file: &Path);

	/// One diagnostic. `location` is `None` when the engine cannot resolve it.
	fn on_diagnostic(&mut self, kind: DiagnosticKind, location: Option<PresumedLocation>, text: &str);

	/// The current pass is over.
	fn end_pass(&mut self);
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
	fn begin_pass(&mut self, _file: &Path) {}

	fn on_diagnostic(&mut self, _kind: DiagnosticKind, _location: Option<PresumedLocation>, _text: &str) {}

	fn end_pass(&mut self) {}
}
