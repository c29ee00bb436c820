//! Source-analysis engine capability.
//!
//! Sessions never parse anything themselves. They drive an engine through two
//! traits: [`EngineFactory`] builds (or reloads) a parsed unit for one file and
//! [`AnalysisEngine`] is that unit, able to reparse itself and to produce raw
//! [`CompletionCandidate`]s for an in-memory buffer. Diagnostics flow back
//! through a [`DiagnosticSink`] for the duration of each pass.
//!
//! ## Cargo features
//!
//! - `test-support`: [`testing::ScriptedFactory`], a deterministic engine
//!   driven by a shared [`testing::Script`].

use std::path::PathBuf;

pub use clara_worker::{CancelToken, Cancelled};

mod candidate;
mod diagnostic;
mod engine;
mod invocation;

pub use candidate::{Availability, CandidateKind, Chunk, CompletionCandidate, CompletionString, Punctuation};
pub use diagnostic::{DiagnosticKind, DiagnosticSink, NullSink, PresumedLocation};
pub use engine::{AnalysisEngine, EngineFactory};
pub use invocation::{CompletionOptions, CompletionQuery, Invocation, LanguageStandard, UnknownStandard};

#[cfg(feature = "test-support")]
pub mod testing;

/// A convenient type alias for `Result` with `E` = [`EngineError`].
pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// Errors reported by an engine.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EngineError {
	/// The pass observed its cancellation token and stopped early.
	#[error("analysis cancelled")]
	Cancelled,
	/// The engine could not run the pass at all.
	#[error("analysis failed: {0}")]
	Failed(String),
	/// A serialized unit exists but cannot be read back.
	#[error("unreadable semantic model at {path}: {reason}")]
	Unreadable {
		/// Path of the serialized unit.
		path: PathBuf,
		/// Why it was rejected.
		reason: String,
	},
	/// Reading or writing a serialized unit failed.
	#[error("I/O error on {path}: {error}")]
	Io {
		/// Path involved in the failed operation.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},
}

impl EngineError {
	/// Returns true for [`EngineError::Cancelled`].
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}
}

impl From<Cancelled> for EngineError {
	fn from(_: Cancelled) -> Self {
		Self::Cancelled
	}
}
