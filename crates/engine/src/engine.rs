use std::path::Path;

use crate::{CancelToken, CompletionCandidate, CompletionQuery, DiagnosticSink, Invocation, Result};

/// A parsed unit for one file.
///
/// Implementations are not expected to be thread-safe: a session only ever
/// calls them from its worker thread. Long passes poll the token once per
/// top-level declaration and return [`EngineError::Cancelled`] when asked to
/// stop.
///
/// [`EngineError::Cancelled`]: crate::EngineError::Cancelled
pub trait AnalysisEngine: Send + 'static {
	/// Re-runs analysis against the current on-disk state, refreshing any
	/// cached preamble. The previous model is replaced.
	fn reparse(&mut self, sink: &mut dyn DiagnosticSink, token: &CancelToken) -> Result<()>;

	/// Produces raw candidates at `query.row`/`query.column`, treating
	/// `query.buffer` as the file's content. Order and filtering are left to
	/// the caller.
	fn complete_at(&mut self, query: &CompletionQuery<'_>, sink: &mut dyn DiagnosticSink, token: &CancelToken) -> Result<Vec<CompletionCandidate>>;

	/// Serializes the unit so [`EngineFactory::load`] can restore it.
	fn save(&self, path: &Path) -> Result<()>;
}

/// Builds parsed units.
pub trait EngineFactory {
	type Engine: AnalysisEngine;

	/// Parses the file described by `invocation` from scratch.
	fn parse(&self, invocation: &Invocation, sink: &mut dyn DiagnosticSink, token: &CancelToken) -> Result<Self::Engine>;

	/// Restores a unit previously written by [`AnalysisEngine::save`].
	fn load(&self, path: &Path, invocation: &Invocation, sink: &mut dyn DiagnosticSink) -> Result<Self::Engine>;
}
