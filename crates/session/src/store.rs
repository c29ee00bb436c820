use std::path::{Path, PathBuf};

use clara_engine::{AnalysisEngine, CancelToken, Cancelled, CompletionCandidate, CompletionOptions, CompletionQuery, DiagnosticKind, EngineError};

use crate::relay::DiagnosticRelay;

/// Owns the parsed unit of one file.
///
/// Only the session worker touches a store once the session is built, so the
/// unit is never observed half way through a reparse. Engine failures are
/// relayed as diagnostics and turned into `false` or an empty list;
/// [`Cancelled`] is the only error and belongs to the coordinator.
pub struct ParsedUnitStore<E> {
	engine: E,
	filename: PathBuf,
	options: CompletionOptions,
	reparse_passes: u32,
}

impl<E: AnalysisEngine> ParsedUnitStore<E> {
	pub fn new(engine: E, filename: PathBuf, options: CompletionOptions, reparse_passes: u32) -> Self {
		Self {
			engine,
			filename,
			options,
			reparse_passes: reparse_passes.max(1),
		}
	}

	pub fn filename(&self) -> &Path {
		&self.filename
	}

	/// Re-runs analysis against the file on disk, replacing the held unit.
	pub fn reparse(&mut self, relay: &mut DiagnosticRelay, token: &CancelToken) -> Result<bool, Cancelled> {
		for pass in 1..=self.reparse_passes {
			tracing::debug!(file = %self.filename.display(), pass, generation = token.generation(), "session.store.reparse");
			match self.engine.reparse(relay, token) {
				Ok(()) => {}
				Err(EngineError::Cancelled) => return Err(Cancelled),
				Err(error) => {
					relay.report_failure(DiagnosticKind::Error, &format!("reparse of {} failed: {error}", self.filename.display()));
					return Ok(false);
				}
			}
		}
		Ok(true)
	}

	/// Candidates at the 1-based `row`/`column` of `buffer`.
	///
	/// `buffer` stands in for the file's content during this call only.
	/// Candidates that are not available or not accessible are dropped; the
	/// rest are stably sorted by ascending priority, so equal priorities keep
	/// the engine's order.
	pub fn complete_at(&mut self, buffer: &str, row: u32, column: u32, relay: &mut DiagnosticRelay, token: &CancelToken) -> Result<Vec<CompletionCandidate>, Cancelled> {
		let query = CompletionQuery {
			filename: &self.filename,
			buffer,
			row,
			column,
			options: self.options,
		};
		tracing::debug!(file = %self.filename.display(), row, column, generation = token.generation(), "session.store.complete");
		match self.engine.complete_at(&query, relay, token) {
			Ok(mut candidates) => {
				candidates.retain(|candidate| candidate.availability.is_offerable());
				candidates.sort_by_key(|candidate| candidate.priority);
				Ok(candidates)
			}
			Err(EngineError::Cancelled) => Err(Cancelled),
			Err(error) => {
				relay.report_failure(DiagnosticKind::Error, &format!("completion in {} failed: {error}", self.filename.display()));
				Ok(Vec::new())
			}
		}
	}

	/// Writes the unit to `path`, creating parent directories. Failures are
	/// logged and reported as `false`.
	pub fn persist(&self, path: &Path) -> bool {
		if let Some(parent) = path.parent()
			&& let Err(error) = std::fs::create_dir_all(parent)
		{
			tracing::warn!(path = %parent.display(), %error, "session.store.persist_failed");
			return false;
		}
		match self.engine.save(path) {
			Ok(()) => {
				tracing::debug!(file = %self.filename.display(), path = %path.display(), "session.store.persisted");
				true
			}
			Err(error) => {
				tracing::warn!(file = %self.filename.display(), path = %path.display(), %error, "session.store.persist_failed");
				false
			}
		}
	}
}
