use std::path::{Path, PathBuf};
use std::sync::Arc;

use clara_build_config::{BuildConfigCache, ResolvedFlags};
use clara_engine::{AnalysisEngine, CancelToken, EngineFactory, Invocation};
use clara_worker::{CoordinatorStats, JobCoordinator, PreemptRunning, RejectIfBusy, SlotPhase, SubmitError, SubmitOutcome};

use crate::error::{Result, SessionError};
use crate::format::ResultFormatter;
use crate::invocation::build_invocation;
use crate::observer::{CompletionResult, SessionObserver};
use crate::options::{PolicyKind, SessionOptions};
use crate::relay::DiagnosticRelay;
use crate::runner::{CompletionJob, Job, SessionRunner};
use crate::store::ParsedUnitStore;
use crate::unit_cache::{self, Freshness};

/// Completion service for one file under edit.
///
/// Construction resolves compiler flags, then restores the parsed unit from
/// the semantic-model cache or parses the file. The unit is moved onto a
/// dedicated worker thread; every later reparse and completion runs there,
/// one at a time. Dropping the session stops and joins the worker before the
/// unit is released.
///
/// Submitting after [`Session::shutdown`] is a programming error and panics.
pub struct Session<E: AnalysisEngine> {
	filename: PathBuf,
	invocation: Invocation,
	cache_path: Option<PathBuf>,
	coordinator: JobCoordinator<SessionRunner<E>>,
}

impl<E: AnalysisEngine> Session<E> {
	/// Builds a session, parsing the file on the calling thread.
	///
	/// Diagnostics of the initial parse reach `observer` before this returns.
	pub fn new<F>(options: SessionOptions, build_config: Arc<BuildConfigCache>, factory: &F, observer: Arc<dyn SessionObserver>) -> Result<Self>
	where
		F: EngineFactory<Engine = E>,
	{
		let filename = options.filename.clone();
		tracing::info!(file = %filename.display(), policy = ?options.policy, "session.constructing");
		observer.on_log(&format!("parsing {}", filename.display()));

		let resolved = match &options.build_context {
			Some(context) if options.flags.as_ref().is_none_or(Vec::is_empty) => build_config.resolve(context, &filename),
			_ => ResolvedFlags::default(),
		};
		let invocation = build_invocation(&options, resolved, observer.as_ref());
		let cache_path = unit_cache::cache_path(&options.cache, &invocation.working_directory, &filename);

		let mut relay = DiagnosticRelay::new(Arc::clone(&observer));
		let mut engine = None;
		if let Some(path) = &cache_path {
			engine = restore(factory, path, &invocation, &mut relay, observer.as_ref());
		}
		let fresh_parse = engine.is_none();
		let engine = match engine {
			Some(engine) => engine,
			None => factory
				.parse(&invocation, &mut relay, &CancelToken::detached())
				.map_err(|source| SessionError::Parse { path: filename.clone(), source })?,
		};

		let store = ParsedUnitStore::new(engine, filename.clone(), invocation.completion, options.reparse_passes);
		if fresh_parse && let Some(path) = &cache_path {
			store.persist(path);
		}

		let runner = SessionRunner {
			store,
			relay,
			formatter: ResultFormatter::new(&options.completion),
			observer: Arc::clone(&observer),
			cache_path: cache_path.clone(),
		};
		let label = filename.file_name().map_or_else(|| filename.display().to_string(), |name| name.to_string_lossy().into_owned());
		let spawned = match options.policy {
			PolicyKind::RejectIfBusy => JobCoordinator::spawn(label, runner, RejectIfBusy),
			PolicyKind::Preempt => JobCoordinator::spawn(label, runner, PreemptRunning),
		};
		let coordinator = spawned.map_err(|error| SessionError::Spawn { path: filename.clone(), error })?;

		tracing::info!(file = %filename.display(), arguments = invocation.arguments.len(), "session.ready");
		observer.on_log(&format!("loaded {}", filename.display()));
		Ok(Self {
			filename,
			invocation,
			cache_path,
			coordinator,
		})
	}

	pub fn filename(&self) -> &Path {
		&self.filename
	}

	/// Compiler arguments the unit was built with.
	pub fn build_flags(&self) -> &[String] {
		&self.invocation.arguments
	}

	pub fn working_directory(&self) -> &Path {
		&self.invocation.working_directory
	}

	pub fn invocation(&self) -> &Invocation {
		&self.invocation
	}

	/// Where the parsed unit is cached, if caching is enabled.
	pub fn cache_path(&self) -> Option<&Path> {
		self.cache_path.as_deref()
	}

	/// Requests completions at the 1-based `row`/`column` of `buffer`; the
	/// result goes to the observer.
	///
	/// A [`SubmitOutcome::Rejected`] or [`SubmitOutcome::Superseded`] request
	/// never produces a result.
	pub fn submit(&self, request_id: u64, row: u32, column: u32, buffer: impl Into<String>) -> SubmitOutcome {
		self.submit_job(Job::Complete(CompletionJob {
			request_id,
			row,
			column,
			buffer: buffer.into(),
			delivery: None,
		}))
	}

	/// Like [`Session::submit`], delivering the result to `callback` instead
	/// of the observer. The callback runs on the worker thread and may submit
	/// again.
	pub fn submit_with<F>(&self, request_id: u64, row: u32, column: u32, buffer: impl Into<String>, callback: F) -> SubmitOutcome
	where
		F: FnOnce(CompletionResult) + Send + 'static,
	{
		self.submit_job(Job::Complete(CompletionJob {
			request_id,
			row,
			column,
			buffer: buffer.into(),
			delivery: Some(Box::new(callback)),
		}))
	}

	/// Reparses the file from disk, e.g. after it was saved. The outcome goes
	/// to [`SessionObserver::on_reparsed`].
	pub fn reparse(&self) -> SubmitOutcome {
		self.submit_job(Job::Reparse)
	}

	pub fn phase(&self) -> SlotPhase {
		self.coordinator.phase()
	}

	pub fn stats(&self) -> CoordinatorStats {
		self.coordinator.stats()
	}

	pub fn policy_name(&self) -> &'static str {
		self.coordinator.policy_name()
	}

	pub fn is_shut_down(&self) -> bool {
		self.coordinator.is_shut_down()
	}

	/// Stops and joins the worker, then releases the parsed unit. Idempotent.
	pub fn shutdown(&self) {
		if let Some(runner) = self.coordinator.shutdown_and_reclaim() {
			tracing::debug!(file = %self.filename.display(), "session.shutdown");
			drop(runner);
		}
	}

	fn submit_job(&self, job: Job) -> SubmitOutcome {
		match self.coordinator.submit(job) {
			Ok(outcome) => outcome,
			Err(SubmitError::Closed) => panic!("submitted work to the session for {} after shutdown", self.filename.display()),
		}
	}
}

impl<E: AnalysisEngine> Drop for Session<E> {
	fn drop(&mut self) {
		self.shutdown();
	}
}

/// Loads a cached unit if it is fresh, discarding it when unreadable.
fn restore<F: EngineFactory>(factory: &F, path: &Path, invocation: &Invocation, relay: &mut DiagnosticRelay, observer: &dyn SessionObserver) -> Option<F::Engine> {
	match unit_cache::freshness(path, &invocation.filename) {
		Freshness::Missing => None,
		Freshness::Stale => {
			tracing::debug!(path = %path.display(), "session.cache.stale");
			None
		}
		Freshness::Fresh => {
			observer.on_log(&format!("reading {}", path.display()));
			match factory.load(path, invocation, relay) {
				Ok(engine) => {
					tracing::info!(path = %path.display(), "session.cache.loaded");
					Some(engine)
				}
				Err(error) => {
					tracing::warn!(path = %path.display(), %error, "session.cache.unreadable");
					observer.on_log(&format!("discarding unreadable {}: {error}", path.display()));
					unit_cache::discard(path);
					None
				}
			}
		}
	}
}
