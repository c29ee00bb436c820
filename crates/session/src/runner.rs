use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;

use clara_engine::{AnalysisEngine, CancelToken, Cancelled, DiagnosticKind};
use clara_worker::{JobRunner, panic_message};

use crate::format::ResultFormatter;
use crate::observer::{CompletionResult, SessionObserver};
use crate::relay::DiagnosticRelay;
use crate::store::ParsedUnitStore;

/// Per-request result consumer, used instead of the observer.
pub type Delivery = Box<dyn FnOnce(CompletionResult) + Send + 'static>;

/// A completion request waiting in, or taken from, the job slot.
pub struct CompletionJob {
	pub request_id: u64,
	pub row: u32,
	pub column: u32,
	pub buffer: String,
	pub delivery: Option<Delivery>,
}

/// Work a session hands to its worker.
pub enum Job {
	/// Reparse, then complete at the cursor.
	Complete(CompletionJob),
	/// Reparse after the file changed on disk, then refresh the cache.
	Reparse,
}

pub enum JobOutput {
	Completion { result: CompletionResult, delivery: Option<Delivery> },
	Reparsed(bool),
}

/// The session side of the worker: everything the worker thread owns.
pub struct SessionRunner<E> {
	pub(crate) store: ParsedUnitStore<E>,
	pub(crate) relay: DiagnosticRelay,
	pub(crate) formatter: ResultFormatter,
	pub(crate) observer: Arc<dyn SessionObserver>,
	pub(crate) cache_path: Option<PathBuf>,
}

impl<E: AnalysisEngine> SessionRunner<E> {
	fn complete(&mut self, job: &CompletionJob, token: &CancelToken) -> Result<CompletionResult, Cancelled> {
		let outcome = catch_unwind(AssertUnwindSafe(|| -> Result<_, Cancelled> {
			self.store.reparse(&mut self.relay, token)?;
			let candidates = self.store.complete_at(&job.buffer, job.row, job.column, &mut self.relay, token)?;
			Ok(self.formatter.format_all(&candidates))
		}));
		let results = match outcome {
			Ok(results) => results?,
			Err(payload) => {
				let message = panic_message(&*payload);
				tracing::error!(file = %self.store.filename().display(), request_id = job.request_id, panic = message, "session.runner.completion_panicked");
				self.relay.report_failure(DiagnosticKind::Fatal, &format!("completion pass panicked: {message}"));
				Vec::new()
			}
		};
		Ok(CompletionResult {
			request_id: job.request_id,
			row: job.row,
			column: job.column,
			results,
		})
	}

	fn reparse(&mut self, token: &CancelToken) -> Result<bool, Cancelled> {
		self.observer.on_log(&format!("reparsing {}", self.store.filename().display()));
		let outcome = catch_unwind(AssertUnwindSafe(|| self.store.reparse(&mut self.relay, token)));
		let success = match outcome {
			Ok(success) => success?,
			Err(payload) => {
				let message = panic_message(&*payload);
				tracing::error!(file = %self.store.filename().display(), panic = message, "session.runner.reparse_panicked");
				self.relay.report_failure(DiagnosticKind::Fatal, &format!("reparse panicked: {message}"));
				false
			}
		};
		if success && let Some(path) = &self.cache_path {
			self.store.persist(path);
		}
		Ok(success)
	}
}

impl<E: AnalysisEngine> JobRunner for SessionRunner<E> {
	type Job = Job;
	type Output = JobOutput;

	fn run(&mut self, job: Job, token: &CancelToken) -> Result<JobOutput, Cancelled> {
		match job {
			Job::Complete(job) => {
				tracing::debug!(request_id = job.request_id, row = job.row, column = job.column, "session.runner.complete");
				let result = self.complete(&job, token)?;
				Ok(JobOutput::Completion {
					result,
					delivery: job.delivery,
				})
			}
			Job::Reparse => self.reparse(token).map(JobOutput::Reparsed),
		}
	}

	fn deliver(&mut self, output: JobOutput) {
		match output {
			JobOutput::Completion {
				result,
				delivery: Some(delivery),
			} => delivery(result),
			JobOutput::Completion { result, delivery: None } => self.observer.on_completion_result(result),
			JobOutput::Reparsed(success) => self.observer.on_reparsed(success),
		}
	}

	fn finish(&mut self) {
		tracing::debug!(file = %self.store.filename().display(), "session.runner.finished");
	}
}
