use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{JoinHandle, ThreadId};

use parking_lot::{Condvar, Mutex};

use crate::policy::{Admission, AdmissionPolicy};
use crate::spawn::spawn_named_thread;
use crate::token::{CancelToken, Cancelled, GenerationClock};


/// Work executed on the coordinator's dedicated thread.
///
/// The runner is moved into the worker thread and only comes back through
/// [`JobCoordinator::shutdown_and_reclaim`] once that thread has joined.
/// Whatever it owns is therefore touched by exactly one thread and cannot be
/// released while a job still uses it.
pub trait JobRunner: Send + 'static {
	/// One unit of submitted work.
	type Job: Send + 'static;
	/// Result of a job that ran to completion.
	type Output: Send + 'static;

	/// Executes one job. Long passes poll `token` and bail out with [`Cancelled`].
	fn run(&mut self, job: Self::Job, token: &CancelToken) -> Result<Self::Output, Cancelled>;

	/// Hands a finished job's output to its consumer.
	///
	/// Runs on the worker thread after the slot went back to idle and outside
	/// the coordinator lock, so the consumer may submit follow-up work.
	fn deliver(&mut self, output: Self::Output);

	/// Called once on the worker thread right before it exits.
	fn finish(&mut self) {}
}

/// Occupancy of the single job slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPhase {
	/// Slot empty, worker parked on the condition variable.
	Idle,
	/// A job sits in the slot and the worker has not picked it up yet.
	Queued,
	/// The worker is executing a job; the slot itself is empty.
	Running,
}

/// Result of [`JobCoordinator::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
	/// Written into an empty slot.
	Accepted,
	/// Overwrote a queued job, which will never be delivered.
	Replaced,
	/// The running job was cancelled first; this job now holds the slot.
	Preempted,
	/// Refused; the job was dropped without delivery.
	Rejected,
	/// A later submission arrived while this one waited for a preempted job;
	/// the job was dropped without delivery.
	Superseded,
}

impl SubmitOutcome {
	/// Returns true if the job will run.
	pub const fn is_accepted(self) -> bool {
		!matches!(self, Self::Rejected | Self::Superseded)
	}
}

/// Submission error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
	/// The coordinator has been shut down.
	Closed,
}

impl std::fmt::Display for SubmitError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Closed => f.write_str("job coordinator is shut down"),
		}
	}
}

impl std::error::Error for SubmitError {}

/// Counters describing what happened to submitted jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
	pub accepted: u64,
	pub rejected: u64,
	pub replaced: u64,
	pub preempted: u64,
	pub superseded: u64,
	pub completed: u64,
	pub cancelled: u64,
	pub panicked: u64,
}

struct PendingJob<J> {
	generation: u64,
	job: J,
	span: tracing::Span,
}

struct RunningJob {
	token: CancelToken,
}

struct SlotState<J> {
	pending: Option<PendingJob<J>>,
	running: Option<RunningJob>,
	stopping: bool,
	/// Arrival counter; the highest value belongs to the latest submitter.
	submissions: u64,
	stats: CoordinatorStats,
}

impl<J> SlotState<J> {
	fn phase(&self) -> SlotPhase {
		if self.pending.is_some() {
			SlotPhase::Queued
		} else if self.running.is_some() {
			SlotPhase::Running
		} else {
			SlotPhase::Idle
		}
	}
}

struct Shared<J> {
	state: Mutex<SlotState<J>>,
	/// Wakes the worker on new work or shutdown, and preempting submitters when
	/// the running job is released.
	changed: Condvar,
}

/// Single-flight job coordinator backed by one dedicated thread.
///
/// At most one job runs at a time and at most one waits in the slot. What
/// happens to a submission that finds the slot occupied is decided by the
/// [`AdmissionPolicy`] chosen at spawn time. Outputs are delivered in the order
/// jobs were accepted.
pub struct JobCoordinator<R: JobRunner> {
	label: String,
	shared: Arc<Shared<R::Job>>,
	policy: Box<dyn AdmissionPolicy>,
	clock: GenerationClock,
	worker: Mutex<Option<JoinHandle<R>>>,
	worker_id: ThreadId,
}

impl<R: JobRunner> JobCoordinator<R> {
	/// Moves `runner` onto a new thread named `clara-worker:<label>`.
	pub fn spawn(label: impl Into<String>, runner: R, policy: impl AdmissionPolicy) -> std::io::Result<Self> {
		let label = label.into();
		let shared = Arc::new(Shared {
			state: Mutex::new(SlotState {
				pending: None,
				running: None,
				stopping: false,
				submissions: 0,
				stats: CoordinatorStats::default(),
			}),
			changed: Condvar::new(),
		});

		let worker_shared = Arc::clone(&shared);
		let worker_label = label.clone();
		let handle = spawn_named_thread(format!("clara-worker:{label}"), move || worker_loop(&worker_label, &worker_shared, runner))?;
		let worker_id = handle.thread().id();
		tracing::debug!(worker = %label, policy = policy.name(), "worker.coordinator.spawned");

		Ok(Self {
			label,
			shared,
			policy: Box::new(policy),
			clock: GenerationClock::new(),
			worker: Mutex::new(Some(handle)),
			worker_id,
		})
	}

	/// Submits a job according to the admission policy.
	///
	/// Never blocks under [`RejectIfBusy`](crate::RejectIfBusy). Under
	/// [`PreemptRunning`](crate::PreemptRunning) it blocks until a running job
	/// has acknowledged cancellation. A submitter that wakes up to find a later
	/// submission ahead of it reports [`SubmitOutcome::Superseded`]; one that
	/// wakes up to a shutdown reports [`SubmitOutcome::Rejected`].
	///
	/// Returns [`SubmitError::Closed`] only when shutdown was requested before
	/// the call.
	pub fn submit(&self, job: R::Job) -> Result<SubmitOutcome, SubmitError> {
		let mut state = self.shared.state.lock();
		if state.stopping {
			return Err(SubmitError::Closed);
		}
		state.submissions += 1;
		let ticket = state.submissions;
		let mut preempted = false;

		loop {
			if preempted {
				if state.stopping {
					state.stats.rejected += 1;
					drop(state);
					tracing::trace!(worker = %self.label, ticket, "worker.coordinator.closed_while_preempting");
					return Ok(SubmitOutcome::Rejected);
				}
				if state.submissions != ticket {
					state.stats.superseded += 1;
					let latest = state.submissions;
					drop(state);
					tracing::trace!(worker = %self.label, ticket, latest, "worker.coordinator.superseded");
					return Ok(SubmitOutcome::Superseded);
				}
			}

			match self.policy.admit(state.phase()) {
				Admission::Accept => {
					let generation = self.clock.next();
					state.pending = Some(PendingJob {
						generation,
						job,
						span: tracing::Span::current(),
					});
					state.stats.accepted += 1;
					let outcome = if preempted {
						state.stats.preempted += 1;
						SubmitOutcome::Preempted
					} else {
						SubmitOutcome::Accepted
					};
					drop(state);
					self.shared.changed.notify_all();
					tracing::trace!(worker = %self.label, generation, ?outcome, "worker.coordinator.submit");
					return Ok(outcome);
				}
				Admission::Reject => {
					state.stats.rejected += 1;
					drop(state);
					tracing::trace!(worker = %self.label, policy = self.policy.name(), "worker.coordinator.rejected");
					return Ok(SubmitOutcome::Rejected);
				}
				Admission::Replace => {
					let generation = self.clock.next();
					let previous = state.pending.replace(PendingJob {
						generation,
						job,
						span: tracing::Span::current(),
					});
					state.stats.accepted += 1;
					state.stats.replaced += 1;
					drop(state);
					self.shared.changed.notify_all();
					if let Some(previous) = previous {
						tracing::trace!(worker = %self.label, replaced = previous.generation, generation, "worker.coordinator.replaced");
					}
					return Ok(SubmitOutcome::Replaced);
				}
				Admission::Preempt => {
					let Some(running) = state.running.as_ref() else {
						continue;
					};
					let target = running.token.generation();
					running.token.cancel();
					preempted = true;
					tracing::trace!(worker = %self.label, generation = target, "worker.coordinator.preempting");
					while !state.stopping && state.running.as_ref().is_some_and(|r| r.token.generation() == target) {
						self.shared.changed.wait(&mut state);
					}
				}
			}
		}
	}

	/// Current occupancy of the slot.
	pub fn phase(&self) -> SlotPhase {
		self.shared.state.lock().phase()
	}

	/// Snapshot of the job counters.
	pub fn stats(&self) -> CoordinatorStats {
		self.shared.state.lock().stats
	}

	/// Returns true once shutdown has been requested.
	pub fn is_shut_down(&self) -> bool {
		self.shared.state.lock().stopping
	}

	/// Name of the admission policy in use.
	pub fn policy_name(&self) -> &'static str {
		self.policy.name()
	}

	/// Stops the worker and waits for it to exit. Idempotent.
	pub fn shutdown(&self) {
		drop(self.shutdown_and_reclaim());
	}

	/// Stops the worker, joins it and returns the runner.
	///
	/// A running job is asked to cancel and a queued job is discarded. Only
	/// the call that performs the join gets the runner back; later calls
	/// return `None` immediately. Called from the worker thread itself (from
	/// inside [`JobRunner::deliver`]) it only signals, since a thread cannot
	/// join itself.
	pub fn shutdown_and_reclaim(&self) -> Option<R> {
		{
			let mut state = self.shared.state.lock();
			state.stopping = true;
			if let Some(running) = state.running.as_ref() {
				running.token.cancel();
			}
		}
		self.shared.changed.notify_all();

		if std::thread::current().id() == self.worker_id {
			tracing::warn!(worker = %self.label, "worker.coordinator.shutdown_from_worker_thread");
			return None;
		}

		let handle = self.worker.lock().take()?;
		match handle.join() {
			Ok(runner) => {
				tracing::debug!(worker = %self.label, "worker.coordinator.joined");
				Some(runner)
			}
			Err(payload) => {
				tracing::error!(worker = %self.label, panic = panic_message(&*payload), "worker.coordinator.join_failed");
				None
			}
		}
	}
}

impl<R: JobRunner> Drop for JobCoordinator<R> {
	fn drop(&mut self) {
		self.shutdown();
	}
}

fn worker_loop<R: JobRunner>(label: &str, shared: &Shared<R::Job>, mut runner: R) -> R {
	loop {
		let next = {
			let mut state = shared.state.lock();
			loop {
				if state.stopping {
					break None;
				}
				if let Some(pending) = state.pending.take() {
					let token = CancelToken::new(pending.generation);
					state.running = Some(RunningJob { token: token.clone() });
					break Some((pending, token));
				}
				shared.changed.wait(&mut state);
			}
		};
		let Some((PendingJob { generation, job, span }, token)) = next else {
			break;
		};

		let _entered = span.enter();
		tracing::trace!(worker = %label, generation, "worker.coordinator.run");
		let outcome = catch_unwind(AssertUnwindSafe(|| runner.run(job, &token)));

		{
			let mut state = shared.state.lock();
			state.running = None;
			match &outcome {
				Ok(Ok(_)) => state.stats.completed += 1,
				Ok(Err(Cancelled)) => state.stats.cancelled += 1,
				Err(_) => state.stats.panicked += 1,
			}
		}
		shared.changed.notify_all();

		match outcome {
			Ok(Ok(output)) => {
				if let Err(payload) = catch_unwind(AssertUnwindSafe(|| runner.deliver(output))) {
					tracing::error!(worker = %label, generation, panic = panic_message(&*payload), "worker.coordinator.deliver_panicked");
				}
			}
			Ok(Err(Cancelled)) => tracing::debug!(worker = %label, generation, "worker.coordinator.cancelled"),
			Err(payload) => tracing::error!(worker = %label, generation, panic = panic_message(&*payload), "worker.coordinator.job_panicked"),
		}
	}

	let discarded = shared.state.lock().pending.take();
	if let Some(pending) = discarded {
		tracing::debug!(worker = %label, generation = pending.generation, "worker.coordinator.discarded_on_shutdown");
	}
	runner.finish();
	runner
}

/// Best-effort text of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		msg
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		msg.as_str()
	} else {
		"<non-string panic payload>"
	}
}
