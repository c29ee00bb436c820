use crate::coordinator::SlotPhase;

/// Decision taken for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
	/// Write the job into the empty slot.
	Accept,
	/// Refuse the job; its delivery never runs.
	Reject,
	/// Overwrite the queued job, which is discarded without delivery.
	Replace,
	/// Cancel the running job, wait for its acknowledgement, then re-evaluate.
	Preempt,
}

/// Strategy deciding what happens to a submission given the slot phase.
pub trait AdmissionPolicy: Send + Sync + 'static {
	/// Short name used in logs.
	fn name(&self) -> &'static str;

	/// Decides the fate of a submission arriving while the slot is in `phase`.
	fn admit(&self, phase: SlotPhase) -> Admission;
}

/// Refuses submissions whenever a job is queued or running.
///
/// The submitter never blocks. Callers treat a rejection as "try again on the
/// next keystroke".
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectIfBusy;

impl AdmissionPolicy for RejectIfBusy {
	fn name(&self) -> &'static str {
		"reject-if-busy"
	}

	fn admit(&self, phase: SlotPhase) -> Admission {
		match phase {
			SlotPhase::Idle => Admission::Accept,
			SlotPhase::Queued | SlotPhase::Running => Admission::Reject,
		}
	}
}

/// Latest submission wins.
///
/// A queued job is replaced in place. A running job is asked to cancel and the
/// submitter blocks until the worker has let go of it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreemptRunning;

impl AdmissionPolicy for PreemptRunning {
	fn name(&self) -> &'static str {
		"preempt"
	}

	fn admit(&self, phase: SlotPhase) -> Admission {
		match phase {
			SlotPhase::Idle => Admission::Accept,
			SlotPhase::Queued => Admission::Replace,
			SlotPhase::Running => Admission::Preempt,
		}
	}
}
