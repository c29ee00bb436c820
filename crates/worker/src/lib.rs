//! Worker primitives for single-flight background jobs.
//!
//! A [`JobCoordinator`] owns one dedicated OS thread and one job slot. Jobs are
//! admitted through an [`AdmissionPolicy`]: [`RejectIfBusy`] refuses work while
//! the slot is occupied, [`PreemptRunning`] cancels the running job and waits
//! for it to acknowledge before taking its place. Cancellation is cooperative
//! and flows through [`CancelToken`].

mod coordinator;
mod policy;
mod spawn;
mod token;

pub use coordinator::{CoordinatorStats, JobCoordinator, JobRunner, SlotPhase, SubmitError, SubmitOutcome, panic_message};
pub use policy::{Admission, AdmissionPolicy, PreemptRunning, RejectIfBusy};
pub use spawn::spawn_named_thread;
pub use token::{CancelToken, Cancelled, GenerationClock};
