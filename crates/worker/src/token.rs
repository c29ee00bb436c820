use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Monotonic generation clock for accepted jobs.
#[derive(Debug, Default, Clone)]
pub struct GenerationClock {
	next: Arc<AtomicU64>,
}

impl GenerationClock {
	/// Creates a new generation clock starting at generation 1.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the next generation ID.
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}
}

/// A pass stopped early because its token was cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("cancelled")
	}
}

impl std::error::Error for Cancelled {}

/// Generation-scoped cooperative cancellation token.
///
/// Engines poll [`CancelToken::checkpoint`] at coarse boundaries (one top-level
/// declaration at a time); nothing interrupts a pass asynchronously.
#[derive(Debug, Clone)]
pub struct CancelToken {
	generation: u64,
	cancel: CancellationToken,
}

impl CancelToken {
	/// Creates a new token for `generation`.
	pub fn new(generation: u64) -> Self {
		Self {
			generation,
			cancel: CancellationToken::new(),
		}
	}

	/// Token for work that is never preempted, such as the initial parse.
	pub fn detached() -> Self {
		Self::new(0)
	}

	/// Returns generation ID.
	pub const fn generation(&self) -> u64 {
		self.generation
	}

	/// Returns true when cancellation is requested.
	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Requests cancellation.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Returns `Err(Cancelled)` once cancellation is requested.
	pub fn checkpoint(&self) -> Result<(), Cancelled> {
		if self.is_cancelled() { Err(Cancelled) } else { Ok(()) }
	}
}
