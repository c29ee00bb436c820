//! Completion sessions.
//!
//! A [`Session`] answers "what can follow the cursor here?" for one file under
//! edit. It owns the file's parsed unit, keeps it on a dedicated worker and
//! runs at most one reparse-and-complete job at a time. Submissions that find
//! the worker busy are refused or preempt the running job, depending on
//! [`PolicyKind`]. Raw candidates are filtered, ordered and turned into
//! [`FormattedResult`]s before they leave the session.
//!
//! Hosts receive results, diagnostics and status notices through a
//! [`SessionObserver`]; [`ChannelObserver`] turns them into a stream of
//! [`SessionEvent`]s.

mod error;
mod format;
mod invocation;
mod observer;
mod options;
mod relay;
mod runner;
mod session;
mod store;
mod unit_cache;

pub use clara_worker::{CoordinatorStats, SlotPhase, SubmitOutcome};
pub use error::{Result, SessionError};
pub use format::ResultFormatter;
pub use invocation::build_invocation;
pub use observer::{ChannelObserver, CompletionResult, Diagnostic, FormattedResult, SessionEvent, SessionObserver};
pub use options::{CacheOptions, CompletionToggles, OptionsError, PolicyKind, SessionOptions};
pub use relay::DiagnosticRelay;
pub use session::Session;
pub use store::ParsedUnitStore;
pub use unit_cache::{CACHE_DIR_NAME, Freshness};
