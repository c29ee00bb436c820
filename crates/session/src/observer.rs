//! What a session reports to its host.

use std::path::{Path, PathBuf};

use clara_engine::{DiagnosticKind, PresumedLocation};
use tokio::sync::mpsc;

/// One formatted completion, the only candidate shape leaving a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormattedResult {
	/// Shown in the completion list: typed text, then `\t` and a summary.
	pub label: String,
	/// Snippet inserted on selection, with `${N:...}` tab-stops.
	pub insertion_text: String,
}

impl FormattedResult {
	pub fn new(label: impl Into<String>, insertion_text: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			insertion_text: insertion_text.into(),
		}
	}
}

/// Results of one accepted completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
	pub request_id: u64,
	pub row: u32,
	pub column: u32,
	/// Possibly empty when the pass failed.
	pub results: Vec<FormattedResult>,
}

/// Diagnostic forwarded while a pass runs.
///
/// Unknown locations are reported as `filename = ""`, `line = -1`,
/// `column = -1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
	pub filename: String,
	pub kind: DiagnosticKind,
	pub line: i64,
	pub column: i64,
	pub message: String,
}

impl Diagnostic {
	pub fn new(kind: DiagnosticKind, location: Option<&PresumedLocation>, message: impl Into<String>) -> Self {
		let (filename, line, column) = match location {
			Some(location) => (location.filename.clone(), i64::from(location.line), i64::from(location.column)),
			None => (String::new(), -1, -1),
		};
		Self {
			filename,
			kind,
			line,
			column,
			message: message.into(),
		}
	}

	/// Returns true when the engine could not resolve a location.
	pub fn has_location(&self) -> bool {
		self.line >= 0
	}
}

/// Receives everything a session reports.
///
/// Completion results, reparse outcomes and most diagnostics are delivered
/// on the session's worker thread; diagnostics of the initial parse arrive
/// on the thread constructing the session. Implementations must not assume
/// any particular thread.
pub trait SessionObserver: Send + Sync + 'static {
	/// An accepted completion request finished. Not called for rejected or
	/// cancelled requests, nor for requests submitted with a callback.
	fn on_completion_result(&self, result: CompletionResult);

	fn on_diagnostic(&self, diagnostic: Diagnostic);

	/// Status notices such as "parsing" or configuration fallbacks.
	fn on_log(&self, message: &str);

	/// A reparse request finished.
	fn on_reparsed(&self, _success: bool) {}

	/// An analysis pass over `file` starts. Diagnostics reported before this
	/// call belong to an earlier pass and are superseded by the ones that
	/// follow.
	fn on_pass_begin(&self, _file: &Path) {}

	/// The pass announced by the last [`SessionObserver::on_pass_begin`] is
	/// over.
	fn on_pass_end(&self) {}
}

/// A session notification as a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
	Completion(CompletionResult),
	Diagnostic(Diagnostic),
	Log(String),
	Reparsed(bool),
	PassBegin(PathBuf),
	PassEnd,
}

/// Observer forwarding every notification into an unbounded channel.
///
/// Lets an async host consume session output from its own task instead of
/// reacting on the worker thread.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
	tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelObserver {
	pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self { tx }, rx)
	}

	fn send(&self, event: SessionEvent) {
		if self.tx.send(event).is_err() {
			tracing::trace!("session.observer.receiver_dropped");
		}
	}
}

impl SessionObserver for ChannelObserver {
	fn on_completion_result(&self, result: CompletionResult) {
		self.send(SessionEvent::Completion(result));
	}

	fn on_diagnostic(&self, diagnostic: Diagnostic) {
		self.send(SessionEvent::Diagnostic(diagnostic));
	}

	fn on_log(&self, message: &str) {
		self.send(SessionEvent::Log(message.to_string()));
	}

	fn on_reparsed(&self, success: bool) {
		self.send(SessionEvent::Reparsed(success));
	}

	fn on_pass_begin(&self, file: &Path) {
		self.send(SessionEvent::PassBegin(file.to_path_buf()));
	}

	fn on_pass_end(&self) {
		self.send(SessionEvent::PassEnd);
	}
}
