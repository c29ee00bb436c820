use std::path::{Path, PathBuf};
use std::sync::Arc;

use clara_engine::{DiagnosticKind, DiagnosticSink, PresumedLocation};

use crate::observer::{Diagnostic, SessionObserver};

/// Forwards engine diagnostics of the current pass to the observer.
///
/// Nothing is retained: each diagnostic is converted and handed over as soon
/// as the engine emits it. Pass boundaries are forwarded too, so the observer
/// can drop diagnostics of the previous pass.
pub struct DiagnosticRelay {
	observer: Arc<dyn SessionObserver>,
	pass: Option<PathBuf>,
	forwarded: usize,
}

impl DiagnosticRelay {
	pub fn new(observer: Arc<dyn SessionObserver>) -> Self {
		Self {
			observer,
			pass: None,
			forwarded: 0,
		}
	}

	/// Reports a failed pass as a diagnostic without location.
	pub fn report_failure(&mut self, kind: DiagnosticKind, text: &str) {
		tracing::warn!(kind = %kind, text, "session.relay.failure");
		self.forward(Diagnostic::new(kind, None, text));
	}

	/// Diagnostics forwarded since the last [`DiagnosticSink::begin_pass`].
	pub fn forwarded(&self) -> usize {
		self.forwarded
	}

	fn forward(&mut self, diagnostic: Diagnostic) {
		self.forwarded += 1;
		self.observer.on_diagnostic(diagnostic);
	}
}

impl DiagnosticSink for DiagnosticRelay {
	fn begin_pass(&mut self, file: &Path) {
		tracing::debug!(file = %file.display(), "session.relay.begin_pass");
		self.pass = Some(file.to_path_buf());
		self.forwarded = 0;
		self.observer.on_pass_begin(file);
	}

	fn on_diagnostic(&mut self, kind: DiagnosticKind, location: Option<PresumedLocation>, text: &str) {
		self.forward(Diagnostic::new(kind, location.as_ref(), text));
	}

	fn end_pass(&mut self) {
		if let Some(file) = self.pass.take() {
			tracing::debug!(file = %file.display(), forwarded = self.forwarded, "session.relay.end_pass");
			self.observer.on_pass_end();
		}
	}
}
