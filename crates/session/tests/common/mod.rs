#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use clara_build_config::BuildConfigCache;
use clara_engine::testing::{Script, ScriptedEngine, ScriptedFactory};
use clara_session::{CompletionResult, Diagnostic, Session, SessionError, SessionEvent, SessionObserver, SessionOptions};
use parking_lot::Mutex;
use tempfile::TempDir;

pub const TIMEOUT: Duration = Duration::from_secs(5);
pub const QUIET: Duration = Duration::from_millis(150);

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Polls `condition` until it holds, panicking after [`TIMEOUT`].
pub fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
	let deadline = Instant::now() + TIMEOUT;
	while !condition() {
		assert!(Instant::now() < deadline, "timed out waiting for {what}");
		std::thread::sleep(Duration::from_millis(1));
	}
}

/// Observer keeping every event; completion results are also sent to a channel.
pub struct Recorder {
	events: Mutex<Vec<SessionEvent>>,
	results: Sender<CompletionResult>,
}

impl Recorder {
	pub fn new() -> (Arc<Self>, Receiver<CompletionResult>) {
		let (results, rx) = mpsc::channel();
		let recorder = Arc::new(Self {
			events: Mutex::new(Vec::new()),
			results,
		});
		(recorder, rx)
	}

	pub fn events(&self) -> Vec<SessionEvent> {
		self.events.lock().clone()
	}

	pub fn diagnostics(&self) -> Vec<Diagnostic> {
		self.events()
			.into_iter()
			.filter_map(|event| match event {
				SessionEvent::Diagnostic(diagnostic) => Some(diagnostic),
				_ => None,
			})
			.collect()
	}

	pub fn logs(&self) -> Vec<String> {
		self.events()
			.into_iter()
			.filter_map(|event| match event {
				SessionEvent::Log(message) => Some(message),
				_ => None,
			})
			.collect()
	}

	pub fn reparsed(&self) -> Vec<bool> {
		self.events()
			.into_iter()
			.filter_map(|event| match event {
				SessionEvent::Reparsed(success) => Some(success),
				_ => None,
			})
			.collect()
	}
}

impl SessionObserver for Recorder {
	fn on_completion_result(&self, result: CompletionResult) {
		self.events.lock().push(SessionEvent::Completion(result.clone()));
		let _ = self.results.send(result);
	}

	fn on_diagnostic(&self, diagnostic: Diagnostic) {
		self.events.lock().push(SessionEvent::Diagnostic(diagnostic));
	}

	fn on_log(&self, message: &str) {
		self.events.lock().push(SessionEvent::Log(message.to_string()));
	}

	fn on_reparsed(&self, success: bool) {
		self.events.lock().push(SessionEvent::Reparsed(success));
	}

	fn on_pass_begin(&self, file: &Path) {
		self.events.lock().push(SessionEvent::PassBegin(file.to_path_buf()));
	}

	fn on_pass_end(&self) {
		self.events.lock().push(SessionEvent::PassEnd);
	}
}

/// A source file in a temporary directory plus a scripted engine.
pub struct Fixture {
	pub dir: TempDir,
	pub source: PathBuf,
	pub script: Script,
	pub factory: ScriptedFactory,
	pub build_config: Arc<BuildConfigCache>,
	pub recorder: Arc<Recorder>,
	pub results: Receiver<CompletionResult>,
}

impl Fixture {
	pub fn new() -> Self {
		init_tracing();
		let dir = tempfile::tempdir().expect("tempdir");
		let source = dir.path().join("main.cpp");
		std::fs::write(&source, "int main() {\n\treturn 0;\n}\n").expect("write source");
		let script = Script::new();
		let (recorder, results) = Recorder::new();
		Self {
			dir,
			factory: ScriptedFactory::new(script.clone()),
			script,
			source,
			build_config: Arc::new(BuildConfigCache::new()),
			recorder,
			results,
		}
	}

	/// Options with explicit flags and the cache inside the fixture directory.
	pub fn options(&self) -> SessionOptions {
		let mut options = SessionOptions::new(&self.source);
		options.flags = Some(vec!["-std=c++17".to_string()]);
		options.cache.directory = Some(self.dir.path().join("cache"));
		options
	}

	pub fn try_session(&self, options: SessionOptions) -> Result<Session<ScriptedEngine>, SessionError> {
		Session::new(options, Arc::clone(&self.build_config), &self.factory, self.recorder.clone())
	}

	pub fn session(&self, options: SessionOptions) -> Session<ScriptedEngine> {
		match self.try_session(options) {
			Ok(session) => session,
			Err(error) => panic!("session construction failed: {error}"),
		}
	}

	pub fn recv(&self) -> CompletionResult {
		self.results.recv_timeout(TIMEOUT).expect("completion result")
	}

	/// Asserts no further result arrives for a short while.
	pub fn assert_quiet(&self) {
		if let Ok(result) = self.results.recv_timeout(QUIET) {
			panic!("unexpected result {result:?}");
		}
	}

	pub fn wait_for_started(&self, count: usize) {
		wait_until("completion pass to start", || self.script.calls().completions_started >= count);
	}
}
