//! Deterministic engine for exercising sessions without a real analyzer.
//!
//! A [`Script`] is shared between the test and every engine built from its
//! [`ScriptedFactory`], so behaviour can be changed while a session runs and
//! calls can be inspected afterwards.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{
	AnalysisEngine, CancelToken, CompletionCandidate, CompletionOptions, CompletionQuery, DiagnosticKind, DiagnosticSink, EngineError, EngineFactory, Invocation,
	PresumedLocation, Result,
};

/// Diagnostic emitted on every pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedDiagnostic {
	pub kind: DiagnosticKind,
	pub location: Option<PresumedLocation>,
	pub text: String,
}

/// Completion query as the engine saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedQuery {
	pub filename: PathBuf,
	pub buffer: String,
	pub row: u32,
	pub column: u32,
	pub options: CompletionOptions,
}

/// Call counters.
#[derive(Debug, Clone, Default)]
pub struct ScriptCalls {
	pub parses: usize,
	pub loads: usize,
	pub reparses: usize,
	pub saves: usize,
	pub completions_started: usize,
	pub completions_finished: usize,
	pub last_invocation: Option<Invocation>,
	pub last_query: Option<RecordedQuery>,
}

#[derive(Debug, Default)]
struct ScriptState {
	candidates: Vec<CompletionCandidate>,
	diagnostics: Vec<ScriptedDiagnostic>,
	fail_parse: Option<String>,
	fail_reparse: Option<String>,
	fail_complete: Option<String>,
	panic_complete: bool,
	declarations: usize,
	held: bool,
	calls: ScriptCalls,
}

/// Shared, mutable behaviour of scripted engines.
#[derive(Debug, Clone, Default)]
pub struct Script {
	state: Arc<Mutex<ScriptState>>,
}

impl Script {
	pub fn new() -> Self {
		Self::default()
	}

	/// Candidates returned, unsorted and unfiltered, by every completion pass.
	pub fn set_candidates(&self, candidates: Vec<CompletionCandidate>) {
		self.state.lock().candidates = candidates;
	}

	pub fn push_diagnostic(&self, kind: DiagnosticKind, location: Option<PresumedLocation>, text: impl Into<String>) {
		self.state.lock().diagnostics.push(ScriptedDiagnostic {
			kind,
			location,
			text: text.into(),
		});
	}

	pub fn fail_parse(&self, reason: impl Into<String>) {
		self.state.lock().fail_parse = Some(reason.into());
	}

	pub fn fail_reparse(&self, reason: impl Into<String>) {
		self.state.lock().fail_reparse = Some(reason.into());
	}

	pub fn fail_complete(&self, reason: impl Into<String>) {
		self.state.lock().fail_complete = Some(reason.into());
	}

	pub fn panic_on_complete(&self, panic: bool) {
		self.state.lock().panic_complete = panic;
	}

	pub fn clear_failures(&self) {
		let mut state = self.state.lock();
		state.fail_parse = None;
		state.fail_reparse = None;
		state.fail_complete = None;
		state.panic_complete = false;
	}

	/// Number of top-level declarations visited per pass, one checkpoint each.
	pub fn set_declarations(&self, declarations: usize) {
		self.state.lock().declarations = declarations;
	}

	/// Makes completion passes wait, polling their token, until [`Self::release`].
	pub fn hold(&self) {
		self.state.lock().held = true;
	}

	pub fn release(&self) {
		self.state.lock().held = false;
	}

	pub fn calls(&self) -> ScriptCalls {
		self.state.lock().calls.clone()
	}

	fn is_held(&self) -> bool {
		self.state.lock().held
	}

	fn run_pass(&self, file: &Path, failure: Option<String>, sink: &mut dyn DiagnosticSink, token: &CancelToken) -> Result<()> {
		let (diagnostics, declarations) = {
			let state = self.state.lock();
			(state.diagnostics.clone(), state.declarations)
		};

		sink.begin_pass(file);
		let result = (|| -> Result<()> {
			for diagnostic in &diagnostics {
				sink.on_diagnostic(diagnostic.kind, diagnostic.location.clone(), &diagnostic.text);
			}
			for _ in 0..declarations {
				token.checkpoint()?;
			}
			match failure {
				Some(reason) => Err(EngineError::Failed(reason)),
				None => Ok(()),
			}
		})();
		sink.end_pass();
		result
	}
}

/// Builds [`ScriptedEngine`]s.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFactory {
	script: Script,
}

impl ScriptedFactory {
	pub fn new(script: Script) -> Self {
		Self { script }
	}

	pub fn script(&self) -> &Script {
		&self.script
	}
}

#[derive(Serialize, Deserialize)]
struct SavedUnit {
	filename: PathBuf,
	candidates: Vec<CompletionCandidate>,
}

impl EngineFactory for ScriptedFactory {
	type Engine = ScriptedEngine;

	fn parse(&self, invocation: &Invocation, sink: &mut dyn DiagnosticSink, token: &CancelToken) -> Result<ScriptedEngine> {
		let failure = {
			let mut state = self.script.state.lock();
			state.calls.parses += 1;
			state.calls.last_invocation = Some(invocation.clone());
			state.fail_parse.clone()
		};
		self.script.run_pass(&invocation.filename, failure, sink, token)?;
		Ok(ScriptedEngine {
			script: self.script.clone(),
			filename: invocation.filename.clone(),
		})
	}

	fn load(&self, path: &Path, invocation: &Invocation, _sink: &mut dyn DiagnosticSink) -> Result<ScriptedEngine> {
		{
			let mut state = self.script.state.lock();
			state.calls.loads += 1;
			state.calls.last_invocation = Some(invocation.clone());
		}
		let bytes = std::fs::read(path).map_err(|error| EngineError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let saved: SavedUnit = serde_json::from_slice(&bytes).map_err(|e| EngineError::Unreadable {
			path: path.to_path_buf(),
			reason: e.to_string(),
		})?;
		if saved.filename != invocation.filename {
			return Err(EngineError::Unreadable {
				path: path.to_path_buf(),
				reason: format!("unit belongs to {}", saved.filename.display()),
			});
		}
		Ok(ScriptedEngine {
			script: self.script.clone(),
			filename: saved.filename,
		})
	}
}

/// Parsed unit driven by a [`Script`].
#[derive(Debug)]
pub struct ScriptedEngine {
	script: Script,
	filename: PathBuf,
}

impl AnalysisEngine for ScriptedEngine {
	fn reparse(&mut self, sink: &mut dyn DiagnosticSink, token: &CancelToken) -> Result<()> {
		let failure = {
			let mut state = self.script.state.lock();
			state.calls.reparses += 1;
			state.fail_reparse.clone()
		};
		self.script.run_pass(&self.filename, failure, sink, token)
	}

	fn complete_at(&mut self, query: &CompletionQuery<'_>, sink: &mut dyn DiagnosticSink, token: &CancelToken) -> Result<Vec<CompletionCandidate>> {
		let (failure, panic) = {
			let mut state = self.script.state.lock();
			state.calls.completions_started += 1;
			state.calls.last_query = Some(RecordedQuery {
				filename: query.filename.to_path_buf(),
				buffer: query.buffer.to_string(),
				row: query.row,
				column: query.column,
				options: query.options,
			});
			(state.fail_complete.clone(), state.panic_complete)
		};

		while self.script.is_held() {
			token.checkpoint()?;
			std::thread::sleep(Duration::from_millis(1));
		}
		if panic {
			panic!("scripted engine panic during completion");
		}
		self.script.run_pass(query.filename, failure, sink, token)?;

		let mut state = self.script.state.lock();
		state.calls.completions_finished += 1;
		Ok(state.candidates.clone())
	}

	fn save(&self, path: &Path) -> Result<()> {
		let unit = SavedUnit {
			filename: self.filename.clone(),
			candidates: {
				let mut state = self.script.state.lock();
				state.calls.saves += 1;
				state.candidates.clone()
			},
		};
		let bytes = serde_json::to_vec_pretty(&unit).map_err(|e| EngineError::Failed(e.to_string()))?;
		std::fs::write(path, bytes).map_err(|error| EngineError::Io {
			path: path.to_path_buf(),
			error,
		})
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::{LanguageStandard, NullSink};

	fn invocation(filename: &Path) -> Invocation {
		Invocation {
			filename: filename.to_path_buf(),
			arguments: vec!["-std=c++17".into()],
			working_directory: PathBuf::from("/"),
			system_headers: Vec::new(),
			frameworks: Vec::new(),
			builtin_headers: None,
			language_standard: LanguageStandard::Cxx17,
			skip_function_bodies: true,
			completion: CompletionOptions::default(),
		}
	}

	#[test]
	fn declarations_checkpoint_the_token() {
		let script = Script::new();
		script.set_declarations(10);
		let factory = ScriptedFactory::new(script.clone());
		let token = CancelToken::new(1);
		token.cancel();
		let err = factory.parse(&invocation(Path::new("/a.cpp")), &mut NullSink, &token).unwrap_err();
		assert!(err.is_cancelled());
	}

	#[test]
	fn save_then_load_restores_unit_for_same_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("a.cpp.ast");
		let script = Script::new();
		script.set_candidates(vec![CompletionCandidate::keyword("if", 10)]);
		let factory = ScriptedFactory::new(script.clone());
		let inv = invocation(Path::new("/a.cpp"));

		let engine = factory.parse(&inv, &mut NullSink, &CancelToken::detached()).unwrap();
		engine.save(&path).unwrap();
		assert!(factory.load(&path, &inv, &mut NullSink).is_ok());

		let other = invocation(Path::new("/b.cpp"));
		assert!(matches!(factory.load(&path, &other, &mut NullSink), Err(EngineError::Unreadable { .. })));

		let calls = script.calls();
		assert_eq!((calls.parses, calls.loads, calls.saves), (1, 2, 1));
	}
}
