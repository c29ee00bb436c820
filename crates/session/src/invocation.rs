use std::path::{Path, PathBuf};

use clara_build_config::ResolvedFlags;
use clara_engine::{Invocation, LanguageStandard};

use crate::observer::SessionObserver;
use crate::options::SessionOptions;

/// Builds the engine invocation for a session.
///
/// Explicit `flags` in the options win over the build configuration. Forced
/// includes (`-include <file>`) are dropped since they would be parsed into
/// every preamble. Without any flags the session falls back to a minimal
/// `-x <lang> -std=<standard>` invocation and tells the observer so.
pub fn build_invocation(options: &SessionOptions, resolved: ResolvedFlags, observer: &dyn SessionObserver) -> Invocation {
	let file = options.filename.display();
	let source = match &options.flags {
		Some(flags) if !flags.is_empty() => flags.clone(),
		_ => resolved.flags,
	};
	let mut arguments = strip_forced_includes(source);
	if arguments.is_empty() {
		tracing::warn!(file = %file, standard = options.language_standard.as_str(), "session.invocation.default");
		observer.on_log(&format!("no compile flags for {file}, using the default invocation"));
		arguments = default_arguments(options.language_standard);
	}

	let working_directory = options
		.working_directory
		.clone()
		.or(resolved.working_directory)
		.unwrap_or_else(|| fallback_directory(&options.filename));

	Invocation {
		filename: options.filename.clone(),
		arguments,
		working_directory,
		system_headers: options.system_headers.clone(),
		frameworks: options.frameworks.clone(),
		builtin_headers: options.builtin_headers.clone(),
		language_standard: options.language_standard,
		skip_function_bodies: true,
		completion: options.completion.engine_options(),
	}
}

fn default_arguments(standard: LanguageStandard) -> Vec<String> {
	let language = if standard.is_cxx() { "c++" } else { "c" };
	vec!["-x".to_string(), language.to_string(), standard.flag()]
}

fn strip_forced_includes(arguments: Vec<String>) -> Vec<String> {
	let mut out = Vec::with_capacity(arguments.len());
	let mut skip_next = false;
	for arg in arguments {
		if skip_next {
			skip_next = false;
		} else if arg == "-include" {
			skip_next = true;
		} else {
			out.push(arg);
		}
	}
	out
}

fn fallback_directory(filename: &Path) -> PathBuf {
	match filename.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
		_ => PathBuf::from("."),
	}
}

#[cfg(test)]
mod tests {
	use parking_lot::Mutex;
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::observer::{CompletionResult, Diagnostic};

	#[derive(Default)]
	struct Logs(Mutex<Vec<String>>);

	impl SessionObserver for Logs {
		fn on_completion_result(&self, _result: CompletionResult) {}

		fn on_diagnostic(&self, _diagnostic: Diagnostic) {}

		fn on_log(&self, message: &str) {
			self.0.lock().push(message.to_string());
		}
	}

	fn strings(items: &[&str]) -> Vec<String> {
		items.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn resolved_flags_without_forced_includes() {
		let logs = Logs::default();
		let resolved = ResolvedFlags {
			flags: strings(&["-DX", "-include", "pch.h", "-Iinc", "-c", "a.cpp"]),
			working_directory: Some(PathBuf::from("/build")),
		};
		let invocation = build_invocation(&SessionOptions::new("/src/a.cpp"), resolved, &logs);
		assert_eq!(invocation.arguments, strings(&["-DX", "-Iinc", "-c", "a.cpp"]));
		assert_eq!(invocation.working_directory, PathBuf::from("/build"));
		assert!(invocation.skip_function_bodies);
		assert!(logs.0.lock().is_empty());
	}

	#[test]
	fn explicit_options_override_build_configuration() {
		let mut options = SessionOptions::new("/src/a.cpp");
		options.flags = Some(strings(&["-DOVERRIDE"]));
		options.working_directory = Some(PathBuf::from("/elsewhere"));
		let resolved = ResolvedFlags {
			flags: strings(&["-DX"]),
			working_directory: Some(PathBuf::from("/build")),
		};
		let invocation = build_invocation(&options, resolved, &Logs::default());
		assert_eq!(invocation.arguments, strings(&["-DOVERRIDE"]));
		assert_eq!(invocation.working_directory, PathBuf::from("/elsewhere"));
	}

	#[test]
	fn missing_flags_fall_back_to_default_invocation() {
		let logs = Logs::default();
		let mut options = SessionOptions::new("/src/a.c");
		options.language_standard = LanguageStandard::C11;
		let invocation = build_invocation(&options, ResolvedFlags::default(), &logs);
		assert_eq!(invocation.arguments, strings(&["-x", "c", "-std=c11"]));
		assert_eq!(invocation.working_directory, PathBuf::from("/src"));
		assert_eq!(logs.0.lock().len(), 1);

		let invocation = build_invocation(&SessionOptions::new("a.cpp"), ResolvedFlags::default(), &logs);
		assert_eq!(invocation.arguments, strings(&["-x", "c++", "-std=c++17"]));
		assert_eq!(invocation.working_directory, PathBuf::from("."));
	}
}
