//! Candidate to `(label, insertion text)` conversion.

use clara_engine::{CandidateKind, Chunk, CompletionCandidate, CompletionString};

use crate::observer::FormattedResult;
use crate::options::CompletionToggles;

#[cfg(test)]
mod tests;

/// Summary shown for destructors in place of their signature.
const DESTRUCTOR_SUMMARY: &str = "[DESTR]";

/// Pure, order-preserving formatter for completion candidates.
///
/// Labels are the typed text, followed by `\t` and a summary when there is
/// one; destructors are summarized as `[DESTR]`. Insertion text is a
/// snippet: placeholders become numbered tab-stops `${1:...}`, `${2:...}`,
/// ... and a final `$0` is appended whenever at least one tab-stop was
/// emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultFormatter {
	include_optional_arguments: bool,
	include_brief_comments: bool,
}

impl ResultFormatter {
	pub fn new(toggles: &CompletionToggles) -> Self {
		Self {
			include_optional_arguments: toggles.include_optional_arguments,
			include_brief_comments: toggles.include_brief_comments,
		}
	}

	#[must_use]
	pub fn with_optional_arguments(mut self, include: bool) -> Self {
		self.include_optional_arguments = include;
		self
	}

	#[must_use]
	pub fn with_brief_comments(mut self, include: bool) -> Self {
		self.include_brief_comments = include;
		self
	}

	/// Formats every candidate, keeping their order.
	pub fn format_all(&self, candidates: &[CompletionCandidate]) -> Vec<FormattedResult> {
		candidates.iter().map(|candidate| self.format(candidate)).collect()
	}

	pub fn format(&self, candidate: &CompletionCandidate) -> FormattedResult {
		match (candidate.kind, &candidate.completion) {
			(CandidateKind::Keyword, _) => tagged(&candidate.name, CandidateKind::Keyword),
			(kind, None) => tagged(&candidate.name, kind),
			(_, Some(completion)) => self.format_completion(completion),
		}
	}

	fn format_completion(&self, completion: &CompletionString) -> FormattedResult {
		let mut acc = Accumulator::default();
		if !completion.annotations.is_empty() {
			acc.informative = completion.annotations.join(" ");
			acc.informative.push(' ');
		}
		self.walk(completion, &mut acc);

		let mut summary = acc.informative.trim_end().to_string();
		if acc.label.contains('~') {
			summary = DESTRUCTOR_SUMMARY.to_string();
		} else if let Some(result_type) = acc.result_type {
			if summary == "()" {
				summary = "(void) -> ".to_string();
			} else if summary.contains('(') && summary.contains(')') {
				summary.push_str(" -> ");
			}
			summary.push_str(&result_type);
		}
		if self.include_brief_comments
			&& let Some(comment) = completion.brief_comment.as_deref()
		{
			summary.push_str(" : ");
			summary.push_str(comment);
		}

		let mut label = acc.label;
		if !summary.is_empty() {
			label.push('\t');
			label.push_str(&summary);
		}
		let mut insertion_text = acc.insertion;
		if acc.tab_stops > 0 {
			insertion_text.push_str("$0");
		}
		FormattedResult { label, insertion_text }
	}

	fn walk(&self, completion: &CompletionString, acc: &mut Accumulator) {
		for chunk in &completion.chunks {
			match chunk {
				Chunk::TypedText(text) => {
					acc.label.push_str(text);
					acc.insertion.push_str(text);
				}
				Chunk::Text(text) | Chunk::HorizontalSpace(text) => {
					acc.informative.push_str(text);
					acc.insertion.push_str(text);
				}
				Chunk::VerticalSpace(text) => acc.insertion.push_str(text),
				Chunk::Punctuation(punctuation) => {
					acc.informative.push_str(punctuation.as_str());
					acc.insertion.push_str(punctuation.as_str());
				}
				Chunk::Placeholder(text) | Chunk::CurrentParameter(text) => {
					let text = strip_reserved_prefix(text);
					acc.informative.push_str(text);
					acc.tab_stop(text);
				}
				Chunk::Informative(text) => acc.informative.push_str(text),
				Chunk::ResultType(text) => acc.result_type = Some(text.clone()),
				Chunk::Optional(group) => {
					if self.include_optional_arguments {
						self.walk(group, acc);
					}
				}
			}
		}
	}
}

#[derive(Default)]
struct Accumulator {
	label: String,
	insertion: String,
	informative: String,
	result_type: Option<String>,
	tab_stops: u32,
}

impl Accumulator {
	fn tab_stop(&mut self, text: &str) {
		self.tab_stops += 1;
		self.insertion.push_str(&format!("${{{}:", self.tab_stops));
		for c in text.chars() {
			if matches!(c, '$' | '}' | '\\') {
				self.insertion.push('\\');
			}
			self.insertion.push(c);
		}
		self.insertion.push('}');
	}
}

fn tagged(name: &str, kind: CandidateKind) -> FormattedResult {
	FormattedResult {
		label: format!("{name}\t{}", kind.tag()),
		insertion_text: name.to_string(),
	}
}

/// Standard-library parameters are spelled `__name`; show them as `name`.
fn strip_reserved_prefix(text: &str) -> &str {
	text.strip_prefix("__").unwrap_or(text)
}
