//! Raw completion candidates as produced by the engine.

use serde::{Deserialize, Serialize};

/// What produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
	/// A named declaration (function, variable, type, member, ...).
	Declaration,
	/// A language keyword.
	Keyword,
	/// A preprocessor macro.
	Macro,
	/// A code pattern such as a statement skeleton.
	Pattern,
}

impl CandidateKind {
	/// Tag used when a candidate has no structured completion string.
	pub const fn tag(self) -> &'static str {
		match self {
			Self::Declaration => "Declaration",
			Self::Keyword => "Keyword",
			Self::Macro => "Macro",
			Self::Pattern => "Pattern",
		}
	}
}

/// Availability marker attached by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Availability {
	#[default]
	Available,
	Deprecated,
	NotAvailable,
	NotAccessible,
}

impl Availability {
	/// Whether candidates with this marker may be offered to the user.
	pub const fn is_offerable(self) -> bool {
		matches!(self, Self::Available | Self::Deprecated)
	}
}

/// Punctuation chunk inserted verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Punctuation {
	LeftParen,
	RightParen,
	LeftBracket,
	RightBracket,
	LeftBrace,
	RightBrace,
	LeftAngle,
	RightAngle,
	Comma,
	Colon,
	SemiColon,
	Equal,
}

impl Punctuation {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::LeftParen => "(",
			Self::RightParen => ")",
			Self::LeftBracket => "[",
			Self::RightBracket => "]",
			Self::LeftBrace => "{",
			Self::RightBrace => "}",
			Self::LeftAngle => "<",
			Self::RightAngle => ">",
			Self::Comma => ", ",
			Self::Colon => ":",
			Self::SemiColon => ";",
			Self::Equal => " = ",
		}
	}
}

/// One typed piece of a [`CompletionString`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "value")]
pub enum Chunk {
	/// What the user types to select the candidate.
	TypedText(String),
	/// Literal text inserted into the buffer.
	Text(String),
	/// A group that may be omitted, such as defaulted arguments.
	Optional(CompletionString),
	/// A slot the user fills in, such as a call argument.
	Placeholder(String),
	/// The parameter under the cursor inside a call.
	CurrentParameter(String),
	/// Describes the candidate; never inserted.
	Informative(String),
	/// Type of the entity, or return type for functions.
	ResultType(String),
	Punctuation(Punctuation),
	HorizontalSpace(String),
	VerticalSpace(String),
}

/// Structured description of how a candidate is displayed and inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionString {
	pub chunks: Vec<Chunk>,
	/// Annotations such as attribute spellings, shown before the summary.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub annotations: Vec<String>,
	/// Brief documentation comment of the declaration.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub brief_comment: Option<String>,
}

impl CompletionString {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn chunk(mut self, chunk: Chunk) -> Self {
		self.chunks.push(chunk);
		self
	}

	pub fn typed_text(self, text: impl Into<String>) -> Self {
		self.chunk(Chunk::TypedText(text.into()))
	}

	pub fn text(self, text: impl Into<String>) -> Self {
		self.chunk(Chunk::Text(text.into()))
	}

	pub fn placeholder(self, text: impl Into<String>) -> Self {
		self.chunk(Chunk::Placeholder(text.into()))
	}

	pub fn current_parameter(self, text: impl Into<String>) -> Self {
		self.chunk(Chunk::CurrentParameter(text.into()))
	}

	pub fn informative(self, text: impl Into<String>) -> Self {
		self.chunk(Chunk::Informative(text.into()))
	}

	pub fn result_type(self, text: impl Into<String>) -> Self {
		self.chunk(Chunk::ResultType(text.into()))
	}

	pub fn punctuation(self, punctuation: Punctuation) -> Self {
		self.chunk(Chunk::Punctuation(punctuation))
	}

	pub fn optional(self, group: CompletionString) -> Self {
		self.chunk(Chunk::Optional(group))
	}

	pub fn space(self) -> Self {
		self.chunk(Chunk::HorizontalSpace(" ".to_string()))
	}

	pub fn annotation(mut self, annotation: impl Into<String>) -> Self {
		self.annotations.push(annotation.into());
		self
	}

	pub fn brief_comment(mut self, comment: impl Into<String>) -> Self {
		self.brief_comment = Some(comment.into());
		self
	}
}

/// One raw candidate, owned by the engine call that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionCandidate {
	pub kind: CandidateKind,
	/// Declaration, macro or pattern name; the keyword spelling for keywords.
	pub name: String,
	/// Lower values are shown first.
	pub priority: u32,
	#[serde(default)]
	pub availability: Availability,
	/// `None` when the engine could not build a completion string.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub completion: Option<CompletionString>,
}

impl CompletionCandidate {
	pub fn new(kind: CandidateKind, name: impl Into<String>, priority: u32) -> Self {
		Self {
			kind,
			name: name.into(),
			priority,
			availability: Availability::Available,
			completion: None,
		}
	}

	pub fn declaration(name: impl Into<String>, priority: u32) -> Self {
		Self::new(CandidateKind::Declaration, name, priority)
	}

	pub fn keyword(keyword: impl Into<String>, priority: u32) -> Self {
		Self::new(CandidateKind::Keyword, keyword, priority)
	}

	pub fn macro_definition(name: impl Into<String>, priority: u32) -> Self {
		Self::new(CandidateKind::Macro, name, priority)
	}

	pub fn pattern(name: impl Into<String>, priority: u32) -> Self {
		Self::new(CandidateKind::Pattern, name, priority)
	}

	#[must_use]
	pub fn with_availability(mut self, availability: Availability) -> Self {
		self.availability = availability;
		self
	}

	#[must_use]
	pub fn with_completion(mut self, completion: CompletionString) -> Self {
		self.completion = Some(completion);
		self
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn only_available_and_deprecated_are_offerable() {
		assert!(Availability::Available.is_offerable());
		assert!(Availability::Deprecated.is_offerable());
		assert!(!Availability::NotAvailable.is_offerable());
		assert!(!Availability::NotAccessible.is_offerable());
	}

	#[test]
	fn builder_appends_chunks_in_order() {
		let cs = CompletionString::new()
			.typed_text("push_back")
			.punctuation(Punctuation::LeftParen)
			.placeholder("const T &value")
			.punctuation(Punctuation::RightParen)
			.result_type("void");
		assert_eq!(
			cs.chunks,
			vec![
				Chunk::TypedText("push_back".into()),
				Chunk::Punctuation(Punctuation::LeftParen),
				Chunk::Placeholder("const T &value".into()),
				Chunk::Punctuation(Punctuation::RightParen),
				Chunk::ResultType("void".into()),
			]
		);
	}

	#[test]
	fn candidate_json_shape_is_stable() {
		let candidate = CompletionCandidate::declaration("size", 40).with_completion(CompletionString::new().typed_text("size"));
		let json = serde_json::to_value(&candidate).expect("serialize");
		assert_eq!(
			json,
			serde_json::json!({
				"kind": "declaration",
				"name": "size",
				"priority": 40,
				"availability": "available",
				"completion": { "chunks": [{ "kind": "typed-text", "value": "size" }] }
			})
		);
	}
}
