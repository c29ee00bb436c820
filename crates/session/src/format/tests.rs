use clara_engine::{Availability, Punctuation};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

use super::*;

fn formatter() -> ResultFormatter {
	ResultFormatter::default().with_brief_comments(true)
}

fn with_completion(name: &str, completion: CompletionString) -> CompletionCandidate {
	CompletionCandidate::declaration(name, 50).with_completion(completion)
}

/// Tab-stops of a snippet as `(index, unescaped text)`, plus whether it ends
/// with the `$0` end-stop.
fn parse_tab_stops(snippet: &str) -> (Vec<(u32, String)>, bool) {
	let mut stops = Vec::new();
	let mut rest = snippet;
	while let Some(start) = rest.find("${") {
		let after = &rest[start + 2..];
		let colon = after.find(':').expect("tab-stop index");
		let index: u32 = after[..colon].parse().expect("numeric index");
		let mut text = String::new();
		let mut chars = after[colon + 1..].char_indices();
		let mut end = None;
		while let Some((i, c)) = chars.next() {
			match c {
				'\\' => text.push(chars.next().expect("escaped char").1),
				'}' => {
					end = Some(colon + 1 + i + 1);
					break;
				}
				other => text.push(other),
			}
		}
		stops.push((index, text));
		rest = &after[end.expect("closed tab-stop")..];
	}
	(stops, snippet.ends_with("$0"))
}

#[test]
fn keyword_if() {
	let result = formatter().format(&CompletionCandidate::keyword("if", 40));
	assert_eq!(result, FormattedResult::new("if\tKeyword", "if"));
}

#[test]
fn keyword_ignores_completion_string() {
	let candidate = CompletionCandidate::keyword("return", 40).with_completion(CompletionString::new().typed_text("return").space().placeholder("expression"));
	assert_eq!(formatter().format(&candidate), FormattedResult::new("return\tKeyword", "return"));
}

#[rstest]
#[case(CompletionCandidate::declaration("vector", 50), "vector\tDeclaration")]
#[case(CompletionCandidate::macro_definition("NDEBUG", 70), "NDEBUG\tMacro")]
#[case(CompletionCandidate::pattern("static_cast", 40), "static_cast\tPattern")]
fn missing_completion_string_falls_back_to_tagged_name(#[case] candidate: CompletionCandidate, #[case] label: &str) {
	let result = formatter().format(&candidate);
	assert_eq!(result.label, label);
	assert_eq!(result.insertion_text, candidate.name);
}

#[test]
fn function_call_with_reserved_parameter_name() {
	let cs = CompletionString::new()
		.result_type("void")
		.typed_text("push_back")
		.punctuation(Punctuation::LeftParen)
		.placeholder("const T &__x")
		.punctuation(Punctuation::RightParen);
	let result = formatter().format(&with_completion("push_back", cs));
	assert_eq!(result, FormattedResult::new("push_back\t(const T &__x) -> void", "push_back(${1:const T &__x})$0"));

	let cs = CompletionString::new()
		.typed_text("swap")
		.punctuation(Punctuation::LeftParen)
		.placeholder("__other")
		.punctuation(Punctuation::RightParen);
	let result = formatter().format(&with_completion("swap", cs));
	assert_eq!(result, FormattedResult::new("swap\t(other)", "swap(${1:other})$0"));
}

#[test]
fn empty_parameter_list_reads_as_void() {
	let cs = CompletionString::new()
		.result_type("size_type")
		.typed_text("size")
		.punctuation(Punctuation::LeftParen)
		.punctuation(Punctuation::RightParen);
	let result = formatter().format(&with_completion("size", cs));
	assert_eq!(result, FormattedResult::new("size\t(void) -> size_type", "size()"));
}

#[test]
fn variable_shows_its_type() {
	let cs = CompletionString::new().result_type("int").typed_text("count");
	assert_eq!(formatter().format(&with_completion("count", cs)), FormattedResult::new("count\tint", "count"));
}

#[test]
fn bare_typed_text_has_no_summary() {
	let cs = CompletionString::new().typed_text("std");
	assert_eq!(formatter().format(&with_completion("std", cs)), FormattedResult::new("std", "std"));
}

#[rstest]
#[case(false, "f\t(int a)", "f(${1:int a})$0")]
#[case(true, "f\t(int a, int b)", "f(${1:int a}, ${2:int b})$0")]
fn optional_groups_follow_the_toggle(#[case] include: bool, #[case] label: &str, #[case] insertion: &str) {
	let cs = CompletionString::new()
		.typed_text("f")
		.punctuation(Punctuation::LeftParen)
		.placeholder("int a")
		.optional(CompletionString::new().punctuation(Punctuation::Comma).placeholder("int b"))
		.punctuation(Punctuation::RightParen);
	let result = formatter().with_optional_arguments(include).format(&with_completion("f", cs));
	assert_eq!(result, FormattedResult::new(label, insertion));
}

#[test]
fn nested_optional_groups_share_the_counter() {
	let cs = CompletionString::new()
		.typed_text("g")
		.punctuation(Punctuation::LeftParen)
		.placeholder("a")
		.optional(
			CompletionString::new()
				.punctuation(Punctuation::Comma)
				.placeholder("b")
				.optional(CompletionString::new().punctuation(Punctuation::Comma).placeholder("c")),
		)
		.punctuation(Punctuation::RightParen);
	let result = formatter().with_optional_arguments(true).format(&with_completion("g", cs));
	assert_eq!(result.insertion_text, "g(${1:a}, ${2:b}, ${3:c})$0");
}

#[test]
fn brief_comment_follows_the_toggle() {
	let cs = CompletionString::new().result_type("int").typed_text("width").brief_comment("Width in cells.");
	let candidate = with_completion("width", cs);
	assert_eq!(formatter().format(&candidate).label, "width\tint : Width in cells.");
	assert_eq!(formatter().with_brief_comments(false).format(&candidate).label, "width\tint");
}

#[test]
fn destructor_summary_replaces_the_signature() {
	let cs = CompletionString::new()
		.typed_text("~Widget")
		.punctuation(Punctuation::LeftParen)
		.punctuation(Punctuation::RightParen)
		.brief_comment("Releases the buffer.");
	let formatted = formatter().format(&with_completion("~Widget", cs.clone()));
	assert_eq!(formatted, FormattedResult::new("~Widget\t[DESTR] : Releases the buffer.", "~Widget()"));
	assert_eq!(formatter().with_brief_comments(false).format(&with_completion("~Widget", cs)).label, "~Widget\t[DESTR]");
}

#[test]
fn annotations_lead_the_summary() {
	let cs = CompletionString::new()
		.annotation("deprecated")
		.typed_text("old")
		.punctuation(Punctuation::LeftParen)
		.punctuation(Punctuation::RightParen);
	assert_eq!(formatter().format(&with_completion("old", cs)).label, "old\tdeprecated ()");

	let cs = CompletionString::new().annotation("nodiscard").typed_text("flag");
	assert_eq!(formatter().format(&with_completion("flag", cs)).label, "flag\tnodiscard");
}

#[test]
fn current_parameter_is_a_tab_stop() {
	let cs = CompletionString::new()
		.typed_text("max")
		.punctuation(Punctuation::LeftParen)
		.current_parameter("const T &a")
		.punctuation(Punctuation::Comma)
		.placeholder("const T &b")
		.punctuation(Punctuation::RightParen);
	let result = formatter().format(&with_completion("max", cs));
	assert_eq!(result.insertion_text, "max(${1:const T &a}, ${2:const T &b})$0");
}

#[test]
fn tab_stop_text_is_escaped() {
	let cs = CompletionString::new().typed_text("fmt").placeholder("a}$b\\");
	let result = formatter().format(&with_completion("fmt", cs));
	assert_eq!(result.insertion_text, "fmt${1:a\\}\\$b\\\\}$0");
	assert_eq!(parse_tab_stops(&result.insertion_text).0, vec![(1, "a}$b\\".to_string())]);
}

#[test]
fn availability_does_not_affect_formatting() {
	let candidate = CompletionCandidate::declaration("x", 1).with_availability(Availability::Deprecated);
	assert_eq!(formatter().format(&candidate).label, "x\tDeclaration");
}

prop_compose! {
	fn arb_placeholders()(texts in prop::collection::vec("[ -~]{0,12}", 0..8)) -> Vec<String> {
		texts
	}
}

proptest! {
	/// `k` placeholders yield tab-stops `1..=k` that parse back to the
	/// placeholder texts, and `$0` exactly when `k > 0`.
	#[test]
	fn prop_tab_stops_round_trip(name in "[a-z_][a-z0-9_]{0,10}", texts in arb_placeholders()) {
		let mut cs = CompletionString::new().typed_text(name.clone()).punctuation(Punctuation::LeftParen);
		for (i, text) in texts.iter().enumerate() {
			if i > 0 {
				cs = cs.punctuation(Punctuation::Comma);
			}
			cs = cs.placeholder(text.clone());
		}
		cs = cs.punctuation(Punctuation::RightParen);

		let result = formatter().format(&with_completion(&name, cs));
		let (stops, end_stop) = parse_tab_stops(&result.insertion_text);

		let expected: Vec<(u32, String)> = texts
			.iter()
			.enumerate()
			.map(|(i, text)| (i as u32 + 1, text.strip_prefix("__").unwrap_or(text).to_string()))
			.collect();
		prop_assert_eq!(stops, expected);
		prop_assert_eq!(end_stop, !texts.is_empty());
		prop_assert!(result.label.starts_with(&name));
	}

	/// Formatting keeps candidate order and count.
	#[test]
	fn prop_format_all_preserves_order(names in prop::collection::vec("[a-z]{1,8}", 0..20)) {
		let candidates: Vec<_> = names.iter().enumerate().map(|(i, name)| CompletionCandidate::declaration(name.clone(), i as u32)).collect();
		let results = formatter().format_all(&candidates);
		prop_assert_eq!(results.len(), names.len());
		for (result, name) in results.iter().zip(&names) {
			prop_assert_eq!(&result.insertion_text, name);
		}
	}
}
