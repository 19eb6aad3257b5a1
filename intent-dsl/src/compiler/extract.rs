//! Free-text extraction
//!
//! Clause bodies are plain English, so lowering works with ordered
//! prefix/containment tests. Matching ignores ASCII case; extracted values
//! are sliced from the original text, which keeps identifiers and
//! environment variable names as written. `to_ascii_lowercase` preserves
//! byte offsets, so offsets found in the lowercase copy are valid in the
//! original.

use super::ir::{Extracted, ValidationRule};
use std::borrow::Cow;

// ============================================================================
// TEXT HELPERS
// ============================================================================

/// Strip `prefix` ignoring ASCII case, returning the rest of `text`.
pub(crate) fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

/// Byte offset of the first occurrence of `needle`, ignoring ASCII case.
pub(crate) fn find_ci(text: &str, needle: &str) -> Option<usize> {
    text.to_ascii_lowercase().find(&needle.to_ascii_lowercase())
}

pub(crate) fn contains_ci(text: &str, needle: &str) -> bool {
    find_ci(text, needle).is_some()
}

/// Split around the first `sep`, trimming both halves.
pub(crate) fn split_once_ci<'a>(text: &'a str, sep: &str) -> Option<(&'a str, &'a str)> {
    let idx = find_ci(text, sep)?;
    Some((text[..idx].trim(), text[idx + sep.len()..].trim()))
}

/// Drop one leading `a`, `an` or `the`.
pub(crate) fn strip_article(text: &str) -> &str {
    let text = text.trim_start();
    for article in ["a ", "an ", "the "] {
        if let Some(rest) = strip_prefix_ci(text, article) {
            return rest.trim_start();
        }
    }
    text
}

/// Remove one pair of surrounding double quotes.
pub(crate) fn unquote(text: &str) -> Cow<'_, str> {
    let text = text.trim();
    let Some(inner) = text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) else {
        return Cow::Borrowed(text);
    };
    if !inner.contains('\\') {
        return Cow::Borrowed(inner);
    }

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match (c, chars.clone().next()) {
            ('\\', Some(next @ ('"' | '\\'))) => {
                chars.next();
                out.push(next);
            }
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Strip a trailing header colon.
pub(crate) fn strip_colon(text: &str) -> &str {
    text.trim().trim_end_matches(':').trim_end()
}

/// Split `a, b and c` into items. Quotes around items are removed.
pub(crate) fn split_list(text: &str) -> Vec<String> {
    let mut items = Vec::new();
    for piece in text.split(',') {
        let mut rest = piece.trim();
        if let Some(tail) = strip_prefix_ci(rest, "and ") {
            rest = tail.trim();
        }
        while let Some((head, tail)) = split_once_ci(rest, " and ") {
            push_item(&mut items, head);
            rest = tail;
        }
        push_item(&mut items, rest);
    }
    items
}

fn push_item(items: &mut Vec<String>, item: &str) {
    let item = unquote(item.trim().trim_end_matches('.'));
    if !item.is_empty() {
        items.push(item.to_string());
    }
}

/// Lowercase words joined with `_`.
pub(crate) fn slug(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// First whitespace-separated word, without trailing punctuation.
pub(crate) fn first_word(text: &str) -> Option<&str> {
    let word = text
        .split_whitespace()
        .next()?
        .trim_end_matches(|c: char| !c.is_alphanumeric());
    if word.is_empty() {
        None
    } else {
        Some(word)
    }
}

fn is_number(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_digit())
}

// ============================================================================
// VALIDATION EXTRACTION
// ============================================================================

/// Extract a validation rule from a `check` clause.
///
/// Patterns are tried in a fixed order and the first match wins:
///
/// | predicate                     | rule             | value   |
/// |-------------------------------|------------------|---------|
/// | `is not empty`                | `not_empty`      |         |
/// | `is a valid <kind>`           | `valid_<kind>`   |         |
/// | `is at least N characters`    | `min_length`     | N       |
/// | `is less than N characters`   | `max_length`     | N       |
/// | `is not already taken`        | `unique`         |         |
/// | `is in the future`            | `future_date`    |         |
/// | `matches <x>`                 | `matches`        | x       |
/// | `current user is <clause>`    | `authorization`  | clause  |
///
/// The field is the text before the predicate, after dropping `check that`
/// and (optionally) a leading article. Matching is by substring, so a field
/// whose own name contains a predicate phrase can be split in the wrong
/// place; the order above decides which reading wins.
pub fn extract_validation(text: &str, strip_articles: bool) -> Extracted<ValidationRule> {
    let trimmed = text.trim();
    let body = strip_prefix_ci(trimmed, "check that ")
        .or_else(|| strip_prefix_ci(trimmed, "check "))
        .unwrap_or(trimmed)
        .trim();
    let lower = body.to_ascii_lowercase();

    let subject = |idx: usize| -> String {
        let field = body[..idx].trim();
        let field = if strip_articles {
            strip_article(field)
        } else {
            field
        };
        field.to_string()
    };
    let rule = |field: String, rule: String, value: Option<String>| {
        tracing::trace!(field = %field, rule = %rule, "extracted validation rule");
        Extracted::Recognized(ValidationRule { field, rule, value })
    };

    if let Some(idx) = lower.find(" is not empty") {
        return rule(subject(idx), "not_empty".to_string(), None);
    }

    const VALID: &str = " is a valid ";
    if let Some(idx) = lower.find(VALID) {
        if let Some(kind) = first_word(&body[idx + VALID.len()..]) {
            return rule(subject(idx), format!("valid_{}", kind.to_lowercase()), None);
        }
    }

    const AT_LEAST: &str = " is at least ";
    if let Some(idx) = lower.find(AT_LEAST) {
        if let Some(n) = first_word(&body[idx + AT_LEAST.len()..]).filter(|w| is_number(w)) {
            return rule(subject(idx), "min_length".to_string(), Some(n.to_string()));
        }
    }

    const LESS_THAN: &str = " is less than ";
    if let Some(idx) = lower.find(LESS_THAN) {
        if let Some(n) = first_word(&body[idx + LESS_THAN.len()..]).filter(|w| is_number(w)) {
            return rule(subject(idx), "max_length".to_string(), Some(n.to_string()));
        }
    }

    if let Some(idx) = lower.find(" is not already taken") {
        return rule(subject(idx), "unique".to_string(), None);
    }

    if let Some(idx) = lower.find(" is in the future") {
        return rule(subject(idx), "future_date".to_string(), None);
    }

    const MATCHES: &str = " matches ";
    if let Some(idx) = lower.find(MATCHES) {
        let value = unquote(&body[idx + MATCHES.len()..]).to_string();
        return rule(subject(idx), "matches".to_string(), Some(value));
    }

    const CURRENT_USER: &str = "current user is ";
    if let Some(idx) = lower.find(CURRENT_USER) {
        let clause = body[idx + CURRENT_USER.len()..].trim().to_string();
        return rule(
            "current user".to_string(),
            "authorization".to_string(),
            Some(clause),
        );
    }

    tracing::trace!(text = %text, "check clause kept as action");
    Extracted::Raw(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognized(text: &str) -> ValidationRule {
        match extract_validation(text, true) {
            Extracted::Recognized(rule) => rule,
            Extracted::Raw(raw) => panic!("expected a rule for {:?}", raw),
        }
    }

    #[test]
    fn test_not_empty() {
        let rule = recognized("check that title is not empty");
        assert_eq!(rule.field, "title");
        assert_eq!(rule.rule, "not_empty");
        assert_eq!(rule.value, None);
    }

    #[test]
    fn test_min_length() {
        let rule = recognized("check that password is at least 8 characters");
        assert_eq!(rule.field, "password");
        assert_eq!(rule.rule, "min_length");
        assert_eq!(rule.value.as_deref(), Some("8"));
    }

    #[test]
    fn test_valid_kind() {
        let rule = recognized("check that email is a valid email");
        assert_eq!(rule.field, "email");
        assert_eq!(rule.rule, "valid_email");
    }

    #[test]
    fn test_remaining_patterns() {
        let rule = recognized("check that the name is less than 100 characters");
        assert_eq!((rule.field.as_str(), rule.rule.as_str()), ("name", "max_length"));
        assert_eq!(rule.value.as_deref(), Some("100"));

        let rule = recognized("check that username is not already taken");
        assert_eq!(rule.rule, "unique");

        let rule = recognized("check that due date is in the future");
        assert_eq!((rule.field.as_str(), rule.rule.as_str()), ("due date", "future_date"));

        let rule = recognized("check that confirmation matches \"password\"");
        assert_eq!(rule.rule, "matches");
        assert_eq!(rule.value.as_deref(), Some("password"));

        let rule = recognized("check that the current user is the task owner");
        assert_eq!(rule.field, "current user");
        assert_eq!(rule.rule, "authorization");
        assert_eq!(rule.value.as_deref(), Some("the task owner"));
    }

    #[test]
    fn test_no_match_stays_raw() {
        let result = extract_validation("check the inventory totals", true);
        assert_eq!(result.raw(), Some("check the inventory totals"));

        // Non-numeric bound is not a length rule.
        let result = extract_validation("check that age is at least eighteen", true);
        assert!(!result.is_recognized());
    }

    #[test]
    fn test_article_kept_when_stripping_disabled() {
        let rule = extract_validation("check that the title is not empty", false)
            .recognized()
            .map(|r| r.field);
        assert_eq!(rule.as_deref(), Some("the title"));
    }

    /// Substring matching: a subject containing "matches" is split at the
    /// first predicate found in priority order, not at the intended one.
    #[test]
    fn test_matches_inside_subject_is_ambiguous() {
        let rule = recognized("check that the team matches list is unique");
        assert_eq!(rule.field, "team");
        assert_eq!(rule.rule, "matches");
        assert_eq!(rule.value.as_deref(), Some("list is unique"));

        let rule = recognized("check that matches played is not empty");
        assert_eq!(rule.field, "matches played");
        assert_eq!(rule.rule, "not_empty");
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("title, status, and due date"), vec!["title", "status", "due date"]);
        assert_eq!(split_list("users and billing"), vec!["users", "billing"]);
        assert!(split_list("  ").is_empty());
    }

    #[test]
    fn test_text_helpers() {
        assert_eq!(strip_article("The Primary color"), "Primary color");
        assert_eq!(strip_prefix_ci("Use PostgreSQL", "use "), Some("PostgreSQL"));
        assert_eq!(unquote("\"Inter\""), "Inter");
        assert_eq!(unquote(r#""say \"hi\" \\ bye""#), r#"say "hi" \ bye"#);
        assert_eq!(unquote(r#""C:\temp""#), r#"C:\temp"#);
        assert_eq!(slug("Email and Password"), "email_and_password");
        assert_eq!(strip_colon("service Users:"), "service Users");
        assert_eq!(first_word("email."), Some("email"));
    }
}
