//! Cheap pre-check deciding whether a source file can contain style declarations.

use regex::Regex;
use std::sync::LazyLock;

// `css` followed by a template literal, or `styled.tag` / `styled(...)` followed by one.
static STYLE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:styled\s*(?:\([\s\S]+\)|\.\s*[A-Za-z0-9_$]+)|css)\s*`")
        .expect("Invalid style tag regex")
});

/// Returns `true` when `source` may contain a `css` or `styled` tagged template.
///
/// False positives only cost a full parse; anything rejected here is returned
/// to the caller untouched.
pub fn should_process(source: &str) -> bool {
    STYLE_TAG_RE.is_match(source)
}
