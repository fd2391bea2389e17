//! Style rule data model shared by the extractor and the stylesheet pipeline.

use serde::Serialize;

/// A position in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    /// 1-based line number
    pub line: u32,

    /// 0-based column, in UTF-16 code units
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// One extracted style declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRule {
    /// Unique selector, e.g. `.Title_1a2b3c4d`
    pub selector: String,

    /// Raw, possibly nested, CSS as authored
    pub css_text: String,

    /// Human-readable label (binding or component name)
    pub display_name: Option<String>,

    /// Where the declaration starts in the original source
    pub start: Option<Location>,
}

/// Insertion-ordered table of style rules keyed by selector.
///
/// Order is significant: it decides stylesheet emission order and therefore
/// the generated line of every rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RuleTable {
    rules: Vec<StyleRule>,
}

impl RuleTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. Selectors must be unique within a table.
    pub fn insert(&mut self, rule: StyleRule) -> Result<(), RuleTableError> {
        if self.contains(&rule.selector) {
            return Err(RuleTableError::DuplicateSelector(rule.selector));
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Look up a rule by selector.
    pub fn get(&self, selector: &str) -> Option<&StyleRule> {
        self.rules.iter().find(|r| r.selector == selector)
    }

    pub fn contains(&self, selector: &str) -> bool {
        self.get(selector).is_some()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate rules in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &StyleRule> {
        self.rules.iter()
    }
}

impl<'a> IntoIterator for &'a RuleTable {
    type Item = &'a StyleRule;
    type IntoIter = std::slice::Iter<'a, StyleRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// Errors that can occur when building a rule table.
#[derive(Debug, thiserror::Error)]
pub enum RuleTableError {
    #[error("Duplicate selector in rule table: {0}")]
    DuplicateSelector(String),
}

/// Correspondence between a generated stylesheet line and an original location.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    pub generated: Location,
    pub original: Option<Location>,
    /// Selector of the rule this mapping belongs to
    pub name: String,
}

/// A source range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: Location,
    pub end: Location,
}

/// A style expression that was replaced in the rewritten source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Replacement {
    /// Range of the replaced expression in the original source
    pub original: Span,

    /// Length of the replacement text
    pub length: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(selector: &str) -> StyleRule {
        StyleRule {
            selector: selector.to_string(),
            css_text: "color: red;".to_string(),
            display_name: None,
            start: None,
        }
    }

    #[test]
    fn keeps_insertion_order() {
        let mut table = RuleTable::new();
        table.insert(rule(".b")).unwrap();
        table.insert(rule(".a")).unwrap();
        table.insert(rule(".c")).unwrap();

        let selectors: Vec<&str> = table.iter().map(|r| r.selector.as_str()).collect();
        assert_eq!(selectors, vec![".b", ".a", ".c"]);
    }

    #[test]
    fn rejects_duplicate_selectors() {
        let mut table = RuleTable::new();
        table.insert(rule(".a")).unwrap();

        let result = table.insert(rule(".a"));

        assert!(matches!(result, Err(RuleTableError::DuplicateSelector(s)) if s == ".a"));
        assert_eq!(table.len(), 1);
    }
}
