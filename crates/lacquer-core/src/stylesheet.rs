//! Stylesheet assembly from an extracted rule table.

use std::borrow::Cow;
use std::path::Path;

use crate::assets::AssetRewriter;
use crate::nesting::resolve_with;
use crate::rules::{Location, Mapping, RuleTable};

/// Assembled stylesheet text and its per-rule mappings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
    /// One line per rule, in rule table order
    pub css_text: String,

    /// One mapping per rule; generated line `i + 1` belongs to rule `i`
    pub mappings: Vec<Mapping>,
}

/// Flatten every rule in `rules` and concatenate the results.
///
/// Relative asset references are rewritten for `output_filename` when it is
/// given. Empty rules still produce a (blank) line so generated line numbers
/// keep matching rule ordinals.
pub fn assemble(
    rules: &RuleTable,
    input_filename: &Path,
    output_filename: Option<&Path>,
) -> Stylesheet {
    let rewriter = output_filename.map(|output| AssetRewriter::new(input_filename, output));

    let mut css_text = String::new();
    let mut mappings = Vec::with_capacity(rules.len());

    for (index, rule) in rules.iter().enumerate() {
        mappings.push(Mapping {
            generated: Location::new(index as u32 + 1, 0),
            original: rule.start,
            name: rule.selector.clone(),
        });

        let flattened = resolve_with(&rule.selector, &rule.css_text, |decl| match &rewriter {
            Some(rewriter) => rewriter.rewrite(decl),
            None => Cow::Borrowed(decl),
        });

        tracing::debug!("Flattened {} ({} bytes)", rule.selector, flattened.len());

        css_text.push_str(&flattened);
        css_text.push('\n');
    }

    Stylesheet { css_text, mappings }
}
