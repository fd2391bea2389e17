//! Top-level transform: fast path, extraction, stylesheet assembly.

use crate::extractor::{ExtractError, RuleExtractor, TransformOptions};
use crate::fast_path::should_process;
use crate::rules::{Replacement, RuleTable};
use crate::sourcemap::DeferredSourceMap;
use crate::stylesheet::assemble;

/// Result of transforming one source file.
#[derive(Debug)]
pub struct TransformResult {
    /// Rewritten source, or the input when nothing was extracted
    pub code: String,

    /// Source map for `code`
    pub source_map: Option<String>,

    /// Extracted stylesheet, present only when rules were found
    pub css_text: Option<String>,

    /// Extracted rules, passed through for downstream tooling
    pub rules: Option<RuleTable>,

    /// Replaced expressions, passed through from the extractor
    pub replacements: Vec<Replacement>,

    /// Module specifiers referenced from style expressions
    pub dependencies: Vec<String>,

    css_source_map: Option<DeferredSourceMap>,
}

impl TransformResult {
    /// The unchanged-input result.
    fn unchanged(source: &str, options: &TransformOptions) -> Self {
        Self {
            code: source.to_string(),
            source_map: options.input_source_map.clone(),
            css_text: None,
            rules: None,
            replacements: Vec::new(),
            dependencies: Vec::new(),
            css_source_map: None,
        }
    }

    /// Serialized source map for `css_text`, built on first call.
    ///
    /// Empty when no rules were extracted.
    pub fn css_source_map_text(&self) -> &str {
        self.css_source_map
            .as_ref()
            .map(DeferredSourceMap::get)
            .unwrap_or("")
    }
}

/// Errors that can occur during transformation.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Failed to parse {filename}: {message}")]
    Parse { filename: String, message: String },

    #[error("Failed to extract styles from {filename}: {message}")]
    Extract { filename: String, message: String },
}

/// Transform `source`, extracting its style declarations with `extractor`.
///
/// Sources that cannot contain style declarations, and sources in which the
/// extractor finds none, are returned unchanged together with
/// `options.input_source_map`.
pub fn transform<E>(
    source: &str,
    options: &TransformOptions,
    extractor: &E,
) -> Result<TransformResult, TransformError>
where
    E: RuleExtractor + ?Sized,
{
    let filename = options.input_filename.display().to_string();

    if !should_process(source) {
        tracing::debug!("Skipping {}: no style tags", filename);
        return Ok(TransformResult::unchanged(source, options));
    }

    let extraction = extractor
        .extract(source, options)
        .map_err(|e| match e {
            ExtractError::Parse { message } => TransformError::Parse {
                filename: filename.clone(),
                message,
            },
            other => TransformError::Extract {
                filename: filename.clone(),
                message: other.to_string(),
            },
        })?;

    // The extractor's re-serialized code is dropped when nothing was extracted
    let Some(metadata) = extraction.metadata.filter(|m| !m.rules.is_empty()) else {
        tracing::debug!("No styles found in {} by {}", filename, extractor.name());
        return Ok(TransformResult::unchanged(source, options));
    };

    let stylesheet = assemble(
        &metadata.rules,
        &options.input_filename,
        options.output_filename.as_deref(),
    );

    tracing::debug!(
        "Extracted {} rules from {}",
        metadata.rules.len(),
        filename
    );

    Ok(TransformResult {
        code: extraction.code,
        source_map: extraction.source_map,
        css_text: Some(stylesheet.css_text),
        rules: Some(metadata.rules),
        replacements: metadata.replacements,
        dependencies: metadata.dependencies,
        css_source_map: Some(DeferredSourceMap::new(
            stylesheet.mappings,
            options.input_filename.clone(),
            source.to_string(),
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{Extraction, StyleMetadata};
    use crate::rules::{Location, Span, StyleRule};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Extractor returning a canned result and counting calls.
    struct FixedExtractor {
        rules: Vec<(&'static str, &'static str, Option<Location>)>,
        calls: AtomicUsize,
    }

    impl FixedExtractor {
        fn new(rules: Vec<(&'static str, &'static str, Option<Location>)>) -> Self {
            Self {
                rules,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl RuleExtractor for FixedExtractor {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn extract(
            &self,
            _source: &str,
            _options: &TransformOptions,
        ) -> Result<Extraction, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if self.rules.is_empty() {
                return Ok(Extraction {
                    code: "/* reprinted */".to_string(),
                    source_map: Some("{}".to_string()),
                    metadata: None,
                });
            }

            let mut rules = RuleTable::new();
            for (selector, css, start) in &self.rules {
                rules.insert(StyleRule {
                    selector: selector.to_string(),
                    css_text: css.to_string(),
                    display_name: None,
                    start: *start,
                })?;
            }

            Ok(Extraction {
                code: "const title = \"xyz1\";".to_string(),
                source_map: Some("{\"version\":3}".to_string()),
                metadata: Some(StyleMetadata {
                    rules,
                    replacements: vec![Replacement {
                        original: Span {
                            start: Location::new(3, 14),
                            end: Location::new(3, 40),
                        },
                        length: 6,
                    }],
                    dependencies: vec!["./theme".to_string()],
                }),
            })
        }
    }

    struct FailingExtractor;

    impl RuleExtractor for FailingExtractor {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn extract(
            &self,
            _source: &str,
            _options: &TransformOptions,
        ) -> Result<Extraction, ExtractError> {
            Err(ExtractError::Parse {
                message: "Unexpected token".to_string(),
            })
        }
    }

    const STYLED_SOURCE: &str = "import { css } from 'lacquer';\n\nconst title = css`color: red;`;\n";

    #[test]
    fn returns_input_unchanged_on_fast_path_miss() {
        let extractor = FixedExtractor::new(vec![(".a", "color: red;", None)]);
        let options = TransformOptions::new("/src/a.js").with_input_source_map("input-map");
        let source = "export const add = (a, b) => a + b;";

        let result = transform(source, &options, &extractor).unwrap();

        assert_eq!(result.code, source);
        assert_eq!(result.source_map.as_deref(), Some("input-map"));
        assert!(result.css_text.is_none());
        assert_eq!(result.css_source_map_text(), "");
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn discards_extractor_output_when_no_rules_found() {
        let extractor = FixedExtractor::new(Vec::new());
        let options = TransformOptions::new("/src/a.js").with_input_source_map("input-map");

        let result = transform(STYLED_SOURCE, &options, &extractor).unwrap();

        assert_eq!(result.code, STYLED_SOURCE);
        assert_eq!(result.source_map.as_deref(), Some("input-map"));
        assert!(result.rules.is_none());
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn assembles_extracted_rules() {
        let extractor = FixedExtractor::new(vec![(
            ".xyz1",
            ".foo { color: red; &:hover { color: blue; } }",
            Some(Location::new(3, 10)),
        )]);
        let options = TransformOptions::new("a.js");

        let result = transform(STYLED_SOURCE, &options, &extractor).unwrap();
        let css = result.css_text.as_deref().unwrap();

        assert_eq!(result.code, "const title = \"xyz1\";");
        assert!(css.contains(".foo { color: red; }"));
        assert!(css.contains(".foo:hover { color: blue; }"));
        assert_eq!(css.lines().count(), 1);
        assert_eq!(result.dependencies, vec!["./theme".to_string()]);
        assert_eq!(result.replacements.len(), 1);
        assert_eq!(result.rules.as_ref().map(RuleTable::len), Some(1));
    }

    #[test]
    fn builds_css_source_map_lazily() {
        let extractor = FixedExtractor::new(vec![
            (".a", "color: red;", Some(Location::new(3, 10))),
            (".b", "color: blue;", Some(Location::new(7, 2))),
        ]);
        let options = TransformOptions::new("src/a.js");

        let result = transform(STYLED_SOURCE, &options, &extractor).unwrap();
        let deferred = result.css_source_map.as_ref().unwrap();

        assert!(!deferred.is_computed());
        let lines: Vec<u32> = deferred.mappings().iter().map(|m| m.generated.line).collect();
        assert_eq!(lines, vec![1, 2]);

        let json: serde_json::Value = serde_json::from_str(result.css_source_map_text()).unwrap();
        assert!(deferred.is_computed());
        assert_eq!(json["file"], "src/a.css");
        assert_eq!(json["sourcesContent"], serde_json::json!([STYLED_SOURCE]));
    }

    #[test]
    fn rewrites_assets_relative_to_output() {
        let extractor = FixedExtractor::new(vec![(".a", "background: url(./img.png);", None)]);
        let options = TransformOptions::new("/proj/src/a.js").with_output_filename("/proj/dist/a.css");

        let result = transform(STYLED_SOURCE, &options, &extractor).unwrap();

        assert_eq!(
            result.css_text.as_deref(),
            Some(".a { background: url(../src/img.png); }\n")
        );
    }

    #[test]
    fn reports_parse_failures_with_filename() {
        let options = TransformOptions::new("/src/broken.js");

        let err = transform(STYLED_SOURCE, &options, &FailingExtractor).unwrap_err();

        assert!(matches!(
            &err,
            TransformError::Parse { filename, .. } if filename == "/src/broken.js"
        ));
        assert!(err.to_string().contains("Unexpected token"));
    }

    #[test]
    fn accepts_trait_objects() {
        let extractor: Box<dyn RuleExtractor> =
            Box::new(FixedExtractor::new(vec![(".a", "color: red;", None)]));
        let options = TransformOptions::new("a.js");

        let result = transform(STYLED_SOURCE, &options, extractor.as_ref()).unwrap();

        assert_eq!(result.css_text.as_deref(), Some(".a { color: red; }\n"));
    }
}
