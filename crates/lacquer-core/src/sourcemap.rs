//! Source maps for extracted stylesheets.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use oxc_sourcemap::SourceMapBuilder;

use crate::rules::Mapping;

/// Build a v3 source map relating stylesheet lines to the source they were extracted from.
///
/// Returns an empty string when there are no mappings.
pub fn build_css_source_map(mappings: &[Mapping], input_filename: &Path, source: &str) -> String {
    if mappings.is_empty() {
        return String::new();
    }

    let source_name = input_filename.to_string_lossy();

    let mut builder = SourceMapBuilder::default();
    builder.set_file(&css_filename(input_filename));
    let source_id = builder.add_source_and_content(&source_name, source);

    for mapping in mappings {
        // Rules without a known origin get no token
        let Some(original) = mapping.original else {
            continue;
        };

        let name_id = builder.add_name(&mapping.name);
        builder.add_token(
            mapping.generated.line.saturating_sub(1),
            mapping.generated.column,
            original.line.saturating_sub(1),
            original.column,
            Some(source_id),
            Some(name_id),
        );
    }

    builder.into_sourcemap().to_json_string()
}

/// `src/title.js` → `src/title.css`
fn css_filename(input_filename: &Path) -> String {
    input_filename.with_extension("css").to_string_lossy().into_owned()
}

/// A CSS source map computed on first access.
///
/// Most callers only need the rewritten code, so the map is not built until
/// [`DeferredSourceMap::get`] is called, and then only once.
#[derive(Debug)]
pub struct DeferredSourceMap {
    mappings: Vec<Mapping>,
    input_filename: PathBuf,
    source: String,
    text: OnceLock<String>,
}

impl DeferredSourceMap {
    pub fn new(mappings: Vec<Mapping>, input_filename: PathBuf, source: String) -> Self {
        Self {
            mappings,
            input_filename,
            source,
            text: OnceLock::new(),
        }
    }

    /// Serialized source map, or an empty string when no rules were emitted.
    pub fn get(&self) -> &str {
        self.text.get_or_init(|| {
            tracing::debug!("Building CSS source map for {}", self.input_filename.display());
            build_css_source_map(&self.mappings, &self.input_filename, &self.source)
        })
    }

    /// Whether the map has been built yet.
    pub fn is_computed(&self) -> bool {
        self.text.get().is_some()
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }
}
