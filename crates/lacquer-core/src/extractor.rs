//! Trait definitions for rule extractors.

use std::path::PathBuf;

use serde::Deserialize;

use crate::rules::{Replacement, RuleTable};

/// Options forwarded untouched to the rule extractor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PluginOptions {
    /// Resolve same-file constants referenced from interpolations
    pub evaluate: bool,

    /// Prefix generated class names with the declaration's display name
    pub display_name: bool,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            evaluate: true,
            display_name: false,
        }
    }
}

/// Per-invocation configuration for [`crate::transform`].
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Source file being transformed (diagnostics and source map identity)
    pub input_filename: PathBuf,

    /// Where the stylesheet will be written; asset paths are left alone without it
    pub output_filename: Option<PathBuf>,

    /// Serialized source map of the input, returned as-is when nothing is extracted
    pub input_source_map: Option<String>,

    /// Options for the rule extractor
    pub plugin_options: PluginOptions,
}

impl TransformOptions {
    /// Options for `input_filename` with everything else defaulted.
    pub fn new(input_filename: impl Into<PathBuf>) -> Self {
        Self {
            input_filename: input_filename.into(),
            ..Self::default()
        }
    }

    pub fn with_output_filename(mut self, output_filename: impl Into<PathBuf>) -> Self {
        self.output_filename = Some(output_filename.into());
        self
    }

    pub fn with_input_source_map(mut self, source_map: impl Into<String>) -> Self {
        self.input_source_map = Some(source_map.into());
        self
    }

    pub fn with_plugin_options(mut self, plugin_options: PluginOptions) -> Self {
        self.plugin_options = plugin_options;
        self
    }
}

/// Style metadata collected by an extractor.
#[derive(Debug, Clone, Default)]
pub struct StyleMetadata {
    /// Extracted rules in source order
    pub rules: RuleTable,

    /// Replaced expressions in the original source
    pub replacements: Vec<Replacement>,

    /// Module specifiers referenced from style expressions
    pub dependencies: Vec<String>,
}

/// Output of a rule extractor.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Rewritten source code
    pub code: String,

    /// Serialized source map for `code`
    pub source_map: Option<String>,

    /// Present only when at least one style declaration was found
    pub metadata: Option<StyleMetadata>,
}

/// Errors an extractor can report.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("{message}")]
    Parse { message: String },

    #[error("{message}")]
    Unsupported { message: String },

    #[error("{0}")]
    RuleTable(#[from] crate::rules::RuleTableError),
}

/// Identifies style declarations in source text and produces the rule table.
pub trait RuleExtractor: Send + Sync {
    /// Extractor identifier used in diagnostics
    fn name(&self) -> &'static str;

    /// Extract style rules from `source`.
    ///
    /// # Arguments
    /// * `source` - The original source text
    /// * `options` - Transform options; `input_filename` and `plugin_options` are relevant
    fn extract(&self, source: &str, options: &TransformOptions)
        -> Result<Extraction, ExtractError>;
}
