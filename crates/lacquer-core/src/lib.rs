//! Build-time extraction of CSS authored in tagged template literals.
//!
//! This crate turns a table of extracted style rules into a stylesheet: it
//! flattens nested CSS, rewrites relative asset paths for the stylesheet's
//! location, and maps every generated line back to where the rule was authored.
//! Finding the rules in source code is the job of a [`RuleExtractor`].

pub mod assets;
pub mod extractor;
pub mod fast_path;
pub mod nesting;
pub mod rules;
pub mod sourcemap;
pub mod stylesheet;
pub mod transform;

pub use assets::{normalize, relative_path, rewrite_urls, AssetRewriter};
pub use extractor::{
    ExtractError, Extraction, PluginOptions, RuleExtractor, StyleMetadata, TransformOptions,
};
pub use fast_path::should_process;
pub use nesting::{resolve, resolve_with};
pub use rules::{
    Location, Mapping, Replacement, RuleTable, RuleTableError, Span, StyleRule,
};
pub use sourcemap::{build_css_source_map, DeferredSourceMap};
pub use stylesheet::{assemble, Stylesheet};
pub use transform::{transform, TransformError, TransformResult};
