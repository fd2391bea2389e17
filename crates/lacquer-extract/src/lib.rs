//! Tagged template style extraction.
//!
//! Finds `css` and `styled` tagged templates in JavaScript and TypeScript
//! sources, turns each one into a [`StyleRule`](lacquer_core::StyleRule) and
//! rewrites the call site to reference the generated class name.

pub mod code_map;
pub mod evaluate;
pub mod extractor;
pub mod tags;

pub use extractor::TaggedTemplateExtractor;
pub use tags::{class_name, StyleTag};
