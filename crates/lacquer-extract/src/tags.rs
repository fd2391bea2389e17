//! Style tag recognition and class naming.

use oxc_ast::ast::{Argument, Expression};

/// Which kind of style tag a tagged template uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleTag {
    /// `css\`...\``, replaced by the class name
    Css,

    /// `styled.h1\`...\`` or `styled(Component)\`...\``, replaced by a styled call
    Styled {
        /// Tag or component being styled (e.g. "h1", "Button")
        component: String,
    },
}

impl StyleTag {
    /// Recognise `css`, `styled.<tag>` and `styled(<expr>)` tags.
    pub fn classify(tag: &Expression) -> Option<Self> {
        match tag {
            Expression::Identifier(id) if id.name.as_str() == "css" => Some(StyleTag::Css),
            Expression::StaticMemberExpression(member) if is_styled(&member.object) => {
                Some(StyleTag::Styled {
                    component: member.property.name.to_string(),
                })
            }
            Expression::CallExpression(call) if is_styled(&call.callee) => {
                let component = call
                    .arguments
                    .first()
                    .and_then(component_name)
                    .unwrap_or_else(|| "Styled".to_string());
                Some(StyleTag::Styled { component })
            }
            _ => None,
        }
    }

    /// Display name used when the declaration is not bound to a name.
    pub fn fallback_display_name(&self) -> String {
        match self {
            StyleTag::Css => "css".to_string(),
            StyleTag::Styled { component } => component.clone(),
        }
    }
}

fn is_styled(expr: &Expression) -> bool {
    matches!(expr, Expression::Identifier(id) if id.name.as_str() == "styled")
}

fn component_name(arg: &Argument) -> Option<String> {
    match arg.as_expression()? {
        Expression::Identifier(id) => Some(id.name.to_string()),
        Expression::StringLiteral(s) => Some(s.value.to_string()),
        Expression::StaticMemberExpression(member) => Some(member.property.name.to_string()),
        _ => None,
    }
}

/// 32-bit FNV-1a hash rendered as 8 hex chars.
pub fn hash(input: &str) -> String {
    let mut h: u32 = 0x811c9dc5;
    for byte in input.bytes() {
        h ^= byte as u32;
        h = h.wrapping_mul(0x01000193);
    }
    format!("{:08x}", h)
}

/// Deterministic class name for the `ordinal`-th style declaration in `filename`.
pub fn class_name(filename: &str, ordinal: usize, display_name: Option<&str>) -> String {
    let slug = hash(&format!("{filename}:{ordinal}"));

    match display_name.map(sanitize).filter(|name| !name.is_empty()) {
        Some(name) => format!("{name}_{slug}"),
        // Class names cannot start with a digit
        None if slug.starts_with(|c: char| c.is_ascii_digit()) => format!("l{slug}"),
        None => slug,
    }
}

/// Keep only characters valid in a CSS identifier.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();

    if cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{cleaned}")
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_tag_names() {
        let styled = StyleTag::Styled {
            component: "Button".to_string(),
        };

        assert_eq!(StyleTag::Css.fallback_display_name(), "css");
        assert_eq!(styled.fallback_display_name(), "Button");
    }

    #[test]
    fn hashes_deterministically() {
        assert_eq!(hash("a.js:0"), hash("a.js:0"));
        assert_ne!(hash("a.js:0"), hash("a.js:1"));
        assert_eq!(hash("").len(), 8);
        assert_eq!(hash(""), "811c9dc5");
    }

    #[test]
    fn prefixes_display_name() {
        let name = class_name("a.js", 0, Some("Title"));

        assert!(name.starts_with("Title_"));
        assert_eq!(name.len(), "Title_".len() + 8);
    }

    #[test]
    fn never_starts_with_digit() {
        for ordinal in 0..64 {
            let name = class_name("src/a.js", ordinal, None);
            assert!(!name.starts_with(|c: char| c.is_ascii_digit()), "{name}");
        }
    }

    #[test]
    fn sanitizes_display_names() {
        assert!(class_name("a.js", 0, Some("my title!")).starts_with("mytitle_"));
        assert!(class_name("a.js", 0, Some("1st")).starts_with("_1st_"));
    }

    #[test]
    fn ignores_empty_display_names() {
        let name = class_name("a.js", 0, Some("!!"));

        assert!(!name.contains('_'));
    }
}
