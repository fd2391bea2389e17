//! Static evaluation of template literal interpolations.

use std::collections::HashMap;
use std::sync::LazyLock;

use oxc_ast::ast::Expression;
use regex::Regex;

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\.\s*)?([A-Za-z_$][A-Za-z0-9_$]*)").expect("Invalid identifier regex")
});

/// Bindings visible to interpolations, collected in source order.
#[derive(Debug, Default)]
pub struct Scope {
    /// Local import binding → module specifier
    pub imports: HashMap<String, String>,

    /// `const` bindings with a literal value
    pub constants: HashMap<String, String>,

    /// Bindings of already extracted styles → text they interpolate as
    pub styles: HashMap<String, String>,
}

impl Scope {
    /// Statically evaluate an interpolation.
    ///
    /// Returns `None` when the value is only known at runtime. Same-file
    /// constants are only consulted when `evaluate_constants` is set.
    pub fn evaluate(&self, expr: &Expression, evaluate_constants: bool) -> Option<String> {
        match expr {
            Expression::StringLiteral(s) => Some(s.value.to_string()),
            Expression::NumericLiteral(n) => Some(format_number(n.value)),
            Expression::TemplateLiteral(tpl) if tpl.expressions.is_empty() => tpl
                .quasis
                .first()
                .map(|q| q.value.cooked.as_ref().unwrap_or(&q.value.raw).to_string()),
            Expression::ParenthesizedExpression(p) => {
                self.evaluate(&p.expression, evaluate_constants)
            }
            Expression::Identifier(id) => {
                let name = id.name.as_str();
                if let Some(style) = self.styles.get(name) {
                    return Some(style.clone());
                }
                if evaluate_constants {
                    return self.constants.get(name).cloned();
                }
                None
            }
            _ => None,
        }
    }

    /// Modules whose imported bindings are referenced in `expr_source`.
    pub fn dependencies_of(&self, expr_source: &str) -> Vec<String> {
        let mut deps = Vec::new();

        for caps in IDENTIFIER_RE.captures_iter(expr_source) {
            // Property accesses never refer to bindings
            if caps.get(1).is_some() {
                continue;
            }
            if let Some(module) = self.imports.get(&caps[2]) {
                if !deps.contains(module) {
                    deps.push(module.clone());
                }
            }
        }

        deps
    }
}

/// Literal value of a `const` initializer, if it has one.
pub fn literal_value(expr: &Expression) -> Option<String> {
    Scope::default().evaluate(expr, false)
}

/// Render a JS number the way it would stringify.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_numbers_like_javascript() {
        assert_eq!(format_number(16.0), "16");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(0.0), "0");
    }

    #[test]
    fn finds_imported_bindings() {
        let mut scope = Scope::default();
        scope.imports.insert("theme".to_string(), "./theme".to_string());
        scope.imports.insert("colors".to_string(), "@acme/colors".to_string());

        assert_eq!(
            scope.dependencies_of("props => props.active ? colors.primary : theme.muted"),
            vec!["@acme/colors".to_string(), "./theme".to_string()]
        );
    }

    #[test]
    fn ignores_property_accesses_and_duplicates() {
        let mut scope = Scope::default();
        scope.imports.insert("theme".to_string(), "./theme".to_string());

        assert!(scope.dependencies_of("props.theme").is_empty());
        assert_eq!(scope.dependencies_of("theme.a + theme.b").len(), 1);
    }
}
