//! Tagged template rule extractor built on the oxc parser.

use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{walk, Visit};
use oxc_parser::{Parser, ParserReturn};
use oxc_span::{GetSpan, SourceType};

use lacquer_core::{
    ExtractError, Extraction, Location, PluginOptions, Replacement, RuleExtractor, RuleTable,
    Span, StyleMetadata, StyleRule, TransformOptions,
};

use crate::code_map::{apply_edits, build_code_map, Edit, LineIndex};
use crate::evaluate::{literal_value, Scope};
use crate::tags::{class_name, StyleTag};

/// Extracts `css` and `styled` tagged templates from JavaScript and TypeScript.
#[derive(Debug, Default)]
pub struct TaggedTemplateExtractor;

impl TaggedTemplateExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self
    }
}

impl RuleExtractor for TaggedTemplateExtractor {
    fn name(&self) -> &'static str {
        "tagged-template"
    }

    fn extract(
        &self,
        source: &str,
        options: &TransformOptions,
    ) -> Result<Extraction, ExtractError> {
        let filename = options.input_filename.to_string_lossy().into_owned();
        let allocator = Allocator::default();
        let source_type = SourceType::from_path(&options.input_filename)
            .unwrap_or_else(|_| SourceType::mjs().with_jsx(true));

        let ParserReturn {
            program,
            errors,
            panicked,
            ..
        } = Parser::new(&allocator, source, source_type).parse();

        if panicked || !errors.is_empty() {
            let message = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ExtractError::Parse { message });
        }

        let mut walker = Walker::new(source, &filename, &options.plugin_options);
        walker.collect_imports(&program);
        walker.visit_program(&program);
        if let Some(err) = walker.error.take() {
            return Err(err);
        }

        if walker.rules.is_empty() {
            return Ok(Extraction {
                code: source.to_string(),
                source_map: None,
                metadata: None,
            });
        }

        let code = apply_edits(source, &walker.edits);
        let source_map = build_code_map(source, &walker.edits, &filename);

        tracing::debug!(
            "Extracted {} style declarations from {}",
            walker.rules.len(),
            filename
        );

        Ok(Extraction {
            code,
            source_map: Some(source_map),
            metadata: Some(StyleMetadata {
                rules: walker.rules,
                replacements: walker.replacements,
                dependencies: walker.dependencies,
            }),
        })
    }
}

/// Walk state for one source file.
struct Walker<'s> {
    source: &'s str,
    filename: &'s str,
    options: &'s PluginOptions,
    lines: LineIndex<'s>,
    scope: Scope,
    /// Inside a `const` declaration
    in_const: bool,
    error: Option<ExtractError>,
    rules: RuleTable,
    edits: Vec<Edit>,
    replacements: Vec<Replacement>,
    dependencies: Vec<String>,
}

impl<'s> Walker<'s> {
    fn new(source: &'s str, filename: &'s str, options: &'s PluginOptions) -> Self {
        Self {
            source,
            filename,
            options,
            lines: LineIndex::new(source),
            scope: Scope::default(),
            in_const: false,
            error: None,
            rules: RuleTable::new(),
            edits: Vec::new(),
            replacements: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    fn collect_imports(&mut self, program: &Program) {
        for stmt in &program.body {
            let Statement::ImportDeclaration(import) = stmt else {
                continue;
            };
            let Some(specifiers) = &import.specifiers else {
                continue;
            };

            let module = import.source.value.to_string();
            for specifier in specifiers {
                let local = match specifier {
                    ImportDeclarationSpecifier::ImportSpecifier(s) => &s.local,
                    ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => &s.local,
                    ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => &s.local,
                };
                self.scope
                    .imports
                    .insert(local.name.to_string(), module.clone());
            }
        }
    }

    /// Extract one style template, keeping the first error.
    fn extract(
        &mut self,
        tagged: &TaggedTemplateExpression,
        tag: StyleTag,
        binding: Option<&str>,
    ) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.extract_tagged(tagged, tag, binding) {
            self.error = Some(e);
        }
    }

    /// Turn one style tagged template into a rule and a replacement edit.
    fn extract_tagged(
        &mut self,
        tagged: &TaggedTemplateExpression,
        tag: StyleTag,
        binding: Option<&str>,
    ) -> Result<(), ExtractError> {
        let display_name = binding
            .map(str::to_string)
            .unwrap_or_else(|| tag.fallback_display_name());
        let naming = self.options.display_name.then_some(display_name.as_str());
        let class = class_name(self.filename, self.rules.len(), naming);
        let selector = format!(".{class}");

        let mut css_text = String::new();
        let mut vars: Vec<(String, &str)> = Vec::new();
        let quasi = &tagged.quasi;

        for (i, element) in quasi.quasis.iter().enumerate() {
            css_text.push_str(element.value.raw.as_str());

            let Some(expr) = quasi.expressions.get(i) else {
                continue;
            };
            let expr_source = self.slice(expr.span());

            for module in self.scope.dependencies_of(expr_source) {
                if !self.dependencies.contains(&module) {
                    self.dependencies.push(module);
                }
            }

            match self.scope.evaluate(expr, self.options.evaluate) {
                Some(value) => css_text.push_str(&value),
                None => match tag {
                    StyleTag::Css => {
                        let at = self.lines.location(expr.span().start as usize);
                        return Err(ExtractError::Unsupported {
                            message: format!(
                                "{}:{}:{}: css interpolations must be static values (found `{}`)",
                                self.filename,
                                at.line,
                                at.column + 1,
                                expr_source
                            ),
                        });
                    }
                    StyleTag::Styled { .. } => {
                        let var = format!("{class}-{i}");
                        css_text.push_str(&format!("var(--{var})"));
                        vars.push((var, expr_source));
                    }
                },
            }
        }

        let (start, end, text) = match &tag {
            StyleTag::Css => (
                tagged.span.start as usize,
                tagged.span.end as usize,
                quote(&class),
            ),
            StyleTag::Styled { .. } => (
                quasi.span.start as usize,
                quasi.span.end as usize,
                styled_arguments(&display_name, &class, &vars),
            ),
        };

        self.replacements.push(Replacement {
            original: Span {
                start: self.lines.location(start),
                end: self.lines.location(end),
            },
            length: text.encode_utf16().count(),
        });
        self.edits.push(Edit { start, end, text });

        if let Some(name) = binding {
            let interpolated = match tag {
                StyleTag::Css => class.clone(),
                StyleTag::Styled { .. } => selector.clone(),
            };
            self.scope.styles.insert(name.to_string(), interpolated);
        }

        let start: Location = self.lines.location(tagged.span.start as usize);
        self.rules.insert(StyleRule {
            selector,
            css_text,
            display_name: Some(display_name),
            start: Some(start),
        })?;

        Ok(())
    }

    fn slice(&self, span: oxc_span::Span) -> &'s str {
        &self.source[span.start as usize..span.end as usize]
    }
}

impl<'a> Visit<'a> for Walker<'_> {
    fn visit_variable_declaration(&mut self, it: &VariableDeclaration<'a>) {
        let enclosing = self.in_const;
        self.in_const = matches!(it.kind, VariableDeclarationKind::Const);
        walk::walk_variable_declaration(self, it);
        self.in_const = enclosing;
    }

    fn visit_variable_declarator(&mut self, it: &VariableDeclarator<'a>) {
        let binding = it.id.get_binding_identifier().map(|id| id.name.to_string());

        if let (Some(init), Some(name)) = (&it.init, &binding) {
            if self.in_const {
                if let Some(value) = literal_value(init) {
                    self.scope.constants.insert(name.clone(), value);
                }
            }
            if let Some((tagged, tag)) = style_template(init) {
                self.extract(tagged, tag, Some(name));
                return;
            }
        }

        walk::walk_variable_declarator(self, it);
    }

    fn visit_property_definition(&mut self, it: &PropertyDefinition<'a>) {
        if let (Some(value), Some(name)) = (&it.value, it.key.static_name()) {
            if let Some((tagged, tag)) = style_template(value) {
                self.extract(tagged, tag, Some(name.as_ref()));
                return;
            }
        }

        walk::walk_property_definition(self, it);
    }

    fn visit_tagged_template_expression(&mut self, it: &TaggedTemplateExpression<'a>) {
        match StyleTag::classify(&it.tag) {
            Some(tag) => self.extract(it, tag, None),
            None => walk::walk_tagged_template_expression(self, it),
        }
    }
}

/// The style template `expr` consists of, if any.
fn style_template<'e, 'a>(
    expr: &'e Expression<'a>,
) -> Option<(&'e TaggedTemplateExpression<'a>, StyleTag)> {
    match expr.without_parentheses() {
        Expression::TaggedTemplateExpression(tagged) => {
            StyleTag::classify(&tagged.tag).map(|tag| (&**tagged, tag))
        }
        _ => None,
    }
}

/// JavaScript string literal for `value`.
fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}

/// Argument object passed to `styled(...)` in place of the template literal.
fn styled_arguments(name: &str, class: &str, vars: &[(String, &str)]) -> String {
    let mut fields = vec![
        format!("name: {}", quote(name)),
        format!("class: {}", quote(class)),
    ];

    if !vars.is_empty() {
        let entries = vars
            .iter()
            .map(|(var, expr)| format!("{}: {}", quote(var), expr))
            .collect::<Vec<_>>()
            .join(", ");
        fields.push(format!("vars: {{ {entries} }}"));
    }

    format!("({{ {} }})", fields.join(", "))
}
