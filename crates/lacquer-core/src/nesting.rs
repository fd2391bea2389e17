//! Nested rule flattening for extracted CSS.
//!
//! Style declarations are authored as the body of a single rule and may nest
//! further blocks inside it:
//!
//! ```css
//! color: white;
//! &:hover { color: blue; }
//! .icon { margin: 0; }
//! @media (max-width: 600px) { color: black; }
//! ```
//!
//! Resolved against the selector `.btn` this flattens to:
//!
//! ```css
//! .btn { color: white; } .btn:hover { color: blue; } .btn .icon { margin: 0; } @media (max-width: 600px) { .btn { color: black; } }
//! ```
//!
//! ## Flattening Rules
//!
//! - `&` is replaced by the parent selector
//! - nested selectors without `&` are descendants of the parent
//! - a leading `>`, `+` or `~` attaches to the parent with that combinator
//! - `:global(sel)` is emitted as `sel`, unscoped
//! - conditional group at-rules wrap the rules flattened inside them
//! - other block at-rules (`@keyframes`, `@font-face`, ...) are kept verbatim
//!
//! Input is tokenized with `cssparser`; output is produced on a single line.

use std::borrow::Cow;

use cssparser::{ParseError, Parser, ParserInput, SourcePosition, ToCss, Token};

/// At-rules whose body is flattened in the context of the enclosing selector.
const CONDITIONAL_AT_RULES: &[&str] = &["media", "supports", "container", "layer", "document"];

#[derive(Debug, Clone, PartialEq)]
enum Node {
    /// `property: value`
    Declaration(String),
    /// Block-less at-rule such as `@import url(x.css)`
    Statement(String),
    /// `prelude { children }`
    Block { prelude: String, children: Vec<Node> },
}

/// Flatten `css` nested under `selector` without touching declarations.
pub fn resolve(selector: &str, css: &str) -> String {
    resolve_with(selector, css, |decl| Cow::Borrowed(decl))
}

/// Flatten `css` nested under `selector`, passing every declaration through `hook`
/// before it is emitted.
pub fn resolve_with<F>(selector: &str, css: &str, hook: F) -> String
where
    F: Fn(&str) -> Cow<'_, str>,
{
    let nodes = parse(css);

    let selector = normalize_text(selector);
    let parents: Vec<String> = if selector.is_empty() {
        Vec::new()
    } else {
        vec![selector]
    };

    let flattener = Flattener { hook: &hook };
    flattener.group(&parents, &nodes).join(" ")
}

struct Flattener<'h, F> {
    hook: &'h F,
}

impl<F> Flattener<'_, F>
where
    F: Fn(&str) -> Cow<'_, str>,
{
    /// Flatten one group (the top level or a conditional at-rule body):
    /// its statement at-rules first, then its rules.
    fn group(&self, selectors: &[String], nodes: &[Node]) -> Vec<String> {
        let mut statements = Vec::new();
        let mut rules = Vec::new();
        self.flatten(selectors, nodes, &mut statements, &mut rules);

        statements.extend(rules);
        statements
    }

    fn flatten(
        &self,
        selectors: &[String],
        nodes: &[Node],
        statements: &mut Vec<String>,
        out: &mut Vec<String>,
    ) {
        // 1. The rule's own declarations come first
        let declarations: Vec<String> = nodes
            .iter()
            .filter_map(|node| match node {
                Node::Declaration(decl) => Some(self.declaration(decl)),
                _ => None,
            })
            .collect();

        if !declarations.is_empty() && !selectors.is_empty() {
            out.push(block(&selectors.join(", "), &declarations));
        }

        // 2. Then nested rules, depth first
        for node in nodes {
            match node {
                Node::Declaration(_) => {}
                Node::Statement(statement) => statements.push(format!("{statement};")),
                Node::Block { prelude, children } => match at_rule_name(prelude) {
                    Some(name) if CONDITIONAL_AT_RULES.contains(&name.as_str()) => {
                        let inner = self.group(selectors, children);
                        if !inner.is_empty() {
                            out.push(block(prelude, &inner));
                        }
                    }
                    Some(_) => out.push(self.verbatim(prelude, children)),
                    None => {
                        let combined = combine_selectors(selectors, prelude);
                        self.flatten(&combined, children, statements, out);
                    }
                },
            }
        }
    }

    /// Serialize an at-rule block without scoping its contents.
    fn verbatim(&self, prelude: &str, children: &[Node]) -> String {
        let body: Vec<String> = children
            .iter()
            .map(|node| match node {
                Node::Declaration(decl) => self.declaration(decl),
                Node::Statement(statement) => format!("{statement};"),
                Node::Block { prelude, children } => self.verbatim(prelude, children),
            })
            .collect();

        block(prelude, &body)
    }

    fn declaration(&self, decl: &str) -> String {
        format!("{};", (self.hook)(decl))
    }
}

fn block(prelude: &str, body: &[String]) -> String {
    if body.is_empty() {
        format!("{prelude} {{}}")
    } else {
        format!("{prelude} {{ {} }}", body.join(" "))
    }
}

fn at_rule_name(prelude: &str) -> Option<String> {
    let rest = prelude.strip_prefix('@')?;
    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    Some(name.to_ascii_lowercase())
}

/// Combine every parent selector with every selector in a nested prelude.
fn combine_selectors(parents: &[String], prelude: &str) -> Vec<String> {
    let children = split_selector_list(prelude);

    if parents.is_empty() {
        return children
            .iter()
            .map(|child| scope_selector(child, None))
            .collect();
    }

    parents
        .iter()
        .flat_map(|parent| {
            children
                .iter()
                .map(move |child| scope_selector(child, Some(parent)))
        })
        .collect()
}

/// Resolve one nested selector against `parent`.
///
/// `&` outside strings and brackets becomes the parent. `:global(x)` becomes
/// `x` wherever it appears; a selector starting with it and without `&` is not
/// scoped at all. Anything else is a descendant of the parent.
fn scope_selector(selector: &str, parent: Option<&str>) -> String {
    let mut input = ParserInput::new(selector);
    let mut parser = Parser::new(&mut input);
    let mut out = String::new();
    let mut nested = false;
    let mut global = false;

    loop {
        let start = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match &token {
            Token::Delim('&') => {
                nested = true;
                out.push_str(parent.unwrap_or(""));
            }
            Token::Function(name) if name.eq_ignore_ascii_case("global") && out.ends_with(':') => {
                out.pop();
                if out.trim().is_empty() && !nested {
                    global = true;
                }
                push_block_contents(&mut parser, &mut out);
            }
            _ => push_token(&mut parser, start, &token, &mut out),
        }
    }

    let scoped = out.trim();
    match parent {
        Some(parent) if !nested && !global => format!("{parent} {scoped}"),
        _ => scoped.to_string(),
    }
}

/// Split a selector list on top-level commas.
fn split_selector_list(prelude: &str) -> Vec<String> {
    let mut input = ParserInput::new(prelude);
    let mut parser = Parser::new(&mut input);
    let mut parts = Vec::new();
    let mut current = String::new();

    loop {
        let start = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match &token {
            Token::Comma => parts.push(std::mem::take(&mut current)),
            _ => push_token(&mut parser, start, &token, &mut current),
        }
    }

    parts.push(current);
    parts
        .into_iter()
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

/// Parse raw (possibly nested) CSS into a node tree.
///
/// Unclosed blocks end at the end of input; stray `}` are ignored.
fn parse(css: &str) -> Vec<Node> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    parse_nodes(&mut parser)
}

fn parse_nodes<'i>(parser: &mut Parser<'i, '_>) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut buf = String::new();

    loop {
        let start = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match &token {
            Token::Semicolon | Token::CloseCurlyBracket => flush(&mut buf, &mut nodes),
            Token::CurlyBracketBlock => {
                let prelude = buf.trim().to_string();
                buf.clear();
                let children = parser
                    .parse_nested_block(|nested| Ok::<_, ParseError<'i, ()>>(parse_nodes(nested)))
                    .unwrap_or_default();
                nodes.push(Node::Block { prelude, children });
            }
            _ => push_token(parser, start, &token, &mut buf),
        }
    }

    flush(&mut buf, &mut nodes);
    nodes
}

fn flush(buf: &mut String, nodes: &mut Vec<Node>) {
    let text = buf.trim().to_string();
    buf.clear();

    if text.is_empty() {
        return;
    }

    if text.starts_with('@') {
        nodes.push(Node::Statement(text));
        return;
    }

    let decl = match text.split_once(':') {
        Some((property, value)) => format!("{}: {}", property.trim(), value.trim()),
        None => text,
    };
    nodes.push(Node::Declaration(decl));
}

/// Tokenize `text` and re-emit it on one line.
fn normalize_text(text: &str) -> String {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let mut out = String::new();
    push_rest(&mut parser, &mut out);
    out.trim().to_string()
}

/// Append every remaining token of `parser` to `out`.
fn push_rest(parser: &mut Parser<'_, '_>, out: &mut String) {
    loop {
        let start = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        push_token(parser, start, &token, out);
    }
}

/// Append `token` (read from `start`) to `out` as authored, on one line.
///
/// Whitespace and comments collapse to a single space. Tokens spanning a line
/// break (strings with escaped newlines, `url(` with inner whitespace) are
/// re-serialized.
fn push_token<'i>(
    parser: &mut Parser<'i, '_>,
    start: SourcePosition,
    token: &Token<'i>,
    out: &mut String,
) {
    match token {
        Token::WhiteSpace(_) | Token::Comment(_) => push_space(out),
        Token::Function(_)
        | Token::ParenthesisBlock
        | Token::SquareBracketBlock
        | Token::CurlyBracketBlock => {
            out.push_str(parser.slice_from(start));
            push_block_contents(parser, out);
            if out.ends_with(' ') {
                out.pop();
            }
            out.push(match token {
                Token::SquareBracketBlock => ']',
                Token::CurlyBracketBlock => '}',
                _ => ')',
            });
        }
        _ => {
            let authored = parser.slice_from(start);
            if authored.contains(['\n', '\r', '\x0c']) {
                out.push_str(&token.to_css_string());
            } else {
                out.push_str(authored);
            }
        }
    }
}

/// Append the contents of the block `parser` just opened.
fn push_block_contents<'i>(parser: &mut Parser<'i, '_>, out: &mut String) {
    let _ = parser.parse_nested_block(|nested| {
        push_rest(nested, out);
        Ok::<_, ParseError<'i, ()>>(())
    });
}

fn push_space(out: &mut String) {
    if !out.is_empty() && !out.ends_with([' ', '(', '[']) {
        out.push(' ');
    }
}
