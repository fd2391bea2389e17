//! Applying replacement edits to source text and mapping the result back.

use oxc_sourcemap::SourceMapBuilder;

use lacquer_core::Location;

/// A byte-range replacement in the original source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Line start offsets for fast offset → location lookups.
#[derive(Debug)]
pub struct LineIndex<'s> {
    source: &'s str,
    line_starts: Vec<usize>,
}

impl<'s> LineIndex<'s> {
    pub fn new(source: &'s str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            source,
            line_starts,
        }
    }

    /// Location of a byte offset: 1-based line, UTF-16 column.
    pub fn location(&self, offset: usize) -> Location {
        let offset = offset.min(self.source.len());
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let column = utf16_len(&self.source[self.line_starts[line]..offset]);
        Location::new(line as u32 + 1, column)
    }
}

fn utf16_len(text: &str) -> u32 {
    text.chars().map(|c| c.len_utf16() as u32).sum()
}

/// Apply non-overlapping edits to `source`.
pub fn apply_edits(source: &str, edits: &[Edit]) -> String {
    let mut output = String::with_capacity(source.len());
    let mut last = 0;

    for edit in sorted(edits) {
        output.push_str(&source[last..edit.start]);
        output.push_str(&edit.text);
        last = edit.end;
    }

    output.push_str(&source[last..]);
    output
}

/// Build a source map for the output of [`apply_edits`].
///
/// Every output line of unchanged text maps to its original position, and
/// every replacement maps to the start and end of the range it replaced.
pub fn build_code_map(source: &str, edits: &[Edit], filename: &str) -> String {
    let index = LineIndex::new(source);
    let mut builder = SourceMapBuilder::default();
    builder.set_file(filename);
    let source_id = builder.add_source_and_content(filename, source);

    let mut generated = Cursor::default();
    let mut add_token = |generated: &Cursor, offset: usize| {
        let original = index.location(offset);
        builder.add_token(
            generated.line,
            generated.column,
            original.line - 1,
            original.column,
            Some(source_id),
            None,
        );
    };

    add_token(&generated, 0);
    let mut last = 0;

    for edit in sorted(edits) {
        copy_segment(source, last, edit.start, &mut generated, &mut add_token);
        add_token(&generated, edit.start);
        generated.advance(&edit.text);
        add_token(&generated, edit.end);
        last = edit.end;
    }
    copy_segment(source, last, source.len(), &mut generated, &mut add_token);

    builder.into_sourcemap().to_json_string()
}

/// Advance over unchanged text, emitting a token at the start of every new line.
fn copy_segment<F>(
    source: &str,
    start: usize,
    end: usize,
    generated: &mut Cursor,
    add_token: &mut F,
) where
    F: FnMut(&Cursor, usize),
{
    let segment = &source[start..end];
    let mut line_start = 0;

    for (i, _) in segment.match_indices('\n') {
        generated.line += 1;
        generated.column = 0;
        line_start = i + 1;
        if start + line_start < source.len() {
            add_token(generated, start + line_start);
        }
    }

    if line_start == 0 {
        generated.column += utf16_len(segment);
    } else {
        generated.column = utf16_len(&segment[line_start..]);
    }
}

/// Generated position (0-based line and UTF-16 column).
#[derive(Debug, Default)]
struct Cursor {
    line: u32,
    column: u32,
}

impl Cursor {
    fn advance(&mut self, text: &str) {
        match text.rfind('\n') {
            Some(pos) => {
                self.line += text.matches('\n').count() as u32;
                self.column = utf16_len(&text[pos + 1..]);
            }
            None => self.column += utf16_len(text),
        }
    }
}

fn sorted(edits: &[Edit]) -> Vec<&Edit> {
    let mut sorted: Vec<&Edit> = edits.iter().collect();
    sorted.sort_by_key(|edit| edit.start);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn edit(source: &str, target: &str, text: &str) -> Edit {
        let start = source.find(target).unwrap();
        Edit {
            start,
            end: start + target.len(),
            text: text.to_string(),
        }
    }

    #[test]
    fn applies_edits_in_offset_order() {
        let source = "const a = css`x`;\nconst b = css`y`;\n";
        let edits = vec![
            edit(source, "css`y`", "\"b\""),
            edit(source, "css`x`", "\"a\""),
        ];

        assert_eq!(
            apply_edits(source, &edits),
            "const a = \"a\";\nconst b = \"b\";\n"
        );
    }

    #[test]
    fn leaves_source_without_edits_untouched() {
        assert_eq!(apply_edits("let x = 1;", &[]), "let x = 1;");
    }

    #[test]
    fn locates_offsets() {
        let index = LineIndex::new("ab\ncd\n\nef");

        assert_eq!(index.location(0), Location::new(1, 0));
        assert_eq!(index.location(2), Location::new(1, 2));
        assert_eq!(index.location(3), Location::new(2, 0));
        assert_eq!(index.location(7), Location::new(4, 0));
        assert_eq!(index.location(100), Location::new(4, 2));
    }

    #[test]
    fn counts_columns_in_utf16_units() {
        let source = "// \u{1F600}\nx";
        let index = LineIndex::new(source);

        assert_eq!(index.location(7), Location::new(1, 5));
        assert_eq!(index.location(source.len()), Location::new(2, 1));
    }

    #[test]
    fn builds_code_map_for_multiline_replacement() {
        let source = "const a = css`\n  color: red;\n`;\nexport default a;\n";
        let edits = vec![edit(source, "css`\n  color: red;\n`", "\"a\"")];

        let map = build_code_map(source, &edits, "a.js");
        let json: serde_json::Value = serde_json::from_str(&map).unwrap();

        assert_eq!(json["version"], 3);
        assert_eq!(json["sources"], serde_json::json!(["a.js"]));
        assert_eq!(json["sourcesContent"], serde_json::json!([source]));
        // Tokens on two generated lines: the rewritten declaration and the export
        assert_eq!(json["mappings"].as_str().unwrap().matches(';').count(), 1);
    }

    #[test]
    fn tracks_cursor_over_multiline_text() {
        let mut cursor = Cursor::default();
        cursor.advance("ab");
        assert_eq!((cursor.line, cursor.column), (0, 2));
        cursor.advance("c\nde\nf");
        assert_eq!((cursor.line, cursor.column), (2, 1));
    }
}
