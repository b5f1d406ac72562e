use std::io;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    unescape::{unescape, UnescapeError},
    ShaderBlock, ShaderKind,
};

/// Closes (and, together with a matching name, opens) a shader literal.
const DELIMITER: &str = r#"""""#;

static SHADER_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\w+(Fragment|Vertex)Source\b").expect("shader name pattern is valid")
});

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("could not read line {line}")]
    Io {
        line: usize,
        #[source]
        source: io::Error,
    },
    #[error("could not decode escapes in `{name}` (line {line})")]
    Escape {
        name: String,
        line: usize,
        #[source]
        source: UnescapeError,
    },
}

/// Shader text exactly as it appeared between the markers.
#[derive(Debug, PartialEq, Eq)]
pub struct RawBlock {
    pub name: String,
    pub kind: ShaderKind,
    pub line: usize,
    pub lines: Vec<String>,
}

impl RawBlock {
    fn decode(self) -> Result<ShaderBlock, ExtractError> {
        let mut joined = self.lines.join("\n");

        // restore the last line's terminator so a trailing `\` reads as a line continuation
        let backslashes = joined.chars().rev().take_while(|&ch| ch == '\\').count();
        if backslashes % 2 == 1 {
            joined.push('\n');
        }

        match unescape(&joined) {
            Ok(source) => Ok(ShaderBlock {
                name: self.name,
                kind: self.kind,
                source,
                line: self.line,
            }),
            Err(source) => Err(ExtractError::Escape {
                name: self.name,
                line: self.line,
                source,
            }),
        }
    }
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Collecting {
        name: String,
        kind: ShaderKind,
        line: usize,
        lines: Vec<String>,
    },
}

/// Line-at-a-time state machine that finds shader literals.
///
/// While idle, a line ending in `"""` that also contains a
/// `<word>VertexSource` / `<word>FragmentSource` token opens a block. While
/// collecting, the next line ending in `"""` closes it, whatever else it
/// contains.
#[derive(Debug, Default)]
pub struct Scanner {
    state: State,
    line_number: usize,
}

impl Scanner {
    pub fn new() -> Scanner {
        Scanner::default()
    }

    pub fn is_collecting(&self) -> bool {
        matches!(self.state, State::Collecting { .. })
    }

    /// Feeds the next line, returning a block when this line closes one.
    pub fn feed(&mut self, line: &str) -> Option<RawBlock> {
        self.line_number += 1;
        let is_marker = line.trim_end().ends_with(DELIMITER);

        match &mut self.state {
            State::Idle => {
                if is_marker {
                    self.open(line);
                }
                None
            }
            State::Collecting { lines, .. } if !is_marker => {
                lines.push(line.to_owned());
                None
            }
            State::Collecting { .. } => match std::mem::take(&mut self.state) {
                State::Collecting {
                    name,
                    kind,
                    line,
                    lines,
                } => Some(RawBlock {
                    name,
                    kind,
                    line,
                    lines,
                }),
                State::Idle => None,
            },
        }
    }

    fn open(&mut self, line: &str) {
        let Some(captures) = SHADER_NAME.captures(line) else {
            trace!(line = self.line_number, "ignoring unnamed literal");
            return;
        };

        let Some(kind) = captures.get(1).and_then(|m| ShaderKind::from_suffix(m.as_str())) else {
            return;
        };

        self.state = State::Collecting {
            name: captures[0].to_owned(),
            kind,
            line: self.line_number,
            lines: Vec::new(),
        };
    }
}

/// Lazily pulls shader blocks out of a sequence of lines.
///
/// The first read or decode error is returned once, after which the iterator
/// is exhausted.
pub struct Extractor<I> {
    lines: I,
    scanner: Scanner,
    failed: bool,
}

impl<I> Extractor<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    pub fn new(lines: I) -> Self {
        Extractor {
            lines,
            scanner: Scanner::new(),
            failed: false,
        }
    }
}

impl<I> Iterator for Extractor<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    type Item = Result<ShaderBlock, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        for line in self.lines.by_ref() {
            let result = match line {
                Ok(line) => match self.scanner.feed(&line) {
                    Some(raw) => raw.decode(),
                    None => continue,
                },
                Err(source) => Err(ExtractError::Io {
                    line: self.scanner.line_number + 1,
                    source,
                }),
            };

            self.failed = result.is_err();
            return Some(result);
        }

        if self.scanner.is_collecting() {
            debug!("input ended inside an unterminated shader literal");
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_str(text: &str) -> Extractor<impl Iterator<Item = io::Result<String>> + '_> {
        Extractor::new(text.lines().map(|line| Ok(line.to_owned())))
    }

    fn blocks(text: &str) -> Vec<ShaderBlock> {
        extract_str(text).collect::<Result<_, _>>().unwrap()
    }

    #[test]
    fn single_vertex_block() {
        let text = r#"
private let overlayVertexSource = """
#version 300 es
void main() {\tgl_Position = vec4(0.0);\n}
"""
"#;
        assert_eq!(
            blocks(text),
            vec![ShaderBlock {
                name: "overlayVertexSource".into(),
                kind: ShaderKind::Vertex,
                source: "#version 300 es\nvoid main() {\tgl_Position = vec4(0.0);\n}".into(),
                line: 2,
            }]
        );
    }

    #[test]
    fn fragment_kind_from_suffix() {
        let text = "let quadFragmentSource = \"\"\"\nprecision mediump float;\n\"\"\"";
        let found = blocks(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "quadFragmentSource");
        assert_eq!(found[0].kind, ShaderKind::Fragment);
        assert_eq!(found[0].source, "precision mediump float;");
    }

    #[test]
    fn text_without_blocks_yields_nothing() {
        assert!(blocks("").is_empty());
        assert!(blocks("let x = 1\nlet fooVertexSource = \"inline\"\n").is_empty());
    }

    #[test]
    fn unnamed_literal_is_skipped() {
        let text = "let doc = \"\"\"\nnot a shader\n\"\"\"\n";
        assert!(blocks(text).is_empty());
    }

    #[test]
    fn name_must_end_at_word_boundary() {
        let text = "let fooVertexSources = \"\"\"\nbody\n\"\"\"\n";
        assert!(blocks(text).is_empty());
    }

    #[test]
    fn unterminated_block_is_dropped() {
        let text = "let fooVertexSource = \"\"\"\nvoid main() {}\n";
        assert!(blocks(text).is_empty());
    }

    #[test]
    fn multiple_blocks_in_order() {
        let text = "\
let aVertexSource = \"\"\"
a
\"\"\"
let ignored = 3
let bFragmentSource = \"\"\"
b1
b2
    \"\"\"
";
        let found = blocks(text);
        let names: Vec<_> = found.iter().map(|block| block.name.as_str()).collect();
        assert_eq!(names, ["aVertexSource", "bFragmentSource"]);
        assert_eq!(found[1].source, "b1\nb2");
        assert_eq!(found[1].line, 5);
    }

    #[test]
    fn scanner_opens_only_on_named_marker() {
        let mut scanner = Scanner::new();
        assert_eq!(scanner.feed("\"\"\""), None);
        assert!(!scanner.is_collecting());
        assert_eq!(scanner.feed("let xVertexSource = \"\"\"   "), None);
        assert!(scanner.is_collecting());
    }

    #[test]
    fn scanner_closes_on_any_marker() {
        let mut scanner = Scanner::new();
        scanner.feed("let xVertexSource = \"\"\"");
        assert_eq!(scanner.feed("  raw \\n line  "), None);
        let raw = scanner.feed("// comment that ends with \"\"\"").unwrap();
        assert_eq!(
            raw,
            RawBlock {
                name: "xVertexSource".into(),
                kind: ShaderKind::Vertex,
                line: 1,
                lines: vec!["  raw \\n line  ".into()],
            }
        );
        assert!(!scanner.is_collecting());
    }

    #[test]
    fn read_error_stops_extraction() {
        let lines = vec![
            Ok("let aVertexSource = \"\"\"".to_owned()),
            Err(io::Error::new(io::ErrorKind::InvalidData, "bad utf-8")),
            Ok("\"\"\"".to_owned()),
        ];
        let mut extractor = Extractor::new(lines.into_iter());
        assert!(matches!(
            extractor.next(),
            Some(Err(ExtractError::Io { line: 2, .. }))
        ));
        assert!(extractor.next().is_none());
    }

    #[test]
    fn trailing_backslash_on_last_line_continues() {
        let text = "let aVertexSource = \"\"\"\n#version 300 es\n#define X 1 \\\n\"\"\"";
        assert_eq!(blocks(text)[0].source, "#version 300 es\n#define X 1 ");

        // an escaped backslash is not a continuation
        let text = "let aVertexSource = \"\"\"\n// path\\\\\n\"\"\"";
        assert_eq!(blocks(text)[0].source, "// path\\");
    }

    #[test]
    fn bad_escape_names_the_shader() {
        let mut extractor = extract_str("let aFragmentSource = \"\"\"\n\\x4\n\"\"\"");
        match extractor.next() {
            Some(Err(ExtractError::Escape { name, line, .. })) => {
                assert_eq!(name, "aFragmentSource");
                assert_eq!(line, 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
