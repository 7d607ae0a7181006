//! Document scanning.
//!
//! Splits an annotated worksheet into an ordered sequence of prose and code
//! blocks. Prose is wrapped in `(*!mobius … *)` markers and passes through
//! verbatim (after dedenting); everything else is Maple code. The scanner is
//! an explicit two-state loop over the remaining text, so ordinary `(*`
//! comment sequences inside code are not special.

use crate::error::{CompileError, SourceLocation};

/// Opening marker of a prose block. The rest of the marker line is treated as
/// an annotation and discarded when the block spans multiple lines.
pub const PROSE_OPEN: &str = "(*!mobius";

/// Closing marker of a prose block.
pub const PROSE_CLOSE: &str = "*)";

/// One document block, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Passthrough Möbius template text, already dedented.
    Prose {
        /// Dedented inner text.
        text: String,
        /// 1-based document line of the opening marker.
        line: usize,
    },
    /// Maple source plus `#!` directives, to be compiled.
    Code {
        /// Raw block text (surrounding whitespace stripped).
        text: String,
        /// 1-based document line where the block starts.
        line: usize,
    },
}

impl Block {
    /// The block's text content.
    pub fn text(&self) -> &str {
        match self {
            Block::Prose { text, .. } | Block::Code { text, .. } => text,
        }
    }

    /// 1-based document line where the block starts.
    pub fn line(&self) -> usize {
        match self {
            Block::Prose { line, .. } | Block::Code { line, .. } => *line,
        }
    }
}

/// Scan a whole document into blocks.
///
/// The loop strips surrounding whitespace from the remaining text, matches a
/// prose block at the fixed opening sequence if one starts here, and
/// otherwise consumes code greedily up to the next opening sequence. An
/// opening marker with no closer fails with
/// [`CompileError::UnterminatedBlock`].
pub fn scan_document(input: &str) -> Result<Vec<Block>, CompileError> {
    let mut blocks = Vec::new();
    let mut rest = input;
    let mut line = 1usize;

    loop {
        let trimmed = rest.trim_start();
        line += newline_count(&rest[..rest.len() - trimmed.len()]);
        rest = trimmed;
        if rest.is_empty() {
            break;
        }

        if rest.starts_with(PROSE_OPEN) {
            let open_line = line;
            let after_open = &rest[PROSE_OPEN.len()..];
            let close = after_open.find(PROSE_CLOSE).ok_or(CompileError::UnterminatedBlock {
                location: SourceLocation::new(open_line),
            })?;
            // Multi-line block: the remainder of the marker line is an
            // annotation, not content. Single-line block: the content sits
            // between the markers.
            let inner_start = match after_open.find('\n') {
                Some(nl) if nl < close => nl + 1,
                _ => 0,
            };
            let inner = after_open[inner_start..close].trim_end();
            blocks.push(Block::Prose {
                text: dedent(inner),
                line: open_line,
            });
            let consumed = PROSE_OPEN.len() + close + PROSE_CLOSE.len();
            line += newline_count(&rest[..consumed]);
            rest = &rest[consumed..];
        } else {
            let span = rest.find(PROSE_OPEN).unwrap_or(rest.len());
            let chunk = &rest[..span];
            blocks.push(Block::Code {
                text: chunk.trim_end().to_string(),
                line,
            });
            line += newline_count(chunk);
            rest = &rest[span..];
        }
    }

    log::debug!("scanned {} block(s)", blocks.len());
    Ok(blocks)
}

fn newline_count(text: &str) -> usize {
    text.bytes().filter(|b| *b == b'\n').count()
}

/// Remove the longest common leading whitespace from all non-blank lines.
/// Lines consisting solely of whitespace are normalized to empty.
fn dedent(text: &str) -> String {
    let mut prefix: Option<&str> = None;
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let ws_len = line.len() - line.trim_start().len();
        let ws = &line[..ws_len];
        prefix = Some(match prefix {
            None => ws,
            Some(current) => common_prefix(current, ws),
        });
        if prefix == Some("") {
            break;
        }
    }
    let prefix = prefix.unwrap_or("");

    let lines: Vec<&str> = text
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                line.strip_prefix(prefix).unwrap_or(line)
            }
        })
        .collect();
    lines.join("\n")
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let mut end = 0;
    for ((i, ca), cb) in a.char_indices().zip(b.chars()) {
        if ca != cb {
            break;
        }
        end = i + ca.len_utf8();
    }
    &a[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_no_blocks() {
        assert!(scan_document("").unwrap().is_empty());
        assert!(scan_document("  \n\t\n  ").unwrap().is_empty());
    }

    #[test]
    fn lone_code_block() {
        let blocks = scan_document("a := 1:\nb := 2:\n").unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0], Block::Code {
            text: "a := 1:\nb := 2:".to_string(),
            line: 1,
        });
    }

    #[test]
    fn prose_then_code_in_order() {
        let input = "(*!mobius intro\nHello $name;\n*)\nx := 3:\n";
        let blocks = scan_document(input).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], Block::Prose {
            text: "Hello $name;".to_string(),
            line: 1,
        });
        assert_eq!(blocks[1], Block::Code {
            text: "x := 3:".to_string(),
            line: 4,
        });
    }

    #[test]
    fn marker_line_annotation_is_discarded() {
        let input = "(*!mobius this text is ignored\ncontent\n*)";
        let blocks = scan_document(input).unwrap();
        assert_eq!(blocks[0].text(), "content");
    }

    #[test]
    fn single_line_prose_keeps_content() {
        let blocks = scan_document("(*!mobius inline text *)").unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text(), "inline text");
    }

    #[test]
    fn prose_is_dedented() {
        let input = "(*!mobius\n    line one\n      line two\n*)";
        let blocks = scan_document(input).unwrap();
        assert_eq!(blocks[0].text(), "line one\n  line two");
    }

    #[test]
    fn code_may_contain_plain_comments() {
        let input = "x := 1: (* ordinary comment *)\ny := 2:";
        let blocks = scan_document(input).unwrap();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].text().contains("(* ordinary comment *)"));
    }

    #[test]
    fn code_stops_at_prose_opening_mid_line() {
        let input = "x := 1: (*!mobius\ntail\n*)";
        let blocks = scan_document(input).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text(), "x := 1:");
        assert_eq!(blocks[1].text(), "tail");
    }

    #[test]
    fn unterminated_prose_fails() {
        let err = scan_document("x := 1:\n(*!mobius\nno closer").unwrap_err();
        match err {
            CompileError::UnterminatedBlock { location } => assert_eq!(location.line, 2),
            other => panic!("expected UnterminatedBlock, got {other:?}"),
        }
    }

    #[test]
    fn line_numbers_survive_interleaving() {
        let input = "\n\n(*!mobius\np1\n*)\n\ncode here\n\n(*!mobius\np2\n*)";
        let blocks = scan_document(input).unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].line(), 3);
        assert_eq!(blocks[1].line(), 7);
        assert_eq!(blocks[2].line(), 9);
    }

    #[test]
    fn dedent_ignores_blank_lines() {
        assert_eq!(dedent("    a\n\n    b"), "a\n\nb");
        // whitespace-only lines are normalized and don't shorten the prefix
        assert_eq!(dedent("    a\n  \n    b"), "a\n\nb");
    }

    #[test]
    fn dedent_mixed_indentation_keeps_relative_depth() {
        assert_eq!(dedent("  a\n    b"), "a\n  b");
        assert_eq!(dedent("a\n  b"), "a\n  b");
    }
}
