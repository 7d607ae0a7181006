//! Escaping and repair fixups.
//!
//! These run, in fixed order, over the fully assembled Maple code for one
//! block, immediately before it is quoted into the Möbius `maple('…')`
//! literal. Later rules see the output of earlier ones.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Characters that break the outer single-quoted Möbius literal.
const RESERVED: [u8; 4] = [b'[', b']', b'\'', b'/'];

/// Matches a `latex(…)` call with a flat (non-nested) argument list.
static LATEX_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"latex\s*\(([^()]*)\)").unwrap());

/// Detects an `output = …` option inside an argument list.
static OUTPUT_OPTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"output\s*=").unwrap());

/// Apply all fixup rules in order: latex repair, then reserved-character
/// escaping.
pub fn apply_fixups(code: &str) -> String {
    escape_reserved(&repair_latex_calls(code))
}

/// Append `output = string` to `latex(…)` calls that omit it.
///
/// This is a best-effort repair of a common authoring mistake, not a Maple
/// parser: it matches a call head with a flat argument list and leaves nested
/// or unbalanced calls alone.
pub fn repair_latex_calls(code: &str) -> String {
    LATEX_CALL
        .replace_all(code, |caps: &Captures<'_>| {
            let args = &caps[1];
            if OUTPUT_OPTION.is_match(args) {
                caps[0].to_string()
            } else {
                format!("latex({args}, output = string)")
            }
        })
        .into_owned()
}

/// Rewrite each reserved character `c` into the quote-concatenation form
/// `'"c"'`: close the outer single quote, splice the character as a
/// double-quoted fragment, reopen.
///
/// Already-escaped five-character runs are copied through untouched, so
/// re-running the pass never double-escapes.
pub fn escape_reserved(code: &str) -> String {
    let bytes = code.as_bytes();
    let mut out = String::with_capacity(code.len());
    let mut i = 0;
    while i < bytes.len() {
        if is_escaped_run(&bytes[i..]) {
            out.push_str(&code[i..i + 5]);
            i += 5;
            continue;
        }
        let b = bytes[i];
        if RESERVED.contains(&b) {
            out.push('\'');
            out.push('"');
            out.push(b as char);
            out.push('"');
            out.push('\'');
            i += 1;
        } else {
            // multi-byte UTF-8 is never reserved; copy the whole char
            let ch = code[i..].chars().next().unwrap_or('\u{fffd}');
            out.push(ch);
            i += ch.len_utf8();
        }
    }
    out
}

/// Whether `bytes` starts with an already-escaped `'"c"'` run.
fn is_escaped_run(bytes: &[u8]) -> bool {
    bytes.len() >= 5
        && bytes[0] == b'\''
        && bytes[1] == b'"'
        && RESERVED.contains(&bytes[2])
        && bytes[3] == b'"'
        && bytes[4] == b'\''
}
