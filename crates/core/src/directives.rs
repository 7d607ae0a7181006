//! Directive extraction.
//!
//! Scans a code block line by line for `#!` directives and derives the
//! block's [`DirectiveSet`]: its ordered export list, its generation mode,
//! and whether seed boilerplate is emitted. Directive lines stay in the block
//! body (they are Maple comments); extraction never rewrites the code.

use serde::Serialize;

use crate::error::CompileError;
use crate::export::{Export, ExportError, parse_export_spec};
use crate::registry::TransformRegistry;

/// Directive sigil. Each directive occupies its own line.
pub const DIRECTIVE_SIGIL: &str = "#!";

/// How a code block's generated Maple invocation is wrapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Default: assertion-enabled retry loop, breaking on first success.
    Plain,
    /// Single attempt with assertions enabled; failures propagate.
    Debug,
    /// Fuzz loop: run forever, abort and report on the first failure.
    Test,
    /// No wrapping at all; the block runs exactly as written.
    NoAssert,
    /// Single attempt replaying a captured RNG state.
    Reproduce(String),
}

/// Per-block configuration derived from its directives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectiveSet {
    /// Exports in source order; the order fixes positional extraction.
    pub exports: Vec<Export>,
    /// Resolved generation mode (mutually exclusive, fixed precedence).
    pub mode: GenerationMode,
    /// Whether random-seed boilerplate is emitted.
    pub use_random_seed: bool,
}

/// Extract the directive set from one code block.
///
/// `block_line` is the 1-based document line where the block starts; it is
/// used to attach locations to diagnostics. Mode precedence, first match
/// wins: `evil_noassert` > (`evil_reproduce` over `evil_debug`) >
/// `evil_test` > `Plain`. `evil_reproduce` always pins the seed, overriding
/// the absence of `evil_norandom`.
pub fn extract_directives(
    code: &str,
    registry: &TransformRegistry,
    block_line: usize,
) -> Result<DirectiveSet, CompileError> {
    let mut exports = Vec::new();
    let mut norandom = false;
    let mut noassert = false;
    let mut debug = false;
    let mut test = false;
    let mut reproduce: Option<String> = None;

    for (offset, raw_line) in code.lines().enumerate() {
        let line_no = block_line + offset;
        let Some(directive) = raw_line.trim().strip_prefix(DIRECTIVE_SIGIL) else {
            continue;
        };
        let directive = directive.trim();
        let (name, payload) = match directive.split_once(char::is_whitespace) {
            Some((name, payload)) => (name, payload.trim()),
            None => (directive, ""),
        };

        match name {
            "export" => {
                if payload.is_empty() {
                    return Err(CompileError::malformed_directive(
                        "export directive lists no specs",
                        line_no,
                    ));
                }
                for spec in payload.split([',', ' ', '\t']).filter(|s| !s.is_empty()) {
                    let export = parse_export_spec(spec, registry)
                        .map_err(|err| attach_location(err, line_no))?;
                    exports.push(export);
                }
            }
            "evil_norandom" => {
                expect_no_payload(name, payload, line_no)?;
                norandom = true;
            }
            "evil_test" => {
                expect_no_payload(name, payload, line_no)?;
                test = true;
            }
            "evil_noassert" => {
                expect_no_payload(name, payload, line_no)?;
                noassert = true;
            }
            "evil_debug" => {
                expect_no_payload(name, payload, line_no)?;
                debug = true;
            }
            "evil_reproduce" => {
                if payload.is_empty() {
                    return Err(CompileError::malformed_directive(
                        "evil_reproduce requires a captured state token",
                        line_no,
                    ));
                }
                reproduce = Some(payload.to_string());
            }
            other => {
                return Err(CompileError::malformed_directive(
                    format!("unknown directive `{other}`"),
                    line_no,
                ));
            }
        }
    }

    if norandom && reproduce.is_some() {
        log::warn!("evil_norandom is redundant: evil_reproduce already pins the seed");
    }

    let mode = if noassert {
        GenerationMode::NoAssert
    } else if let Some(state) = reproduce {
        GenerationMode::Reproduce(state)
    } else if debug {
        GenerationMode::Debug
    } else if test {
        GenerationMode::Test
    } else {
        GenerationMode::Plain
    };

    let use_random_seed = !norandom && !matches!(mode, GenerationMode::Reproduce(_));

    Ok(DirectiveSet {
        exports,
        mode,
        use_random_seed,
    })
}

fn expect_no_payload(name: &str, payload: &str, line_no: usize) -> Result<(), CompileError> {
    if payload.is_empty() {
        Ok(())
    } else {
        Err(CompileError::malformed_directive(
            format!("directive `{name}` takes no argument"),
            line_no,
        ))
    }
}

fn attach_location(err: ExportError, line_no: usize) -> CompileError {
    let location = crate::error::SourceLocation::new(line_no);
    match err {
        ExportError::UnknownTransform(name) => CompileError::UnknownTransform { name, location },
        ExportError::UnexpectedArgument(_) | ExportError::MissingArgument(_) => {
            CompileError::TransformArityMismatch {
                message: err.to_string(),
                location,
            }
        }
        ExportError::InvalidName(_) => CompileError::MalformedDirective {
            message: err.to_string(),
            location,
        },
        ExportError::Syntax(message) => CompileError::MalformedDirective { message, location },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(code: &str) -> Result<DirectiveSet, CompileError> {
        extract_directives(code, &TransformRegistry::standard(), 1)
    }

    #[test]
    fn plain_block_has_defaults() {
        let set = extract("x := rand():").unwrap();
        assert!(set.exports.is_empty());
        assert_eq!(set.mode, GenerationMode::Plain);
        assert!(set.use_random_seed);
    }

    #[test]
    fn exports_split_on_commas_and_whitespace() {
        let set = extract("#!export a, b|latex  c\nx := 1:").unwrap();
        let names: Vec<&str> = set.exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(set.exports[1].value, "latex(b, output = string)");
    }

    #[test]
    fn repeated_export_lines_concatenate_in_order() {
        let set = extract("#!export a\ncode\n#!export b\n").unwrap();
        let names: Vec<&str> = set.exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn norandom_suppresses_seed() {
        let set = extract("#!evil_norandom\nx := 1:").unwrap();
        assert!(!set.use_random_seed);
        assert_eq!(set.mode, GenerationMode::Plain);
    }

    #[test]
    fn test_mode_is_selected() {
        let set = extract("#!evil_test\nx := 1:").unwrap();
        assert_eq!(set.mode, GenerationMode::Test);
        assert!(set.use_random_seed);
    }

    #[test]
    fn reproduce_pins_seed_even_without_norandom() {
        let set = extract("#!evil_reproduce 12345\nx := 1:").unwrap();
        assert_eq!(set.mode, GenerationMode::Reproduce("12345".to_string()));
        assert!(!set.use_random_seed);
    }

    #[test]
    fn reproduce_state_may_contain_spaces() {
        let set = extract("#!evil_reproduce [1, 2, 3]\n").unwrap();
        assert_eq!(set.mode, GenerationMode::Reproduce("[1, 2, 3]".to_string()));
    }

    #[test]
    fn noassert_beats_everything() {
        let set = extract("#!evil_noassert\n#!evil_test\n#!evil_debug\n").unwrap();
        assert_eq!(set.mode, GenerationMode::NoAssert);
    }

    #[test]
    fn reproduce_beats_debug_and_test() {
        let set = extract("#!evil_debug\n#!evil_reproduce 9\n#!evil_test\n").unwrap();
        assert_eq!(set.mode, GenerationMode::Reproduce("9".to_string()));
    }

    #[test]
    fn debug_beats_test() {
        let set = extract("#!evil_test\n#!evil_debug\n").unwrap();
        assert_eq!(set.mode, GenerationMode::Debug);
    }

    #[test]
    fn reproduce_without_state_is_malformed() {
        let err = extract("#!evil_reproduce\n").unwrap_err();
        assert!(matches!(err, CompileError::MalformedDirective { .. }), "{err:?}");
    }

    #[test]
    fn unknown_directive_is_malformed() {
        let err = extract("#!evil_unknown\n").unwrap_err();
        assert!(matches!(err, CompileError::MalformedDirective { .. }), "{err:?}");
    }

    #[test]
    fn flag_directive_with_payload_is_malformed() {
        let err = extract("#!evil_test always\n").unwrap_err();
        assert!(matches!(err, CompileError::MalformedDirective { .. }), "{err:?}");
    }

    #[test]
    fn empty_export_directive_is_malformed() {
        let err = extract("#!export\n").unwrap_err();
        assert!(matches!(err, CompileError::MalformedDirective { .. }), "{err:?}");
    }

    #[test]
    fn unknown_transform_reports_directive_line() {
        let err = extract_directives(
            "x := 1:\n#!export y|frobnicate\n",
            &TransformRegistry::standard(),
            10,
        )
        .unwrap_err();
        match err {
            CompileError::UnknownTransform { name, location } => {
                assert_eq!(name, "frobnicate");
                assert_eq!(location.line, 11);
            }
            other => panic!("expected UnknownTransform, got {other:?}"),
        }
    }

    #[test]
    fn arity_mismatch_is_reported() {
        let err = extract("#!export x|string(2)\n").unwrap_err();
        assert!(
            matches!(err, CompileError::TransformArityMismatch { .. }),
            "{err:?}"
        );
    }

    #[test]
    fn directive_must_start_the_line() {
        // an inline mention is ordinary Maple comment text
        let set = extract("x := 1: # see #!evil_test for fuzzing\n").unwrap();
        assert_eq!(set.mode, GenerationMode::Plain);
    }
}
