//! Code generation for one code block.
//!
//! Assembles the generated Möbius unit from discrete template fragments:
//! the appended export statement, the mode wrapper, seed boilerplate, the
//! fixup pass, and finally the quote-and-bind frame around the `maple('…')`
//! invocation.

use std::fmt::Write as _;

use crate::directives::{DirectiveSet, GenerationMode};
use crate::export::Export;
use crate::fixup::apply_fixups;
use crate::names::NameMinter;

/// Locally defined assertion helper; block bodies may call it in every mode
/// except `NoAssert`.
const ASSERT_HELPER: &str = "evil_assert := proc(cond, msg := \"assertion failed\")\n    if not cond then\n        error msg\n    end if\nend proc:";

/// Statement enabling strict assertion checking in the engine.
const ASSERT_LEVEL: &str = "kernelopts(assertlevel = 2):";

/// Generate the emitted Möbius text for one code block.
///
/// The returned unit is the concatenation of any seed-draw bindings, the
/// engine invocation bound to a fresh result variable, and one positional
/// extraction statement per export, without a trailing newline.
pub fn generate_code_block(
    source: &str,
    directives: &DirectiveSet,
    minter: &mut NameMinter,
) -> String {
    let body = with_export_statement(source, &directives.exports);
    let wrapped = wrap_mode(&body, &directives.mode, minter);
    let (seed_bindings, maple_code) = apply_seed_policy(wrapped, directives, minter);
    let fixed = apply_fixups(&maple_code);

    let result_var = minter.mint("maple_result");
    let mut out = seed_bindings;
    let _ = writeln!(out, "${result_var} = maple('");
    out.push_str(&indent(&fixed, "    "));
    out.push_str("\n');");
    for (idx, export) in directives.exports.iter().enumerate() {
        let _ = write!(out, "\n${} = switch({idx}, ${result_var});", export.name);
    }
    log::debug!(
        "generated block: mode={:?}, {} export(s)",
        directives.mode,
        directives.exports.len()
    );
    out
}

/// Append the single display statement that evaluates every export value, so
/// the host can retrieve them positionally. Blocks without exports get none.
fn with_export_statement(source: &str, exports: &[Export]) -> String {
    if exports.is_empty() {
        return source.to_string();
    }
    let values: Vec<&str> = exports.iter().map(|e| e.value.as_str()).collect();
    format!(
        "{source}\n# Generated code follows:\n{};",
        values.join(", ")
    )
}

/// Wrap the block body according to its generation mode.
fn wrap_mode(body: &str, mode: &GenerationMode, minter: &mut NameMinter) -> String {
    match mode {
        GenerationMode::NoAssert => body.to_string(),
        GenerationMode::Debug | GenerationMode::Reproduce(_) => {
            format!("{ASSERT_LEVEL}\n{ASSERT_HELPER}\n{body}")
        }
        GenerationMode::Plain => format!(
            "{ASSERT_LEVEL}\n{ASSERT_HELPER}\nwhile true do\n    try\n{}\n        break\n    catch:\n    end try\nend do:",
            indent(body, "        ")
        ),
        GenerationMode::Test => {
            let iteration = minter.mint("evil_iteration");
            let state = minter.mint("evil_state");
            format!(
                "{ASSERT_LEVEL}\n{ASSERT_HELPER}\n{iteration} := 0:\nwhile true do\n    {iteration} := {iteration} + 1:\n    {state} := RandomTools:-GetState():\n    try\n{}\n    catch:\n        error sprintf(\"fuzzing failed on iteration %d: %s -- replay with #!evil_reproduce %a\", {iteration}, StringTools:-FormatMessage(lastexception[2 .. -1]), {state}):\n    end try\nend do:",
                indent(body, "        ")
            )
        }
    }
}

/// Prepend seeding statements per the block's seed policy.
///
/// Returns the Möbius-side seed bindings (possibly empty) and the Maple code
/// with its seeding prefix. Two draws are combined because the host RNG is
/// capped below the range a single draw would need.
fn apply_seed_policy(
    code: String,
    directives: &DirectiveSet,
    minter: &mut NameMinter,
) -> (String, String) {
    if let GenerationMode::Reproduce(state) = &directives.mode {
        let code = format!(
            "# debug override, do not deploy:\nRandomTools:-SetState('state' = {state}):\n{code}"
        );
        return (String::new(), code);
    }
    if !directives.use_random_seed {
        return (String::new(), code);
    }
    let hi = minter.mint("seed_hi");
    let lo = minter.mint("seed_lo");
    let bindings = format!("${hi} = rint(1000000000);\n${lo} = rint(1000000000);\n");
    let code = format!("randomize(${hi} * 1000000000 + ${lo}):\n{code}");
    (bindings, code)
}

/// Prefix each non-blank line of `text` with `prefix`.
fn indent(text: &str, prefix: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect();
    lines.join("\n")
}
