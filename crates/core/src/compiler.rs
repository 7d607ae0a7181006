//! The compile pipeline.
//!
//! One-way flow: block scanning → (per code block) directive extraction →
//! export parsing → code generation. Prose blocks bypass everything after the
//! scanner. The whole document is processed in memory, once; the first error
//! aborts the run with no partial output.

use crate::codegen::generate_code_block;
use crate::directives::extract_directives;
use crate::error::CompileError;
use crate::names::NameMinter;
use crate::registry::TransformRegistry;
use crate::scanner::{Block, scan_document};

/// Compile a whole annotated document into Möbius script text.
///
/// Each block becomes one printed unit, in document order: prose passes
/// through dedented, code blocks become their generated invocation frames.
pub fn compile_document(
    source: &str,
    registry: &TransformRegistry,
) -> Result<String, CompileError> {
    let blocks = scan_document(source)?;
    let mut minter = NameMinter::new();
    let mut output = String::new();

    for block in &blocks {
        match block {
            Block::Prose { text, .. } => {
                output.push_str(text);
                output.push('\n');
            }
            Block::Code { text, line } => {
                let directives = extract_directives(text, registry, *line)?;
                let unit = generate_code_block(text, &directives, &mut minter);
                output.push_str(&unit);
                output.push('\n');
            }
        }
    }

    log::debug!(
        "compiled {} block(s) into {} byte(s)",
        blocks.len(),
        output.len()
    );
    Ok(output)
}
