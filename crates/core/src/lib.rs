#![deny(missing_docs)]
//! mobweave core: compiles annotated Maple worksheets into Möbius question
//! scripts.
//!
//! The pipeline is block scanning → directive extraction → export parsing →
//! code generation → escaping; see [`compile_document`] for the single entry
//! point.

/// Per-block code generation (template assembly).
pub mod codegen;
/// Top-level compile pipeline.
pub mod compiler;
/// `#!` directive extraction and generation modes.
pub mod directives;
/// Core error and source-location types.
pub mod error;
/// Export values and the export-spec parser.
pub mod export;
/// Escaping and repair fixups.
pub mod fixup;
/// Unique generated-identifier minting.
pub mod names;
/// The export transform registry.
pub mod registry;
/// Document scanning into prose and code blocks.
pub mod scanner;

pub use codegen::generate_code_block;
pub use compiler::compile_document;
pub use directives::{DIRECTIVE_SIGIL, DirectiveSet, GenerationMode, extract_directives};
pub use error::{CompileError, SourceLocation};
pub use export::{Export, ExportError, parse_export_spec};
pub use fixup::{apply_fixups, escape_reserved, repair_latex_calls};
pub use names::NameMinter;
pub use registry::{NullaryTransform, TransformRegistry, UnaryTransform};
pub use scanner::{Block, PROSE_CLOSE, PROSE_OPEN, scan_document};
