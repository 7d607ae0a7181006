//! Export values and the export-spec parser.
//!
//! An export spec looks like `total|dp(2)|suffix(rounded)`: an identifier
//! followed by a chain of transform calls applied left to right.

use serde::Serialize;
use thiserror::Error;

use crate::registry::TransformRegistry;

/// A named value computed by a code block and exposed to the Möbius side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Export {
    /// Identifier bound on the Möbius side (a `$` sigil is prepended at
    /// binding time).
    pub name: String,
    /// Maple expression that computes the exported quantity.
    pub value: String,
}

impl Export {
    /// Create an export whose value is a plain reference to `name`.
    pub fn identifier(name: impl Into<String>) -> Self {
        let name = name.into();
        let value = name.clone();
        Self { name, value }
    }

    /// Returns a new export with the same value and the supplied name.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: self.value.clone(),
        }
    }

    /// Returns a new export with the same name and the supplied value.
    pub fn with_value(&self, value: impl Into<String>) -> Self {
        Self {
            name: self.name.clone(),
            value: value.into(),
        }
    }
}

/// Errors produced while parsing one export spec.
///
/// These carry no source location; the directive extractor attaches the
/// offending line when it maps them into [`crate::CompileError`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExportError {
    /// The requested transform is not in the registry.
    #[error("unknown transform `{0}`")]
    UnknownTransform(String),
    /// A no-argument transform was called with parentheses.
    #[error("transform `{0}` takes no argument")]
    UnexpectedArgument(String),
    /// A one-argument transform was called without parentheses.
    #[error("transform `{0}` requires an argument")]
    MissingArgument(String),
    /// The final export name is not a valid binding identifier.
    #[error("export name `{0}` is not a valid identifier after transforms")]
    InvalidName(String),
    /// The spec text itself is unparsable (empty identifier, unclosed call).
    #[error("{0}")]
    Syntax(String),
}

/// Parse one export spec, applying requested transforms left to right.
///
/// The first `|`-segment is both the initial name and the initial value. With
/// no further segments the implicit `string` transform is applied once.
/// Transform argument text is passed through verbatim; the registry never
/// interprets it.
pub fn parse_export_spec(spec: &str, registry: &TransformRegistry) -> Result<Export, ExportError> {
    let spec = spec.trim();
    let mut segments = spec.split('|').map(str::trim);

    let ident = segments
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ExportError::Syntax(format!("export spec `{spec}` has no identifier")))?;
    let mut export = Export::identifier(ident);

    let mut applied_any = false;
    for segment in segments {
        let (name, arg) = split_transform_call(segment)?;
        export = registry.apply(name, arg, export)?;
        applied_any = true;
    }

    if !applied_any {
        export = registry.apply("string", None, export)?;
    }
    if !is_valid_identifier(&export.name) {
        return Err(ExportError::InvalidName(export.name));
    }
    Ok(export)
}

/// Whether `name` is a valid binding identifier (`[A-Za-z_][A-Za-z0-9_]*`).
fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split a transform call into its name and optional raw argument text.
///
/// `dp(2)` → `("dp", Some("2"))`; `latex` → `("latex", None)`. Everything
/// between the first `(` and the final `)` is returned verbatim: no nested
/// parenthesis handling, no escaping.
fn split_transform_call(segment: &str) -> Result<(&str, Option<&str>), ExportError> {
    match segment.find('(') {
        None => {
            if segment.is_empty() {
                return Err(ExportError::Syntax("empty transform call".to_string()));
            }
            Ok((segment, None))
        }
        Some(open) => {
            if !segment.ends_with(')') {
                return Err(ExportError::Syntax(format!(
                    "unclosed transform call `{segment}`"
                )));
            }
            let name = segment[..open].trim_end();
            if name.is_empty() {
                return Err(ExportError::Syntax(format!(
                    "transform call `{segment}` has no name"
                )));
            }
            Ok((name, Some(&segment[open + 1..segment.len() - 1])))
        }
    }
}
