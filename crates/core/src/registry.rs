//! The transform registry.
//!
//! Transforms are pure functions over [`Export`] values. The registry is
//! passed into the export parser rather than living as module state, so tests
//! can substitute alternate tables.

use std::collections::HashMap;

use crate::export::{Export, ExportError};

/// A transform taking no argument.
pub type NullaryTransform = fn(Export) -> Export;

/// A transform taking one raw-text argument.
///
/// The argument is whatever sat between the parentheses in the spec,
/// verbatim; interpreting it is entirely the transform's responsibility.
pub type UnaryTransform = fn(Export, &str) -> Export;

enum TransformFn {
    Nullary(NullaryTransform),
    Unary(UnaryTransform),
}

/// Named table of export transforms.
pub struct TransformRegistry {
    entries: HashMap<String, TransformFn>,
}

impl TransformRegistry {
    /// Create an empty registry.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The standard transform set: `string`, `latex`, `plot`, `suffix`, `dp`.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register_nullary("string", |x| {
            let value = format!("convert({}, string)", x.value);
            x.with_value(value)
        });
        registry.register_nullary("latex", |x| {
            let value = format!("latex({}, output = string)", x.value);
            x.with_value(value)
        });
        registry.register_nullary("plot", plot_transform);
        registry.register_unary("suffix", |x, arg| {
            let name = format!("{}_{arg}", x.name);
            x.with_name(name)
        });
        registry.register_unary("dp", |x, arg| {
            let value = format!(r#"sprintf("%.0{arg}f", {})"#, x.value);
            x.with_value(value)
        });
        registry
    }

    /// Register a no-argument transform under `name`.
    pub fn register_nullary(&mut self, name: impl Into<String>, transform: NullaryTransform) {
        self.entries
            .insert(name.into(), TransformFn::Nullary(transform));
    }

    /// Register a one-argument transform under `name`.
    pub fn register_unary(&mut self, name: impl Into<String>, transform: UnaryTransform) {
        self.entries.insert(name.into(), TransformFn::Unary(transform));
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Apply the transform `name` to `export`, checking arity against the
    /// presence of `arg`.
    pub fn apply(
        &self,
        name: &str,
        arg: Option<&str>,
        export: Export,
    ) -> Result<Export, ExportError> {
        let transform = self
            .entries
            .get(name)
            .ok_or_else(|| ExportError::UnknownTransform(name.to_string()))?;
        match (transform, arg) {
            (TransformFn::Nullary(f), None) => Ok(f(export)),
            (TransformFn::Nullary(_), Some(_)) => {
                Err(ExportError::UnexpectedArgument(name.to_string()))
            }
            (TransformFn::Unary(f), Some(arg)) => Ok(f(export, arg)),
            (TransformFn::Unary(_), None) => Err(ExportError::MissingArgument(name.to_string())),
        }
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Replace the value with a self-contained Maple proc that renders the value
/// as an SVG plot and evaluates to a base64 `data:` URI.
///
/// The explicit `Close` before the read-back is required: reading through the
/// still-buffered handle yields truncated data.
fn plot_transform(x: Export) -> Export {
    let value = format!(
        r#"(proc()
  file := FileTools:-TemporaryFile("", ".svg"):
  plottools:-exportplot(file, {}):
  FileTools:-Text:-Close(file):
  data := "data:image/svg+xml;base64," || (StringTools:-Encode(FileTools:-Text:-ReadFile(file), encoding = base64)):
  FileTools:-Remove(file):
  data
end proc)()"#,
        x.value
    );
    x.with_value(value)
}
