//! Field structure analysis.
//!
//! Turns a nested JSON sample document (a vendor's raw camera payload or the unified camera
//! schema) into the flat list of field paths offered when a transformation rule is edited.

mod targets;

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{ConsoleError, FieldAnalysisError};

pub use targets::{TargetField, TargetFieldOptions, STANDARD_TARGET_FIELDS};

pub const DEFAULT_MAX_DEPTH: usize = 32;
const ARRAY_SAMPLE_SUFFIX: &str = "[0]";

/// Character joining nested keys in a field path. It is shared with the server, which
/// parses the same paths when it executes the mapping rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathSeparator(char);

impl PathSeparator {
    pub const DOT: PathSeparator = PathSeparator('.');
    pub const DASH: PathSeparator = PathSeparator('-');

    pub fn as_char(&self) -> char {
        self.0
    }
}

impl Default for PathSeparator {
    fn default() -> Self {
        PathSeparator::DOT
    }
}

impl fmt::Display for PathSeparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PathSeparator {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None)
                if !c.is_alphanumeric() && !c.is_whitespace() && c != '[' && c != ']' =>
            {
                Ok(PathSeparator(c))
            }
            _ => Err(ConsoleError::Config(format!(
                "pathSeparator must be a single punctuation character other than '[' or ']', found '{}'",
                s
            ))),
        }
    }
}

/// Depth-first, pre-order flattening of a JSON sample into addressable field paths.
#[derive(Debug, Clone)]
pub struct FieldFlattener {
    separator: PathSeparator,
    max_depth: usize,
}

impl Default for FieldFlattener {
    fn default() -> Self {
        Self::new(PathSeparator::default(), DEFAULT_MAX_DEPTH)
    }
}

impl FieldFlattener {
    pub fn new(separator: PathSeparator, max_depth: usize) -> Self {
        Self {
            separator,
            max_depth,
        }
    }

    pub fn separator(&self) -> PathSeparator {
        self.separator
    }

    /// Flattens `value` into field paths in object-key order.
    ///
    /// - scalars emit their own path
    /// - objects recurse into every key, joined with the separator
    /// - arrays emit their own path, unless the first element is an object, in which case
    ///   only that element is sampled under `path[0]`
    ///
    /// A `null` or scalar root has no addressable field and yields no paths.
    pub fn flatten(&self, value: &Value) -> Result<Vec<String>, FieldAnalysisError> {
        let mut paths = Vec::new();
        if value.is_object() || value.is_array() {
            self.walk(value, "", 0, &mut paths)?;
        }
        tracing::debug!("Flattened field structure into {} paths", paths.len());
        Ok(paths)
    }

    fn walk(
        &self,
        value: &Value,
        path: &str,
        depth: usize,
        paths: &mut Vec<String>,
    ) -> Result<(), FieldAnalysisError> {
        if depth > self.max_depth {
            return Err(FieldAnalysisError::TooDeep {
                path: path.to_string(),
                max_depth: self.max_depth,
            });
        }

        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    let child_path = self.join(path, key);
                    self.walk(child, &child_path, depth + 1, paths)?;
                }
            }
            Value::Array(items) => match items.first() {
                Some(first @ Value::Object(_)) => {
                    let sample_path = format!("{}{}", path, ARRAY_SAMPLE_SUFFIX);
                    self.walk(first, &sample_path, depth + 1, paths)?;
                }
                _ if !path.is_empty() => paths.push(path.to_string()),
                _ => {}
            },
            _ => paths.push(path.to_string()),
        }
        Ok(())
    }

    fn join(&self, prefix: &str, key: &str) -> String {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}{}{}", prefix, self.separator, key)
        }
    }
}
