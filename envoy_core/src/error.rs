//! Errors raised while decoding and encoding envoy resources.

use std::fmt::Display;

use thiserror::Error;

/// Result alias used throughout the decoders and encoders.
pub type Result<T> = std::result::Result<T, EnvoyError>;

/// Everything that can go wrong while turning documents into resources and back.
#[derive(Error, Debug)]
pub enum EnvoyError {
    /// The node is not the kind expected at this position (scalar, map or sequence).
    #[error("{message}: {location}")]
    Shape {
        /// What was expected
        message: String,
        /// Where the offending node sits in the source
        location: Location,
    },
    /// A key could not be turned into a valid identifier.
    #[error("{message}: {location}")]
    Reference {
        /// What was wrong with the reference
        message: String,
        /// Where the offending node sits in the source
        location: Location,
    },
    /// The node has the right shape but an unusable value.
    #[error("{message}: {location}")]
    Value {
        /// What was wrong with the value
        message: String,
        /// Where the offending node sits in the source
        location: Location,
    },
    /// The source text is not valid YAML.
    #[error("invalid yaml: {0}")]
    Syntax(String),
    /// Auxiliary nodes could not be bound to their primary resource.
    #[error("unable to bind {resource} resource: {message}")]
    Binding {
        /// The resource type being bound to
        resource: String,
        /// Why the binding failed
        message: String,
    },
    /// Encoded output could not be serialized.
    #[error("unable to serialize resources: {0}")]
    Serialize(String),
}

impl EnvoyError {
    /// The source location of the offending node, if the error has one.
    pub fn location(&self) -> Option<&Location> {
        match self {
            EnvoyError::Shape { location, .. }
            | EnvoyError::Reference { location, .. }
            | EnvoyError::Value { location, .. } => Some(location),
            _ => None,
        }
    }
}

/// A position in a source document, with a few lines of surrounding context.
///
/// Displays as
///
/// ```text
/// 3:5
///   alice:
///     - bob
/// ~~~~^
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
    /// The lines around the position with a marker under the column
    pub snippet: String,
}

impl Location {
    /// Build a location for the byte offset `pos` in `doc`, showing `lines_of_context`
    /// lines before and after the offending one.
    pub fn from_pos(doc: &str, pos: u64, lines_of_context: usize) -> Self {
        let pos = (pos as usize).min(doc.len());
        let lines = doc.split('\n').collect::<Vec<_>>();

        // find the line holding pos
        let mut start = 0;
        let mut line = 0;
        for (i, l) in lines.iter().enumerate() {
            line = i;
            if pos <= start + l.len() {
                break;
            }
            start += l.len() + 1;
        }
        let column = pos - start;

        let first = line.saturating_sub(lines_of_context);
        let last = (line + lines_of_context).min(lines.len().saturating_sub(1));

        let mut snippet = lines[first..=line].join("\n");
        snippet.push('\n');
        snippet.push_str(&format!("{}^", "~".repeat(column)));
        if last > line {
            snippet.push('\n');
            snippet.push_str(&lines[line + 1..=last].join("\n"));
        }

        Location {
            line: line + 1,
            column: column + 1,
            snippet,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}\n{}", self.line, self.column, self.snippet)
    }
}
