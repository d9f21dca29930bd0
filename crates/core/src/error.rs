use thiserror::Error;

/// Where a parse failure happened in the note's source, 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Line number.
    pub line: usize,
    /// Column number.
    pub column: usize,
}

impl SourceLocation {
    /// Location at the given line and column.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors that can occur while transforming a note.
///
/// A `Parse` error is a hard failure for the single document being
/// processed; it never aborts sibling documents. Frontmatter problems
/// are a separate type
/// ([`FrontmatterError`](crate::frontmatter::FrontmatterError)) because
/// the pipeline downgrades them to logged no-ops instead of failing.
#[derive(Debug, Error)]
pub enum NotemillError {
    /// markdown-rs parser error surfaced through the adapter.
    #[error("Parse error at {location}: {message}")]
    Parse {
        /// Error message
        message: String,
        /// Source location
        location: SourceLocation,
    },
    /// The parsed tree contained a node kind the pipeline cannot represent.
    #[error("Unsupported markdown construct: {0}")]
    UnsupportedConstruct(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_carry_their_location() {
        let err = NotemillError::Parse {
            message: "bad".to_string(),
            location: SourceLocation::new(3, 7),
        };
        assert_eq!(err.to_string(), "Parse error at 3:7: bad");
    }
}
