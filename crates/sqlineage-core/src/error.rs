//! Error and diagnostic types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors that abort a lineage run
#[derive(Debug, Error, miette::Diagnostic)]
pub enum LineageError {
    #[error("input directory not found: {}", path.display())]
    #[diagnostic(
        code(sqlineage::input_not_found),
        help("check the path passed as INPUT_DIR or the `input` key in sqlineage.toml")
    )]
    InputNotFound { path: PathBuf },

    #[error("input path is not a directory: {}", path.display())]
    #[diagnostic(code(sqlineage::input_not_directory))]
    InputNotDirectory { path: PathBuf },

    #[error("failed to read {}", path.display())]
    #[diagnostic(code(sqlineage::input_unreadable))]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid file pattern '{pattern}'")]
    #[diagnostic(code(sqlineage::invalid_pattern))]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to write lineage file {}", path.display())]
    #[diagnostic(code(sqlineage::export))]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode lineage document: {0}")]
    #[diagnostic(code(sqlineage::serialize))]
    Serialize(String),

    #[error("failed to decode lineage document: {0}")]
    #[diagnostic(code(sqlineage::deserialize))]
    Deserialize(String),
}

/// Source location span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset from start of source
    pub offset: usize,
    /// Length in bytes
    pub length: usize,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl Span {
    /// Create a span for a byte range of `source`, computing line and column
    pub fn locate(source: &str, offset: usize, length: usize) -> Self {
        let (line, column) = offset_to_line_col(source, offset);
        Self {
            offset,
            length,
            line,
            column,
        }
    }
}

/// Convert byte offset to line and column (1-indexed)
pub fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;

    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
}

/// Non-fatal condition collected during a lineage run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    /// File the diagnostic refers to, if any
    pub source: Option<PathBuf>,
    pub span: Option<Span>,
    pub help: Option<String>,
    /// Entities involved (cycle members, duplicated entity)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<String>,
}

impl Diagnostic {
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message: message.into(),
            source: None,
            span: None,
            help: None,
            entities: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_entities(mut self, entities: Vec<String>) -> Self {
        self.entities = entities;
        self
    }

    /// Get the diagnostic code string (e.g., "W0001")
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

/// Types of diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// W0001: Statement could not be isolated into name and body
    ParseWarning,
    /// W0002: Dependency cycle in the lineage graph
    CycleWarning,
    /// W0003: No entities were extracted
    EmptyResult,
    /// W0004: The same entity is defined more than once
    DuplicateDefinition,
}

impl DiagnosticKind {
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::ParseWarning => "W0001",
            DiagnosticKind::CycleWarning => "W0002",
            DiagnosticKind::EmptyResult => "W0003",
            DiagnosticKind::DuplicateDefinition => "W0004",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticKind::ParseWarning => "parse-warning",
            DiagnosticKind::CycleWarning => "cycle",
            DiagnosticKind::EmptyResult => "empty-result",
            DiagnosticKind::DuplicateDefinition => "duplicate-definition",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_to_line_col() {
        let source = "SELECT 1;\nCREATE VIEW v AS\n  SELECT 2";
        assert_eq!(offset_to_line_col(source, 0), (1, 1));
        assert_eq!(offset_to_line_col(source, 10), (2, 1));
        assert_eq!(offset_to_line_col(source, 29), (3, 3));
    }

    #[test]
    fn test_diagnostic_code() {
        let diag = Diagnostic::warning(DiagnosticKind::CycleWarning, "cycle: a -> b -> a");
        assert_eq!(diag.code(), "W0002");
        assert_eq!(diag.severity, Severity::Warning);
    }
}
