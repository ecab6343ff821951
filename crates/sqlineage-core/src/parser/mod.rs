//! Statement parsing: split, tokenize, recognize definitions

pub mod lexer;
mod splitter;
mod statement;

use tracing::{debug, trace};

use crate::dialect::SqlDialect;
use crate::error::{Diagnostic, DiagnosticKind, Span};
use crate::loader::SqlSource;

pub use lexer::{tokenize, Ident, Keyword, Punct, Token};
pub use splitter::{split_sql_statements, RawStatement};
pub use statement::{parse_definition, Definition, ParseIssue};
pub(crate) use statement::{object_name, Cursor};

/// A definition together with where it came from
#[derive(Debug, Clone)]
pub struct ParsedDefinition {
    pub definition: Definition,
    pub source: std::path::PathBuf,
    pub span: Span,
}

/// Result of parsing one source file
#[derive(Debug, Default)]
pub struct ParsedSource {
    pub definitions: Vec<ParsedDefinition>,
    pub diagnostics: Vec<Diagnostic>,
    /// Number of non-empty statements seen
    pub statements: usize,
}

/// Parse every statement of a source file.
///
/// Malformed statements become parse warnings; parsing always continues
/// with the next statement.
pub fn parse_source(source: &SqlSource, dialect: SqlDialect) -> ParsedSource {
    let parser_dialect = dialect.parser_dialect();
    let mut parsed = ParsedSource::default();

    for raw in split_sql_statements(&source.text) {
        let span = Span::locate(&source.text, raw.offset, raw.text.len());
        let tokens = match tokenize(parser_dialect.as_ref(), raw.text) {
            Ok(tokens) => tokens,
            Err(e) => {
                // Tokenizer locations are relative to the statement
                let rel_line = e.location.line.max(1) as usize;
                let line = span.line + rel_line - 1;
                let column = if rel_line == 1 {
                    span.column + (e.location.column as usize).saturating_sub(1)
                } else {
                    e.location.column as usize
                };
                parsed.statements += 1;
                parsed.diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::ParseWarning,
                        format!("statement skipped: {}", e.message),
                    )
                    .with_source(&source.path)
                    .with_span(Span { line, column, ..span }),
                );
                continue;
            }
        };
        if tokens.is_empty() {
            // comment-only fragment
            continue;
        }
        parsed.statements += 1;

        match parse_definition(&tokens) {
            Ok(Some(definition)) => {
                debug!(
                    file = %source.path.display(),
                    line = span.line,
                    entity = %definition.name,
                    "found {} definition",
                    definition.kind
                );
                parsed.definitions.push(ParsedDefinition {
                    definition,
                    source: source.path.clone(),
                    span,
                });
            }
            Ok(None) => {
                trace!(file = %source.path.display(), line = span.line, "skipping non-definitional statement");
            }
            Err(issue) => {
                let mut diag = Diagnostic::warning(
                    DiagnosticKind::ParseWarning,
                    format!("statement skipped: {}", issue.message),
                )
                .with_source(&source.path)
                .with_span(span);
                if let Some(help) = issue.help {
                    diag = diag.with_help(help);
                }
                parsed.diagnostics.push(diag);
            }
        }
    }

    parsed
}
