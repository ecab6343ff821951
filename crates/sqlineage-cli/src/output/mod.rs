//! Output formatting

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sqlineage_core::{Diagnostic, Severity};

use crate::args::DiagnosticsFormat;

/// Output formatter for diagnostics
pub struct OutputFormatter {
    format: DiagnosticsFormat,
    /// Source text per file, read on first use for excerpts
    sources: HashMap<PathBuf, Option<String>>,
}

impl OutputFormatter {
    pub fn new(format: DiagnosticsFormat) -> Self {
        Self {
            format,
            sources: HashMap::new(),
        }
    }

    /// Print diagnostics in the configured format
    pub fn print_diagnostics(&mut self, diagnostics: &[Diagnostic]) {
        if diagnostics.is_empty() {
            return;
        }
        match self.format {
            DiagnosticsFormat::Human => self.print_human(diagnostics),
            DiagnosticsFormat::Json => self.print_json(diagnostics),
        }
    }

    fn print_human(&mut self, diagnostics: &[Diagnostic]) {
        for diag in diagnostics {
            let severity_str = match diag.severity {
                Severity::Warning => "\x1b[33mwarning\x1b[0m",
            };

            eprintln!("{}[{}]: {}", severity_str, diag.code(), diag.message);

            match (&diag.source, &diag.span) {
                (Some(file), Some(span)) => {
                    eprintln!("  --> {}:{}:{}", file.display(), span.line, span.column);
                    if let Some(source_line) = self.source_line(file, span.line) {
                        eprintln!("   |");
                        eprintln!("{:>3} | {}", span.line, source_line);
                        eprintln!("   | {}", caret_line(&source_line, span.column, span.length));
                    }
                }
                (Some(file), None) => eprintln!("  --> {}", file.display()),
                _ => {}
            }

            if let Some(help) = &diag.help {
                eprintln!("   = help: {}", help);
            }

            eprintln!();
        }
    }

    fn print_json(&self, diagnostics: &[Diagnostic]) {
        let entries: Vec<serde_json::Value> = diagnostics.iter().map(json_entry).collect();
        let output = serde_json::json!({ "diagnostics": entries });
        match serde_json::to_string_pretty(&output) {
            Ok(text) => eprintln!("{}", text),
            Err(e) => tracing::error!("failed to encode diagnostics: {}", e),
        }
    }

    fn source_line(&mut self, file: &Path, line: usize) -> Option<String> {
        let text = self
            .sources
            .entry(file.to_path_buf())
            .or_insert_with(|| std::fs::read_to_string(file).ok());
        get_source_line(text.as_deref()?, line).map(str::to_string)
    }
}

fn json_entry(diag: &Diagnostic) -> serde_json::Value {
    serde_json::json!({
        "code": diag.code(),
        "kind": diag.kind.name(),
        "severity": diag.severity,
        "message": diag.message,
        "file": diag.source.as_ref().map(|p| p.display().to_string()),
        "line": diag.span.map(|s| s.line),
        "column": diag.span.map(|s| s.column),
        "help": diag.help,
        "entities": diag.entities,
    })
}

/// Padding and carets under a 1-indexed character column.
///
/// `length` is in bytes; the underline is clipped to the characters left on
/// the line.
fn caret_line(source_line: &str, column: usize, length: usize) -> String {
    let skip = column.saturating_sub(1);
    let padding: String = source_line
        .chars()
        .take(skip)
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();
    let rest = source_line
        .char_indices()
        .nth(skip)
        .map(|(i, _)| &source_line[i..])
        .unwrap_or("");
    let width = rest
        .char_indices()
        .take_while(|(i, _)| *i < length)
        .count()
        .max(1);
    format!("{}{}", padding, "^".repeat(width))
}

/// Get a specific line from source (1-indexed)
fn get_source_line(source: &str, line: usize) -> Option<&str> {
    if line == 0 {
        return None;
    }
    source.lines().nth(line - 1)
}

/// Print a list of entity names, one per line, under a heading
pub fn print_entities(heading: &str, entities: &[&str]) {
    println!("{} ({}):", heading, entities.len());
    for entity in entities {
        println!("  {}", entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlineage_core::DiagnosticKind;

    #[test]
    fn test_get_source_line() {
        let source = "CREATE VIEW a AS\nSELECT * FROM b;\n";
        assert_eq!(get_source_line(source, 2), Some("SELECT * FROM b;"));
        assert_eq!(get_source_line(source, 0), None);
        assert_eq!(get_source_line(source, 5), None);
    }

    #[test]
    fn test_caret_line_counts_characters() {
        assert_eq!(caret_line("SELECT 1", 8, 1), "       ^");
        // 'é' and 'ü' are two bytes each
        let line = "-- café; SELECT * FROM über";
        assert_eq!(caret_line(line, 10, 8), "         ^^^^^^^^");
        assert_eq!(caret_line(line, 24, 100), format!("{}^^^^", " ".repeat(23)));
        assert_eq!(caret_line("\tx", 2, 1), "\t^");
        assert_eq!(caret_line("short", 40, 3), format!("{}^", " ".repeat(5)));
    }

    #[test]
    fn test_json_entry_fields() {
        let diag = Diagnostic::warning(DiagnosticKind::CycleWarning, "dependency cycle: a -> b -> a")
            .with_entities(vec!["a".to_string(), "b".to_string()]);
        let entry = json_entry(&diag);
        assert_eq!(entry["code"], "W0002");
        assert_eq!(entry["kind"], "cycle");
        assert_eq!(entry["severity"], "warning");
        assert_eq!(entry["file"], serde_json::Value::Null);
        assert_eq!(entry["entities"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_source_line_reads_file_once() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("v.sql");
        std::fs::write(&path, "CREATE VIEW a AS\nSELECT 1;").unwrap();

        let mut formatter = OutputFormatter::new(DiagnosticsFormat::Human);
        assert_eq!(formatter.source_line(&path, 2).as_deref(), Some("SELECT 1;"));
        std::fs::remove_file(&path).unwrap();
        assert_eq!(formatter.source_line(&path, 1).as_deref(), Some("CREATE VIEW a AS"));
        assert!(formatter
            .source_line(Path::new("missing.sql"), 1)
            .is_none());
    }
}
