//! End-to-end lineage run: load, parse, extract, build

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::dialect::SqlDialect;
use crate::error::{Diagnostic, DiagnosticKind, LineageError};
use crate::export::LineageDocument;
use crate::extractor::extract_references;
use crate::graph::{GraphBuilder, LineageGraph};
use crate::loader::{load_dir, LoaderOptions, SqlSource};
use crate::parser::parse_source;

/// Options for a lineage run
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub dialect: SqlDialect,
    pub loader: LoaderOptions,
}

/// Outcome of a successful run: the graph plus every non-fatal condition
#[derive(Debug)]
pub struct LineageRun {
    pub graph: LineageGraph,
    pub diagnostics: Vec<Diagnostic>,
    /// Files that were read, in processing order
    pub files: Vec<PathBuf>,
    /// Non-empty statements seen across all files
    pub statements: usize,
}

impl LineageRun {
    pub fn document(&self) -> LineageDocument {
        LineageDocument::from_graph(&self.graph)
    }

    pub fn has_warnings(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }
}

/// Lineage pipeline over a directory of SQL files
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// Load every SQL file under `dir` and build its lineage graph.
    ///
    /// Only loader failures are fatal.
    pub fn run(&self, dir: &Path) -> Result<LineageRun, LineageError> {
        let sources = load_dir(dir, &self.options.loader)?;
        info!(dir = %dir.display(), files = sources.len(), dialect = %self.options.dialect, "loaded SQL sources");
        Ok(self.run_sources(&sources))
    }

    /// Build lineage from already loaded sources.
    ///
    /// All sources are parsed before the graph is assembled, since a view may
    /// reference another view defined in a later file.
    pub fn run_sources(&self, sources: &[SqlSource]) -> LineageRun {
        let mut diagnostics = Vec::new();
        let mut statements = 0;
        let mut definitions = Vec::new();

        for source in sources {
            let parsed = parse_source(source, self.options.dialect);
            debug!(
                file = %source.path.display(),
                statements = parsed.statements,
                definitions = parsed.definitions.len(),
                "parsed file"
            );
            statements += parsed.statements;
            diagnostics.extend(parsed.diagnostics);
            definitions.extend(parsed.definitions);
        }

        let mut builder = GraphBuilder::new();
        for parsed in &definitions {
            let definition = &parsed.definition;
            let references = extract_references(&definition.body);
            debug!(
                entity = %definition.name,
                upstream = references.len(),
                aliases = references.aliases().len(),
                "extracted references"
            );

            if !builder.define(&definition.name, definition.kind, references.tables()) {
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::DuplicateDefinition,
                        format!(
                            "'{}' is defined more than once; upstream sets are merged",
                            definition.name
                        ),
                    )
                    .with_source(&parsed.source)
                    .with_span(parsed.span)
                    .with_entities(vec![definition.name.key().to_string()]),
                );
            }
        }
        let graph = builder.build();

        for cycle in graph.cycles() {
            let mut path: Vec<&str> = cycle.clone();
            if let Some(&first) = cycle.first() {
                path.push(first);
            }
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::CycleWarning,
                    format!("dependency cycle: {}", path.join(" -> ")),
                )
                .with_help("lineage is expected to be acyclic; check the view definitions involved")
                .with_entities(cycle.iter().map(|s| s.to_string()).collect()),
            );
        }

        if graph.is_empty() {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::EmptyResult,
                    format!(
                        "no entities extracted from {} file(s) and {} statement(s)",
                        sources.len(),
                        statements
                    ),
                )
                .with_help("only CREATE VIEW and CREATE TABLE ... AS statements define lineage"),
            );
        }

        for diag in &diagnostics {
            match &diag.source {
                Some(source) => debug!(code = diag.code(), file = %source.display(), "{}", diag.message),
                None => debug!(code = diag.code(), "{}", diag.message),
            }
        }
        info!(
            entities = graph.len(),
            edges = graph.edge_count(),
            warnings = diagnostics.len(),
            "built lineage graph"
        );

        LineageRun {
            graph,
            diagnostics,
            files: sources.iter().map(|s| s.path.clone()).collect(),
            statements,
        }
    }
}
