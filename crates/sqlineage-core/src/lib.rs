//! sqlineage-core: table-level SQL lineage
//!
//! This library reads SQL view and table definitions, extracts the tables
//! each definition reads from, and assembles the result into a directed
//! lineage graph for impact analysis and contract generation.

pub mod dialect;
pub mod entity;
pub mod error;
pub mod export;
pub mod extractor;
pub mod graph;
pub mod loader;
pub mod parser;
pub mod pipeline;

pub use dialect::SqlDialect;
pub use entity::{EntityKind, EntityName};
pub use error::{Diagnostic, DiagnosticKind, LineageError, Severity, Span};
pub use export::{ExportFormat, LineageDocument, LineageRecord};
pub use extractor::{extract_references, TableReferences};
pub use graph::{GraphBuilder, LineageGraph, Node};
pub use loader::{LoaderOptions, SqlSource};
pub use pipeline::{LineageRun, Pipeline, PipelineOptions};
