//! Lineage file export and re-import

use std::fs;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entity::{EntityKind, EntityName};
use crate::error::LineageError;
use crate::graph::{GraphBuilder, LineageGraph};

/// Serialization format of a lineage file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Yaml,
}

impl ExportFormat {
    /// Pick a format from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("yml" | "yaml") => ExportFormat::Yaml,
            _ => ExportFormat::Json,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "yaml" | "yml" => Ok(ExportFormat::Yaml),
            _ => Err(format!(
                "Unknown export format: '{}'. Supported formats: json, yaml.",
                s
            )),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// Exported lineage: entity key -> record.
///
/// `entities` is a map keyed by normalized entity name, not a list of
/// records. Consumers that read `entities` as a sequence of records with a
/// `name` field must iterate the map values instead; each record still
/// carries its display `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageDocument {
    pub entities: IndexMap<String, LineageRecord>,
}

/// One entity with its direct neighbours
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageRecord {
    /// Display name
    pub name: String,
    #[serde(default)]
    pub entity_type: EntityKind,
    #[serde(default)]
    pub upstream: Vec<String>,
    #[serde(default)]
    pub downstream: Vec<String>,
    /// Field metadata, filled in by contract generation
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// Field metadata attached to an entity by contract generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub pii: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl LineageDocument {
    /// One record per node, in graph order
    pub fn from_graph(graph: &LineageGraph) -> Self {
        let entities = graph
            .nodes()
            .map(|node| {
                let record = LineageRecord {
                    name: node.name.display().to_string(),
                    entity_type: node.kind,
                    upstream: node.upstream().map(str::to_string).collect(),
                    downstream: node.downstream().map(str::to_string).collect(),
                    fields: Vec::new(),
                };
                (node.key().to_string(), record)
            })
            .collect();
        Self { entities }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Encode in the given format
    pub fn to_string(&self, format: ExportFormat) -> Result<String, LineageError> {
        match format {
            ExportFormat::Json => serde_json::to_string_pretty(self)
                .map(|mut text| {
                    text.push('\n');
                    text
                })
                .map_err(|e| LineageError::Serialize(e.to_string())),
            ExportFormat::Yaml => {
                serde_yaml::to_string(self).map_err(|e| LineageError::Serialize(e.to_string()))
            }
        }
    }

    /// Decode from the given format
    pub fn parse(text: &str, format: ExportFormat) -> Result<Self, LineageError> {
        match format {
            ExportFormat::Json => {
                serde_json::from_str(text).map_err(|e| LineageError::Deserialize(e.to_string()))
            }
            ExportFormat::Yaml => {
                serde_yaml::from_str(text).map_err(|e| LineageError::Deserialize(e.to_string()))
            }
        }
    }

    /// Write to `path`, creating parent directories as needed
    pub fn write(&self, path: &Path, format: ExportFormat) -> Result<(), LineageError> {
        let text = self.to_string(format)?;
        let export_err = |source: std::io::Error| LineageError::Export {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(export_err)?;
        }
        fs::write(path, text).map_err(export_err)?;
        info!(path = %path.display(), entities = self.len(), %format, "wrote lineage file");
        Ok(())
    }

    /// Read a lineage file, inferring the format from its extension
    pub fn read(path: &Path) -> Result<Self, LineageError> {
        let text = fs::read_to_string(path).map_err(|source| LineageError::InputUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, ExportFormat::from_path(path))
    }
}

impl LineageGraph {
    /// Rebuild a graph from exported upstream lists.
    ///
    /// Downstream lists in the document are ignored; they are derived again
    /// from the upstream edges.
    pub fn from_document(document: &LineageDocument) -> Self {
        let mut builder = GraphBuilder::new();

        // Entities first so display names and kinds come from their own records
        for record in document.entities.values() {
            let name = EntityName::parse(&record.name);
            match record.entity_type {
                EntityKind::Source => builder.add_entity(&name),
                kind => {
                    builder.define(&name, kind, std::iter::empty::<&EntityName>());
                }
            }
        }

        for record in document.entities.values() {
            let name = EntityName::parse(&record.name);
            for upstream in &record.upstream {
                builder.add_edge(&EntityName::parse(upstream), &name);
            }
        }

        builder.build()
    }
}
