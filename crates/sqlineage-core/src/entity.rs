//! Entity names and kinds

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Name of a table or view.
///
/// Identity is the normalized key (lower-cased, trimmed, dot-joined parts);
/// the display form keeps the casing it was first written with.
#[derive(Debug, Clone)]
pub struct EntityName {
    display: String,
    key: String,
}

impl EntityName {
    /// Build a name from its dotted parts, e.g. `["Sales", "Orders"]`
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let display = parts
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .collect::<Vec<_>>()
            .join(".");
        let key = normalize(&display);
        Self { display, key }
    }

    /// Parse from a dotted name like "schema.table" or just "table"
    pub fn parse(s: &str) -> Self {
        Self::from_parts(s.split('.'))
    }

    /// Normalized identity used as the graph key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Name as first written in the source
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Schema part of a qualified name, if present
    pub fn schema(&self) -> Option<&str> {
        self.key.rsplit_once('.').map(|(schema, _)| schema)
    }
}

impl PartialEq for EntityName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for EntityName {}

impl Hash for EntityName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl std::fmt::Display for EntityName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display)
    }
}

/// Normalize a name for graph identity
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// How an entity entered the lineage graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Defined by CREATE [MATERIALIZED] VIEW
    View,
    /// Defined by CREATE TABLE ... AS
    Table,
    /// Referenced but never defined in the input
    #[default]
    Source,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::View => write!(f, "view"),
            EntityKind::Table => write!(f, "table"),
            EntityKind::Source => write!(f, "source"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_name_parse() {
        let name = EntityName::parse("users");
        assert_eq!(name.schema(), None);
        assert_eq!(name.key(), "users");

        let name = EntityName::parse("Public.Users");
        assert_eq!(name.schema(), Some("public"));
        assert_eq!(name.key(), "public.users");
        assert_eq!(name.display(), "Public.Users");
    }

    #[test]
    fn test_identity_ignores_case() {
        assert_eq!(EntityName::parse("Orders"), EntityName::parse("orders "));
        assert_ne!(EntityName::parse("orders"), EntityName::parse("sales.orders"));
    }
}
