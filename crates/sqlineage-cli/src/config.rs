//! Configuration file handling

use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "sqlineage.toml";

/// Configuration for sqlineage
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Directory containing SQL files
    #[serde(default)]
    pub input: Option<String>,

    /// Lineage file to write
    #[serde(default)]
    pub output: Option<String>,

    /// Output format (json, yaml)
    #[serde(default)]
    pub format: Option<String>,

    /// SQL dialect
    #[serde(default)]
    pub dialect: Option<String>,

    /// Descend into subdirectories (default true)
    #[serde(default)]
    pub recursive: Option<bool>,

    /// File extensions to load (e.g., ["sql", "ddl"])
    #[serde(default)]
    pub extensions: Vec<String>,
}

/// Extract arguments given on the command line
#[derive(Debug, Default)]
pub struct ExtractOverrides<'a> {
    pub input: Option<&'a Path>,
    pub output: Option<&'a Path>,
    pub format: Option<&'a str>,
    pub dialect: Option<&'a str>,
    pub top_level_only: bool,
    pub extensions: &'a [String],
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        Self::parse(&contents).wrap_err_with(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).into_diagnostic()
    }

    /// Try to find and load sqlineage.toml in current directory or parent directories
    pub fn find_and_load() -> Result<Option<Self>> {
        let current_dir = std::env::current_dir().into_diagnostic()?;
        match Self::find_from(&current_dir) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using config file");
                Ok(Some(Self::from_file(&path)?))
            }
            None => Ok(None),
        }
    }

    fn find_from(start: &Path) -> Option<PathBuf> {
        let mut dir = start.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                return Some(config_path);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Merge CLI arguments into configuration
    /// CLI arguments take precedence over config file values
    pub fn merge_with_args(mut self, args: &ExtractOverrides<'_>) -> Self {
        if let Some(input) = args.input {
            self.input = Some(input.display().to_string());
        }

        if let Some(output) = args.output {
            self.output = Some(output.display().to_string());
        }

        if let Some(format) = args.format {
            self.format = Some(format.to_string());
        }

        if let Some(dialect) = args.dialect {
            self.dialect = Some(dialect.to_string());
        }

        if args.top_level_only {
            self.recursive = Some(false);
        }

        if !args.extensions.is_empty() {
            self.extensions = args.extensions.to_vec();
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config = Config::parse(
            r#"
input = "sql"
output = "data/schemas/sql_lineage.yml"
dialect = "mysql"
recursive = false
extensions = ["sql", "ddl"]
"#,
        )
        .unwrap();
        assert_eq!(config.input.as_deref(), Some("sql"));
        assert_eq!(config.recursive, Some(false));
        assert_eq!(config.extensions, vec!["sql", "ddl"]);
        assert_eq!(config.format, None);
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let config = Config::parse("input = \"sql\"\nunused = 1\n").unwrap();
        assert_eq!(config.input.as_deref(), Some("sql"));
    }

    #[test]
    fn test_cli_takes_precedence() {
        let config = Config {
            input: Some("from_config".to_string()),
            output: Some("config.json".to_string()),
            dialect: Some("sqlite".to_string()),
            extensions: vec!["ddl".to_string()],
            ..Config::default()
        };
        let extensions = vec!["sql".to_string()];
        let merged = config.merge_with_args(&ExtractOverrides {
            input: Some(Path::new("from_cli")),
            format: Some("yaml"),
            top_level_only: true,
            extensions: &extensions,
            ..ExtractOverrides::default()
        });

        assert_eq!(merged.input.as_deref(), Some("from_cli"));
        assert_eq!(merged.output.as_deref(), Some("config.json"));
        assert_eq!(merged.format.as_deref(), Some("yaml"));
        assert_eq!(merged.dialect.as_deref(), Some("sqlite"));
        assert_eq!(merged.recursive, Some(false));
        assert_eq!(merged.extensions, vec!["sql"]);
    }

    #[test]
    fn test_find_walks_up() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "input = \"sql\"\n").unwrap();

        let found = Config::find_from(&nested).unwrap();
        assert_eq!(found, tmp.path().join(CONFIG_FILE_NAME));
        assert_eq!(
            Config::from_file(&found).unwrap().input.as_deref(),
            Some("sql")
        );
    }
}
