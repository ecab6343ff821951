//! SQL file discovery and loading

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::LineageError;

/// Options controlling which files are picked up from the input directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Descend into subdirectories
    pub recursive: bool,
    /// File extensions to load, without the leading dot
    pub extensions: Vec<String>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            extensions: vec!["sql".to_string()],
        }
    }
}

/// Text of one SQL file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlSource {
    pub path: PathBuf,
    pub text: String,
}

/// Load every matching SQL file under `dir`, sorted by path
pub fn load_dir(dir: &Path, options: &LoaderOptions) -> Result<Vec<SqlSource>, LineageError> {
    if !dir.exists() {
        return Err(LineageError::InputNotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(LineageError::InputNotDirectory {
            path: dir.to_path_buf(),
        });
    }

    fs::read_dir(dir).map_err(|source| LineageError::InputUnreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    let paths = discover(dir, options)?;
    debug!(dir = %dir.display(), files = paths.len(), "discovered SQL files");

    paths
        .into_iter()
        .map(|path| {
            let text = fs::read_to_string(&path).map_err(|source| LineageError::InputUnreadable {
                path: path.clone(),
                source,
            })?;
            Ok(SqlSource { path, text })
        })
        .collect()
}

/// Find matching files without reading them
pub fn discover(dir: &Path, options: &LoaderOptions) -> Result<Vec<PathBuf>, LineageError> {
    let root = glob::Pattern::escape(&dir.display().to_string());
    let pattern = if options.recursive {
        format!("{}/**/*", root)
    } else {
        format!("{}/*", root)
    };

    let entries = glob::glob(&pattern).map_err(|source| LineageError::InvalidPattern {
        pattern: pattern.clone(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| LineageError::InputUnreadable {
            path: err.path().to_path_buf(),
            source: err.into_error(),
        })?;
        if path.is_file() && has_extension(&path, &options.extensions) {
            paths.push(path);
        }
    }
    paths.sort();
    paths.dedup();

    Ok(paths)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        let err = load_dir(&missing, &LoaderOptions::default()).unwrap_err();
        assert!(matches!(err, LineageError::InputNotFound { .. }));
    }

    #[test]
    fn test_file_instead_of_directory() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.sql", "SELECT 1;");
        let err = load_dir(&tmp.path().join("a.sql"), &LoaderOptions::default()).unwrap_err();
        assert!(matches!(err, LineageError::InputNotDirectory { .. }));
    }

    /// Make `path` unreadable for the duration of `f`. Returns `None` when
    /// permissions are not enforced (e.g. running as root).
    #[cfg(unix)]
    fn with_unreadable<T>(path: &Path, f: impl FnOnce() -> T) -> Option<T> {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(path, fs::Permissions::from_mode(0o000)).unwrap();
        let result = if fs::read_dir(path).is_err() {
            Some(f())
        } else {
            None
        };
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
        result
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("locked");
        write(&root, "a.sql", "CREATE VIEW v AS SELECT * FROM t;");

        let Some(result) = with_unreadable(&root, || load_dir(&root, &LoaderOptions::default()))
        else {
            return;
        };
        match result {
            Err(LineageError::InputUnreadable { path, .. }) => assert_eq!(path, root),
            other => panic!("expected InputUnreadable, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.sql", "-- a");
        let nested = tmp.path().join("nested");
        write(&nested, "b.sql", "-- b");

        let Some(result) =
            with_unreadable(&nested, || load_dir(tmp.path(), &LoaderOptions::default()))
        else {
            return;
        };
        assert!(matches!(
            result,
            Err(LineageError::InputUnreadable { ref path, .. }) if path == &nested
        ));
    }

    #[test]
    fn test_empty_directory_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "notes.txt", "not sql");
        let sources = load_dir(tmp.path(), &LoaderOptions::default()).unwrap();
        assert!(sources.is_empty());
    }

    #[test]
    fn test_recursive_and_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "b.sql", "-- b");
        write(tmp.path(), "a.SQL", "-- a");
        write(tmp.path(), "nested/c.sql", "-- c");

        let sources = load_dir(tmp.path(), &LoaderOptions::default()).unwrap();
        let names: Vec<_> = sources
            .iter()
            .map(|s| s.path.strip_prefix(tmp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.SQL"),
                PathBuf::from("b.sql"),
                PathBuf::from("nested/c.sql")
            ]
        );
    }

    #[test]
    fn test_top_level_only() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.sql", "-- a");
        write(tmp.path(), "nested/c.sql", "-- c");

        let options = LoaderOptions {
            recursive: false,
            ..LoaderOptions::default()
        };
        let sources = load_dir(tmp.path(), &options).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].text, "-- a");
    }

    #[test]
    fn test_custom_extensions() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.sql", "-- a");
        write(tmp.path(), "b.ddl", "-- b");

        let options = LoaderOptions {
            recursive: true,
            extensions: vec![".ddl".to_string()],
        };
        let sources = load_dir(tmp.path(), &options).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].text, "-- b");
    }
}
