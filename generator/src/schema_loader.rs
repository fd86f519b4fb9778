// Schema file loading: extension fallback, duplicate-file skipping, cross-file name checks

use crate::schema::Struct;
use crate::schema_parser::{self, ParseError};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const SCHEMA_EXTENSION: &str = "mrtype";

#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, source: io::Error },
    Parse(ParseError),
    DuplicateStruct { name: String, first: PathBuf, second: PathBuf },
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io { path, source } => write!(f, "Failed to read {}: {}", path.display(), source),
            LoadError::Parse(e) => Display::fmt(e, f),
            LoadError::DuplicateStruct { name, first, second } => write!(
                f,
                "Struct '{}' is declared in both {} and {}",
                name,
                first.display(),
                second.display()
            ),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Parse(e) => Some(e),
            LoadError::DuplicateStruct { .. } => None,
        }
    }
}

impl From<ParseError> for LoadError {
    fn from(value: ParseError) -> Self {
        LoadError::Parse(value)
    }
}

/// A path that doesn't exist and lacks the schema extension gets it appended.
pub fn resolve_schema_path(raw: &Path) -> PathBuf {
    if raw.exists() || raw.extension().is_some_and(|ext| ext == SCHEMA_EXTENSION) {
        return raw.to_path_buf();
    }
    let mut with_extension = raw.as_os_str().to_os_string();
    with_extension.push(".");
    with_extension.push(SCHEMA_EXTENSION);
    PathBuf::from(with_extension)
}

/// Parse every schema file in order into one struct list. A file given twice
/// is read once.
pub fn load_schemas(paths: &[PathBuf]) -> Result<Vec<Struct>, LoadError> {
    let mut seen = HashSet::new();
    let mut structs: Vec<Struct> = Vec::new();
    let mut origins: Vec<PathBuf> = Vec::new();

    for raw in paths {
        let path = resolve_schema_path(raw);
        if !seen.insert(path.clone()) {
            log::debug!("skipping already loaded schema {}", path.display());
            continue;
        }

        let source = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        let parsed = schema_parser::parse_schema_with_file(&source, &path.to_string_lossy())?;
        log::info!("loaded {} structs from {}", parsed.len(), path.display());

        for parsed_struct in parsed {
            if let Some(existing) = structs.iter().position(|s| s.name == parsed_struct.name) {
                return Err(LoadError::DuplicateStruct {
                    name: parsed_struct.name,
                    first: origins[existing].clone(),
                    second: path,
                });
            }
            structs.push(parsed_struct);
            origins.push(path.clone());
        }
    }

    Ok(structs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_extension_only_when_missing() {
        assert_eq!(
            resolve_schema_path(Path::new("does/not/exist/game")),
            PathBuf::from("does/not/exist/game.mrtype")
        );
        assert_eq!(
            resolve_schema_path(Path::new("does/not/exist/game.mrtype")),
            PathBuf::from("does/not/exist/game.mrtype")
        );
    }

    #[test]
    fn loads_and_merges_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.mrtype");
        let b = dir.path().join("b.mrtype");
        fs::write(&a, "Vec2 :: struct {\n x: f32,\n y: f32,\n}\n").unwrap();
        fs::write(&b, "Player :: struct {\n pos: Vec2,\n}\n").unwrap();

        let structs = load_schemas(&[dir.path().join("a"), b.clone(), a.clone()]).unwrap();
        let names: Vec<&str> = structs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Vec2", "Player"]);
    }

    #[test]
    fn duplicate_across_files_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.mrtype");
        let b = dir.path().join("b.mrtype");
        fs::write(&a, "S :: struct {\n x: u8,\n}\n").unwrap();
        fs::write(&b, "S :: struct {\n y: u8,\n}\n").unwrap();

        match load_schemas(&[a.clone(), b.clone()]) {
            Err(LoadError::DuplicateStruct { name, first, second }) => {
                assert_eq!(name, "S");
                assert_eq!(first, a);
                assert_eq!(second, b);
            }
            other => panic!("expected duplicate error, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.mrtype");
        let err = load_schemas(&[missing.clone()]).unwrap_err();
        assert!(matches!(&err, LoadError::Io { path, .. } if *path == missing));
        assert!(err.to_string().contains("nope.mrtype"));
    }

    #[test]
    fn parse_errors_carry_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.mrtype");
        fs::write(&bad, "S :: struct {\n x: u8[0],\n}\n").unwrap();
        match load_schemas(&[bad]) {
            Err(LoadError::Parse(e)) => {
                assert!(e.file.ends_with("bad.mrtype"));
                assert_eq!(e.line, 2);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
