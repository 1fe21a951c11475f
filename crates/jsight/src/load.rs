//! Reading schemas, types and documents from disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use jsight_schema::{Schema, SchemaError, SourceFile};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Reads a file into a [`SourceFile`] named after its path.
pub fn read_source(path: &Path) -> Result<Arc<SourceFile>, LoadError> {
    let content = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SourceFile::new(path.display().to_string(), content))
}

/// Collects a schema file and the type and rule files it depends on.
#[derive(Debug, Clone)]
pub struct SchemaLoader {
    schema: PathBuf,
    offset: Option<usize>,
    types: Vec<(String, PathBuf)>,
    rules: Vec<(String, PathBuf)>,
}

impl SchemaLoader {
    pub fn new(schema: impl Into<PathBuf>) -> Self {
        Self {
            schema: schema.into(),
            offset: None,
            types: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Reads the schema starting at byte `offset` of the file, ending where
    /// its top-level value ends.
    pub fn embedded_at(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_type(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.types.push((name.into(), path.into()));
        self
    }

    pub fn with_rule(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.rules.push((name.into(), path.into()));
        self
    }

    pub fn schema_path(&self) -> &Path {
        &self.schema
    }

    /// Reads every file and registers the definitions. Nothing is compiled.
    pub fn load(&self) -> Result<Schema, LoadError> {
        let file = read_source(&self.schema)?;
        let mut schema = match self.offset {
            Some(offset) => Schema::embedded(file, offset),
            None => Schema::new(file),
        };
        for (name, path) in &self.types {
            schema.add_type(name, read_source(path)?)?;
        }
        for (name, path) in &self.rules {
            schema.add_rule(name, read_source(path)?)?;
        }
        debug!(
            schema = %self.schema.display(),
            types = self.types.len(),
            rules = self.rules.len(),
            "schema loaded"
        );
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use jsight_schema::CompileError;

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("jsight-load-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_file() {
        let error = read_source(Path::new("/definitely/not/here.jst")).unwrap_err();
        assert!(matches!(error, LoadError::Io { .. }));
        assert!(error.to_string().starts_with("failed to read /definitely/not/here.jst"));
    }

    #[test]
    fn test_load_with_types_and_rules() {
        let dir = scratch_dir("types");
        std::fs::write(dir.join("pet.jst"), r#"{"name": @name, "color": "red" // {enum: @@colors}
}"#)
        .unwrap();
        std::fs::write(dir.join("name.jst"), r#""Tom""#).unwrap();
        std::fs::write(dir.join("colors.jst"), r#"["red", "green"]"#).unwrap();

        let schema = SchemaLoader::new(dir.join("pet.jst"))
            .with_type("@name", dir.join("name.jst"))
            .with_rule("@@colors", dir.join("colors.jst"))
            .load()
            .unwrap();
        let document = SourceFile::new("doc", r#"{"name": "Kitty", "color": "green"}"#);
        assert!(schema.validate(document).is_ok());
        let document = SourceFile::new("doc", r#"{"name": "Kitty", "color": "blue"}"#);
        assert!(schema.validate(document).is_err());
    }

    #[test]
    fn test_invalid_type_name_is_a_schema_error() {
        let dir = scratch_dir("names");
        std::fs::write(dir.join("root.jst"), "1").unwrap();
        let error = SchemaLoader::new(dir.join("root.jst"))
            .with_type("pet", dir.join("root.jst"))
            .load()
            .unwrap_err();
        let LoadError::Schema(error) = error else {
            panic!("unexpected error {error}");
        };
        assert_eq!(
            error.as_compile(),
            Some(&CompileError::InvalidTypeName("pet".into()))
        );
    }
}
