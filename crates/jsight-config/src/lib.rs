//! Configuration for JSight tools.
//!
//! A project keeps its shared definitions and check targets in a
//! `jsight.json` file at its root:
//!
//! ```json
//! {
//!   "types": { "@cat": "types/cat.jst" },
//!   "rules": { "@@colors": "rules/colors.jst" },
//!   "targets": { "pets": { "schema": "pet.jst", "globs": ["data/*.json"] } },
//!   "defaultTargets": ["pets"]
//! }
//! ```
//!
//! Paths are relative to the directory holding the file.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

/// The standard configuration filename.
pub const CONFIG_FILENAME: &str = "jsight.json";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown target {0:?}")]
    UnknownTarget(String),
    #[error("invalid glob {pattern:?}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("cannot read matched path: {0}")]
    GlobEntry(#[from] glob::GlobError),
}

/// A check target: documents matched by globs, validated against a schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Target {
    /// Schema file path (relative to the config file).
    pub schema: String,
    /// Glob patterns for documents to validate.
    #[serde(default)]
    pub globs: Vec<String>,
}

impl Target {
    /// Expands the target's globs under `base`, sorted and deduplicated.
    pub fn documents(&self, base: &Path) -> Result<Vec<PathBuf>, ConfigError> {
        let mut documents = Vec::new();
        for pattern in &self.globs {
            let full = base.join(pattern);
            let full = full.to_string_lossy();
            let paths = glob::glob(&full).map_err(|source| ConfigError::Glob {
                pattern: pattern.clone(),
                source,
            })?;
            for path in paths {
                documents.push(path?);
            }
        }
        documents.sort();
        documents.dedup();
        Ok(documents)
    }
}

/// The contents of `jsight.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JsightConfig {
    /// Named types (`@name` -> path).
    pub types: IndexMap<String, String>,
    /// Named rules (`@@name` -> path).
    pub rules: IndexMap<String, String>,
    /// Check targets (name -> target definition).
    pub targets: IndexMap<String, Target>,
    /// Targets checked when none is named.
    pub default_targets: Vec<String>,
}

impl JsightConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_str(&content)
    }

    /// Parse configuration from a string. Empty input is an empty config.
    pub fn parse_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(content)?)
    }

    /// Find the configuration file by searching upward from the given directory.
    pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
        let mut current = start_dir.to_path_buf();
        loop {
            let config_path = current.join(CONFIG_FILENAME);
            if config_path.exists() {
                return Some(config_path);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration by searching upward from the given directory.
    pub fn load_from_dir(start_dir: &Path) -> Result<Option<(PathBuf, Self)>, ConfigError> {
        if let Some(config_path) = Self::find_config_file(start_dir) {
            let config = Self::load(&config_path)?;
            Ok(Some((config_path, config)))
        } else {
            Ok(None)
        }
    }

    pub fn get_target(&self, name: &str) -> Result<&Target, ConfigError> {
        self.targets
            .get(name)
            .ok_or_else(|| ConfigError::UnknownTarget(name.to_string()))
    }

    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }

    pub fn default_targets(&self) -> &[String] {
        &self.default_targets
    }

    /// Named types with paths resolved against `base`.
    pub fn type_paths<'a>(&'a self, base: &'a Path) -> impl Iterator<Item = (&'a str, PathBuf)> {
        self.types
            .iter()
            .map(move |(name, path)| (name.as_str(), base.join(path)))
    }

    /// Named rules with paths resolved against `base`.
    pub fn rule_paths<'a>(&'a self, base: &'a Path) -> impl Iterator<Item = (&'a str, PathBuf)> {
        self.rules
            .iter()
            .map(move |(name, path)| (name.as_str(), base.join(path)))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_config() {
        let content = r#"{
            "types": { "@cat": "types/cat.jst", "@dog": "types/dog.jst" },
            "rules": { "@@colors": "rules/colors.jst" },
            "targets": {
                "pets": { "schema": "pet.jst", "globs": ["data/*.json"] },
                "owners": { "schema": "owner.jst" }
            },
            "defaultTargets": ["pets"]
        }"#;

        let config = JsightConfig::parse_str(content).unwrap();
        assert_eq!(config.types.len(), 2);
        assert_eq!(config.target_names().collect::<Vec<_>>(), vec!["pets", "owners"]);
        assert_eq!(config.default_targets(), ["pets".to_string()]);

        let pets = config.get_target("pets").unwrap();
        assert_eq!(pets.schema, "pet.jst");
        assert_eq!(pets.globs, vec!["data/*.json"]);
        assert!(config.get_target("owners").unwrap().globs.is_empty());

        let base = Path::new("/project");
        let types: Vec<_> = config.type_paths(base).collect();
        assert_eq!(types[0], ("@cat", PathBuf::from("/project/types/cat.jst")));
    }

    #[test]
    fn test_empty_config() {
        let config = JsightConfig::parse_str("").unwrap();
        assert!(config.targets.is_empty());
        let config = JsightConfig::parse_str("{}").unwrap();
        assert!(config.types.is_empty());
    }

    #[test]
    fn test_errors() {
        let config = JsightConfig::parse_str("{}").unwrap();
        assert!(matches!(
            config.get_target("missing"),
            Err(ConfigError::UnknownTarget(name)) if name == "missing"
        ));
        assert!(matches!(
            JsightConfig::parse_str(r#"{"targets": {"a": {}}}"#),
            Err(ConfigError::Parse(_))
        ));
        let target = Target {
            schema: "s.jst".into(),
            globs: vec!["[".into()],
        };
        assert!(matches!(
            target.documents(Path::new(".")),
            Err(ConfigError::Glob { .. })
        ));
    }

    #[test]
    fn test_find_and_expand() {
        let root = std::env::temp_dir().join(format!("jsight-config-{}", std::process::id()));
        let nested = root.join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::create_dir_all(root.join("data")).unwrap();
        std::fs::write(root.join(CONFIG_FILENAME), r#"{"targets": {"t": {"schema": "s.jst", "globs": ["data/*.json", "data/one.json"]}}}"#).unwrap();
        std::fs::write(root.join("data/one.json"), "1").unwrap();
        std::fs::write(root.join("data/two.json"), "2").unwrap();

        let (path, config) = JsightConfig::load_from_dir(&nested).unwrap().unwrap();
        assert_eq!(path, root.join(CONFIG_FILENAME));
        let documents = config.get_target("t").unwrap().documents(&root).unwrap();
        assert_eq!(
            documents,
            vec![root.join("data/one.json"), root.join("data/two.json")]
        );
    }
}
