//! Shared argument definitions.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use jsight::SchemaLoader;

use crate::util::Project;

/// A `@name=path` or `@@name=path` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: String,
    pub path: PathBuf,
}

pub fn parse_definition(arg: &str) -> Result<Definition, String> {
    let (name, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got {arg:?}"))?;
    if !name.starts_with('@') {
        return Err(format!("definition names start with '@', got {name:?}"));
    }
    if path.is_empty() {
        return Err(format!("missing path for {name}"));
    }
    Ok(Definition {
        name: name.to_string(),
        path: PathBuf::from(path),
    })
}

/// Type and rule definitions added on the command line.
///
/// Can be embedded in other command Args using `#[command(flatten)]`.
#[derive(clap::Args, Clone, Default)]
pub struct DefinitionArgs {
    /// Add a named type, e.g. `--type @cat=types/cat.jst`
    #[arg(long = "type", value_name = "@NAME=PATH", value_parser = parse_definition)]
    pub types: Vec<Definition>,

    /// Add a named rule, e.g. `--rule @@colors=rules/colors.jst`
    #[arg(long = "rule", value_name = "@@NAME=PATH", value_parser = parse_definition)]
    pub rules: Vec<Definition>,

    /// Ignore jsight.json
    #[arg(long)]
    pub no_config: bool,
}

impl DefinitionArgs {
    /// A loader for `schema` with the project's definitions, overridden by
    /// the command line ones of the same name.
    pub fn loader(&self, schema: &Path, project: Option<&Project>) -> SchemaLoader {
        let mut types: IndexMap<String, PathBuf> = IndexMap::new();
        let mut rules: IndexMap<String, PathBuf> = IndexMap::new();
        if let Some(project) = project {
            for (name, path) in project.config.type_paths(&project.dir) {
                types.insert(name.to_string(), path);
            }
            for (name, path) in project.config.rule_paths(&project.dir) {
                rules.insert(name.to_string(), path);
            }
        }
        for definition in &self.types {
            types.insert(definition.name.clone(), definition.path.clone());
        }
        for definition in &self.rules {
            rules.insert(definition.name.clone(), definition.path.clone());
        }

        let loader = types
            .into_iter()
            .fold(SchemaLoader::new(schema), |loader, (name, path)| {
                loader.with_type(name, path)
            });
        rules
            .into_iter()
            .fold(loader, |loader, (name, path)| loader.with_rule(name, path))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_definition() {
        assert_eq!(
            parse_definition("@cat=types/cat.jst"),
            Ok(Definition {
                name: "@cat".into(),
                path: PathBuf::from("types/cat.jst"),
            })
        );
        assert_eq!(
            parse_definition("@@colors=a=b.jst").map(|d| d.path),
            Ok(PathBuf::from("a=b.jst"))
        );
        for bad in ["cat=x", "@cat", "@cat="] {
            assert!(parse_definition(bad).is_err(), "{bad}");
        }
    }
}
