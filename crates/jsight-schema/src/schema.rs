//! The compile-once schema facade.

use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use jsight_lexer::{ScanMode, Scanner, SourceFile, schema_length};
use tracing::debug;

use crate::ast::{AstBuilder, AstNode};
use crate::builder::BuildContext;
use crate::error::{CompileError, SchemaError};
use crate::example::ExampleBuilder;
use crate::node::{NodeId, SchemaTree, TypeEntry, TypeTable};
use crate::types::{TypeName, is_rule_name};
use crate::value::Literal;
use crate::{checker, compose, validator};

/// A type added before compilation.
#[derive(Debug, Clone)]
struct TypeSource {
    name: TypeName,
    file: Arc<SourceFile>,
    offset: usize,
    embedded: bool,
}

/// A JSight schema and the types and rules it may use.
///
/// Types and rules are added first; the first call to [`Schema::compile`] (or
/// any operation needing the compiled form) freezes the schema. The outcome
/// of that compilation, success or failure, is kept for every later call.
///
/// ```
/// use jsight_schema::{Schema, SourceFile};
///
/// let mut schema = Schema::new(SourceFile::new("pet", r#"{"name": @name}"#));
/// schema
///     .add_type("@name", SourceFile::new("name", r#""Tom" // {minLength: 1}"#))
///     .unwrap();
/// assert!(schema.validate(SourceFile::new("doc", r#"{"name": "Kitty"}"#)).is_ok());
/// assert!(schema.validate(SourceFile::new("doc", r#"{"name": ""}"#)).is_err());
/// ```
#[derive(Debug)]
pub struct Schema {
    file: Arc<SourceFile>,
    start: usize,
    embedded: bool,
    types: Vec<TypeSource>,
    rules: IndexMap<String, Arc<SourceFile>>,
    compiled: OnceLock<Result<Arc<CompiledSchema>, SchemaError>>,
}

impl Schema {
    /// A schema occupying the whole file.
    pub fn new(file: Arc<SourceFile>) -> Self {
        Self::with_start(file, 0, false)
    }

    /// A schema starting at `start` inside a larger file. The schema ends
    /// where its top-level value (and annotation) ends.
    pub fn embedded(file: Arc<SourceFile>, start: usize) -> Self {
        Self::with_start(file, start, true)
    }

    fn with_start(file: Arc<SourceFile>, start: usize, embedded: bool) -> Self {
        Self {
            file,
            start,
            embedded,
            types: Vec::new(),
            rules: IndexMap::new(),
            compiled: OnceLock::new(),
        }
    }

    pub fn file(&self) -> &Arc<SourceFile> {
        &self.file
    }

    /// Adds a named type (`@name`) defined by a whole file.
    pub fn add_type(&mut self, name: &str, file: Arc<SourceFile>) -> Result<(), SchemaError> {
        self.push_type(name, file, 0, false)
    }

    /// Adds a named type whose definition starts at `offset` inside `file`.
    pub fn add_embedded_type(
        &mut self,
        name: &str,
        file: Arc<SourceFile>,
        offset: usize,
    ) -> Result<(), SchemaError> {
        self.push_type(name, file, offset, true)
    }

    fn push_type(
        &mut self,
        name: &str,
        file: Arc<SourceFile>,
        offset: usize,
        embedded: bool,
    ) -> Result<(), SchemaError> {
        self.ensure_not_compiled()?;
        let name = TypeName::new(name)
            .filter(|name| !name.is_anonymous())
            .ok_or_else(|| SchemaError::unpositioned(CompileError::InvalidTypeName(name.to_string())))?;
        if self.types.iter().any(|t| t.name == name) {
            return Err(SchemaError::unpositioned(CompileError::DuplicateType(name)));
        }
        self.types.push(TypeSource {
            name,
            file,
            offset,
            embedded,
        });
        Ok(())
    }

    /// Adds a named rule (`@@name`): a JSON array of literals usable as an
    /// `enum`.
    pub fn add_rule(&mut self, name: &str, file: Arc<SourceFile>) -> Result<(), SchemaError> {
        self.ensure_not_compiled()?;
        if !is_rule_name(name) {
            return Err(SchemaError::unpositioned(CompileError::InvalidRuleName(
                name.to_string(),
            )));
        }
        if self.rules.contains_key(name) {
            return Err(SchemaError::unpositioned(CompileError::DuplicateNamedRule(
                name.to_string(),
            )));
        }
        self.rules.insert(name.to_string(), file);
        Ok(())
    }

    fn ensure_not_compiled(&self) -> Result<(), SchemaError> {
        match self.compiled.get() {
            Some(_) => Err(SchemaError::unpositioned(CompileError::AlreadyCompiled)),
            None => Ok(()),
        }
    }

    /// Compiles the schema on first use.
    pub fn compile(&self) -> Result<Arc<CompiledSchema>, SchemaError> {
        self.compiled
            .get_or_init(|| self.compile_once().map(Arc::new))
            .clone()
    }

    fn compile_once(&self) -> Result<CompiledSchema, SchemaError> {
        debug!(
            schema = self.file.name(),
            types = self.types.len(),
            rules = self.rules.len(),
            "compiling schema"
        );
        let mut ctx = BuildContext::default();
        for (name, file) in &self.rules {
            ctx.add_rule(name, file.clone())?;
        }
        for source in &self.types {
            let root = ctx
                .build(scanner(&source.file, source.offset, source.embedded))
                .map_err(|e| e.in_type(&source.name))?;
            ctx.types.insert(
                source.name.clone(),
                TypeEntry {
                    root,
                    file: source.file.clone(),
                    offset: source.offset,
                },
            );
        }
        let root = ctx.build(scanner(&self.file, self.start, self.embedded))?;
        compose::resolve(&mut ctx.tree, &ctx.types)?;
        checker::check(&ctx.tree, &ctx.types, root)?;
        debug!(
            nodes = ctx.tree.len(),
            types = ctx.types.len(),
            "schema compiled"
        );
        Ok(CompiledSchema {
            tree: ctx.tree,
            types: ctx.types,
            rules: ctx.rules,
            root,
        })
    }

    pub fn validate(&self, document: Arc<SourceFile>) -> Result<(), SchemaError> {
        self.compile()?.validate(document)
    }

    pub fn ast(&self) -> Result<AstNode, SchemaError> {
        Ok(self.compile()?.ast())
    }

    pub fn inlined_ast(&self) -> Result<AstNode, SchemaError> {
        Ok(self.compile()?.inlined_ast())
    }

    pub fn example(&self) -> Result<String, SchemaError> {
        Ok(self.compile()?.example())
    }

    /// Bytes the schema occupies from its start, trailing annotation
    /// included. Does not compile.
    pub fn length(&self) -> Result<usize, SchemaError> {
        Ok(schema_length(self.file.clone(), self.start)?)
    }
}

fn scanner(file: &Arc<SourceFile>, offset: usize, embedded: bool) -> Scanner {
    if embedded {
        Scanner::embedded(file.clone(), ScanMode::Schema, offset)
    } else {
        Scanner::new(file.clone(), ScanMode::Schema)
    }
}

/// A checked schema. Read-only; any number of documents may be validated
/// against it, from any thread.
#[derive(Debug)]
pub struct CompiledSchema {
    pub(crate) tree: SchemaTree,
    pub(crate) types: TypeTable,
    rules: IndexMap<String, Vec<Literal>>,
    pub(crate) root: NodeId,
}

impl CompiledSchema {
    pub fn validate(&self, document: Arc<SourceFile>) -> Result<(), SchemaError> {
        validator::validate(&self.tree, &self.types, self.root, document)
    }

    /// The schema as a documentation tree, references kept as references.
    pub fn ast(&self) -> AstNode {
        AstBuilder::new(&self.tree, &self.types, false).build(self.root)
    }

    /// The schema with references replaced by the referenced types.
    pub fn inlined_ast(&self) -> AstNode {
        AstBuilder::new(&self.tree, &self.types, true).build(self.root)
    }

    /// The documentation tree of a named type.
    pub fn type_ast(&self, name: &TypeName) -> Option<AstNode> {
        let entry = self.types.get(name)?;
        Some(AstBuilder::new(&self.tree, &self.types, false).build(entry.root))
    }

    /// A compact JSON document satisfying the schema.
    pub fn example(&self) -> String {
        ExampleBuilder::new(&self.tree, &self.types).build(self.root)
    }

    /// Named and anonymous types, in definition order.
    pub fn type_names(&self) -> impl Iterator<Item = &TypeName> {
        self.types.keys()
    }

    /// The literals of a named rule.
    pub fn rule(&self, name: &str) -> Option<&[Literal]> {
        self.rules.get(name).map(Vec::as_slice)
    }

    pub fn tree(&self) -> &SchemaTree {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_additions_after_compile_fail() {
        let mut schema = Schema::new(SourceFile::new("s", "1"));
        schema.compile().unwrap();
        let error = schema
            .add_type("@late", SourceFile::new("t", "1"))
            .unwrap_err();
        assert_eq!(error.as_compile(), Some(&CompileError::AlreadyCompiled));
        let error = schema
            .add_rule("@@late", SourceFile::new("r", "[1]"))
            .unwrap_err();
        assert_eq!(error.as_compile(), Some(&CompileError::AlreadyCompiled));
    }

    #[test]
    fn test_compile_failure_is_remembered() {
        let schema = Schema::new(SourceFile::new("s", r#"{"a": @missing}"#));
        let first = schema.compile().unwrap_err();
        let second = schema.compile().unwrap_err();
        assert_eq!(first, second);
        assert!(schema.validate(SourceFile::new("d", "{}")).is_err());
    }

    #[test]
    fn test_invalid_names() {
        let mut schema = Schema::new(SourceFile::new("s", "1"));
        let cases = [
            schema.add_type("cat", SourceFile::new("t", "1")),
            schema.add_type("@__anonymous_1", SourceFile::new("t", "1")),
            schema.add_rule("@colors", SourceFile::new("r", "[1]")),
        ];
        for result in cases {
            assert!(result.is_err());
        }
        schema.add_type("@cat", SourceFile::new("t", "1")).unwrap();
        let error = schema.add_type("@cat", SourceFile::new("t", "2")).unwrap_err();
        assert_eq!(
            error.as_compile(),
            Some(&CompileError::DuplicateType(TypeName::new("@cat").unwrap()))
        );
    }

    #[test]
    fn test_embedded_schema() {
        let file = SourceFile::new("doc", "TYPE @x {\"a\": 1} // note\nNEXT");
        let schema = Schema::embedded(file, 8);
        assert_eq!(schema.length().unwrap(), 16);
        assert!(
            schema
                .validate(SourceFile::new("d", r#"{"a": 5}"#))
                .is_ok()
        );
    }

    #[test]
    fn test_compiled_schema_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledSchema>();
        assert_send_sync::<Schema>();
    }
}
