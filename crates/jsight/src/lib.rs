pub mod load;
pub mod report;

pub use jsight_lexer as lexer;
pub use jsight_schema as schema;

pub use jsight_schema::{
    AstNode, CompileError, CompiledSchema, ErrorKind, Location, Schema, SchemaError, SourceFile,
    TypeName, ValidationError, ValidationFailure,
};
pub use load::{LoadError, SchemaLoader, read_source};
pub use report::{format_error, format_errors};
