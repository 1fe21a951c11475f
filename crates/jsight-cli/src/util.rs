use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use jsight::{CompiledSchema, LoadError, SchemaError, SchemaLoader, SourceFile, format_error};
use jsight_config::JsightConfig;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Installs the stderr log subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// A `jsight.json` and the directory its paths are relative to.
pub struct Project {
    pub dir: PathBuf,
    pub config: JsightConfig,
}

impl Project {
    /// Searches the working directory and its ancestors.
    pub fn discover(disabled: bool) -> anyhow::Result<Option<Project>> {
        if disabled {
            return Ok(None);
        }
        let current_dir = std::env::current_dir().context("cannot read current directory")?;
        let Some((path, config)) = JsightConfig::load_from_dir(&current_dir)
            .context("cannot load jsight.json")?
        else {
            return Ok(None);
        };
        debug!(config = %path.display(), "using project configuration");
        let dir = path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Some(Project { dir, config }))
    }
}

/// Read a document from a file path, or stdin for `-`.
pub fn read_document(arg: &str) -> anyhow::Result<Arc<SourceFile>> {
    if arg == "-" {
        let mut buffer = Vec::new();
        io::stdin()
            .read_to_end(&mut buffer)
            .context("Error reading from stdin")?;
        return Ok(SourceFile::new("<stdin>", buffer));
    }
    Ok(jsight::read_source(arg.as_ref())?)
}

pub fn report_error(error: &SchemaError) {
    eprintln!("{}", format_error(error, io::stderr().is_terminal()));
}

/// Loads and compiles a schema. Schema errors are reported and give `None`;
/// unreadable files are returned as errors.
pub fn compile(loader: &SchemaLoader) -> anyhow::Result<Option<Arc<CompiledSchema>>> {
    let schema = match loader.load() {
        Ok(schema) => schema,
        Err(LoadError::Schema(error)) => {
            report_error(&error);
            return Ok(None);
        }
        Err(error) => return Err(error.into()),
    };
    match schema.compile() {
        Ok(compiled) => Ok(Some(compiled)),
        Err(error) => {
            report_error(&error);
            Ok(None)
        }
    }
}
