use std::path::PathBuf;

use crate::args::DefinitionArgs;
use crate::util::{Project, compile};

#[derive(clap::Args)]
pub struct Args {
    /// Path to the schema file
    pub schema: PathBuf,

    #[command(flatten)]
    pub definitions: DefinitionArgs,
}

pub fn run(args: Args) -> anyhow::Result<bool> {
    let project = Project::discover(args.definitions.no_config)?;
    let loader = args.definitions.loader(&args.schema, project.as_ref());
    let Some(schema) = compile(&loader)? else {
        return Ok(false);
    };
    println!("{}", schema.example());
    Ok(true)
}
