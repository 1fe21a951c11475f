use std::path::PathBuf;

use anyhow::bail;
use jsight::TypeName;

use crate::args::DefinitionArgs;
use crate::util::{Project, compile};

#[derive(clap::Args)]
pub struct Args {
    /// Path to the schema file
    pub schema: PathBuf,

    /// Replace references with the referenced types
    #[arg(long)]
    pub inline: bool,

    /// Print the tree of a named type instead of the schema
    #[arg(long = "of", value_name = "@NAME", conflicts_with = "inline")]
    pub type_name: Option<String>,

    /// Print on one line
    #[arg(long)]
    pub compact: bool,

    #[command(flatten)]
    pub definitions: DefinitionArgs,
}

pub fn run(args: Args) -> anyhow::Result<bool> {
    let project = Project::discover(args.definitions.no_config)?;
    let loader = args.definitions.loader(&args.schema, project.as_ref());
    let Some(schema) = compile(&loader)? else {
        return Ok(false);
    };

    let ast = match &args.type_name {
        Some(name) => {
            let Some(ast) = TypeName::new(name).and_then(|name| schema.type_ast(&name)) else {
                bail!("type {name} is not defined");
            };
            ast
        }
        None if args.inline => schema.inlined_ast(),
        None => schema.ast(),
    };
    let json = if args.compact {
        serde_json::to_string(&ast)?
    } else {
        serde_json::to_string_pretty(&ast)?
    };
    println!("{json}");
    Ok(true)
}
