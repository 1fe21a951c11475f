//! Validate command - checks JSON documents against a schema.

use std::path::PathBuf;
use std::time::Instant;

use nu_ansi_term::Color;

use crate::args::DefinitionArgs;
use crate::util::{Project, compile, read_document, report_error};

#[derive(clap::Args)]
pub struct Args {
    /// Path to the schema file
    pub schema: PathBuf,

    /// Documents to validate; `-` reads stdin
    #[arg(required = true, num_args = 1..)]
    pub documents: Vec<String>,

    #[command(flatten)]
    pub definitions: DefinitionArgs,

    /// Only print failures
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run(args: Args) -> anyhow::Result<bool> {
    let start = Instant::now();
    let project = Project::discover(args.definitions.no_config)?;
    let loader = args.definitions.loader(&args.schema, project.as_ref());
    let Some(schema) = compile(&loader)? else {
        return Ok(false);
    };

    let mut failed = 0;
    for document in &args.documents {
        let file = read_document(document)?;
        match schema.validate(file) {
            Ok(()) => {
                if !args.quiet {
                    println!("{} {document}", Color::Green.paint("✓"));
                }
            }
            Err(error) => {
                failed += 1;
                report_error(&error);
            }
        }
    }

    let duration_s = start.elapsed().as_secs_f64();
    if failed > 0 {
        eprintln!(
            "{}",
            Color::Red.paint(format!(
                "{failed} of {} document(s) failed ({duration_s:.2}s)",
                args.documents.len()
            ))
        );
    } else if !args.quiet {
        println!(
            "{}",
            Color::Green.paint(format!(
                "{} document(s) valid ({duration_s:.2}s)",
                args.documents.len()
            ))
        );
    }
    Ok(failed == 0)
}
