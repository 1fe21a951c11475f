//! Check command - compiles schemas, or runs the targets of jsight.json.

use std::path::Path;
use std::time::Instant;

use anyhow::bail;
use jsight_config::CONFIG_FILENAME;
use nu_ansi_term::Color;
use tracing::info;

use crate::args::DefinitionArgs;
use crate::util::{Project, compile, report_error};

#[derive(clap::Args)]
pub struct Args {
    /// Schema files to compile, or target names when a jsight.json exists.
    /// If omitted, runs the default targets of jsight.json.
    #[arg(num_args = 0..)]
    pub files_or_targets: Vec<String>,

    #[command(flatten)]
    pub definitions: DefinitionArgs,

    /// Quiet mode: only print failures
    #[arg(short, long)]
    pub quiet: bool,

    /// Run all targets defined in jsight.json
    #[arg(long)]
    pub all: bool,
}

pub fn run(args: Args) -> anyhow::Result<bool> {
    let project = Project::discover(args.definitions.no_config)?;
    match &project {
        Some(project) if is_project_mode(&args, project) => run_project_mode(&args, project),
        _ if args.files_or_targets.is_empty() => {
            bail!("no schema specified and no {CONFIG_FILENAME} found")
        }
        _ => run_file_mode(&args, project.as_ref()),
    }
}

fn is_project_mode(args: &Args, project: &Project) -> bool {
    if args.all || args.files_or_targets.is_empty() {
        return true;
    }
    let first = &args.files_or_targets[0];
    project.config.targets.contains_key(first) || !Path::new(first).exists()
}

fn run_file_mode(args: &Args, project: Option<&Project>) -> anyhow::Result<bool> {
    let start = Instant::now();
    let mut failed = 0;
    for file in &args.files_or_targets {
        let loader = args.definitions.loader(file.as_ref(), project);
        match compile(&loader)? {
            Some(_) if !args.quiet => println!("{} {file}", Color::Green.paint("✓")),
            Some(_) => {}
            None => failed += 1,
        }
    }
    summarize(failed, args.files_or_targets.len(), "schema(s)", args.quiet, start);
    Ok(failed == 0)
}

fn run_project_mode(args: &Args, project: &Project) -> anyhow::Result<bool> {
    let start = Instant::now();
    let config = &project.config;
    let names: Vec<&str> = if args.all {
        config.target_names().collect()
    } else if args.files_or_targets.is_empty() {
        config.default_targets().iter().map(String::as_str).collect()
    } else {
        args.files_or_targets.iter().map(String::as_str).collect()
    };

    if names.is_empty() {
        eprintln!(
            "{}",
            Color::Yellow.paint(format!(
                "No targets specified. Add defaultTargets to {CONFIG_FILENAME} or use --all"
            ))
        );
        println!("\nAvailable targets:");
        for name in config.target_names() {
            println!("  - {name}");
        }
        return Ok(true);
    }

    let mut failed = 0;
    let mut checked = 0;
    for name in names {
        let target = config.get_target(name)?;
        info!(target = name, schema = %target.schema, "checking target");
        let loader = args
            .definitions
            .loader(&project.dir.join(&target.schema), Some(project));
        let Some(schema) = compile(&loader)? else {
            failed += 1;
            checked += 1;
            continue;
        };
        for path in target.documents(&project.dir)? {
            checked += 1;
            let file = jsight::read_source(&path)?;
            match schema.validate(file) {
                Ok(()) if !args.quiet => {
                    println!("{} [{name}] {}", Color::Green.paint("✓"), path.display());
                }
                Ok(()) => {}
                Err(error) => {
                    failed += 1;
                    report_error(&error);
                }
            }
        }
    }
    summarize(failed, checked, "file(s)", args.quiet, start);
    Ok(failed == 0)
}

fn summarize(failed: usize, total: usize, what: &str, quiet: bool, start: Instant) {
    let duration_s = start.elapsed().as_secs_f64();
    if failed > 0 {
        eprintln!(
            "{}",
            Color::Red.paint(format!("{failed} of {total} {what} failed ({duration_s:.2}s)"))
        );
    } else if !quiet {
        println!(
            "{}",
            Color::Green.paint(format!("{total} {what} ok ({duration_s:.2}s)"))
        );
    }
}
