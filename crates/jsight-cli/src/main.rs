use std::process::ExitCode;

use clap::{Parser, Subcommand};
use nu_ansi_term::Color;

mod args;
mod util;

mod commands {
    automod::dir!(pub "src/commands");
}

#[derive(Parser)]
#[command(name = "jsight", version, about = "JSight Schema utilities")]
struct Cli {
    /// Log more (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile schemas, or check the targets of jsight.json
    Check(commands::check::Args),
    /// Validate JSON documents against a schema
    Validate(commands::validate::Args),
    /// Print the schema as a JSON documentation tree
    Ast(commands::ast::Args),
    /// Print an example document satisfying the schema
    Example(commands::example::Args),
    /// Print how many bytes a schema occupies, starting at an offset
    Length(commands::length::Args),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    util::init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Check(args) => commands::check::run(args),
        Commands::Validate(args) => commands::validate::run(args),
        Commands::Ast(args) => commands::ast::run(args),
        Commands::Example(args) => commands::example::run(args),
        Commands::Length(args) => commands::length::run(args),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", Color::Red.paint(format!("Error: {e:#}")));
            ExitCode::FAILURE
        }
    }
}
