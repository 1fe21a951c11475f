//! Length command - measures a schema embedded in a larger file.

use std::path::PathBuf;

use jsight::Schema;

use crate::util::report_error;

#[derive(clap::Args)]
pub struct Args {
    /// File containing the schema
    pub file: PathBuf,

    /// Byte offset where the schema starts
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}

pub fn run(args: Args) -> anyhow::Result<bool> {
    let file = jsight::read_source(&args.file)?;
    if args.offset > file.len() {
        anyhow::bail!("offset {} is past the end of {}", args.offset, args.file.display());
    }
    match Schema::embedded(file, args.offset).length() {
        Ok(length) => {
            println!("{length}");
            Ok(true)
        }
        Err(error) => {
            report_error(&error);
            Ok(false)
        }
    }
}
