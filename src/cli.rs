use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::schema::ColumnConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Guess,
    Preview,
    Run,
}

#[derive(Debug)]
pub struct CliArgs {
    pub command: Command,
    pub config_path: Option<PathBuf>,
}

/// Parse command-line arguments. `Ok(None)` means help was requested.
pub fn parse_args(args: &[String]) -> Result<Option<CliArgs>> {
    let mut command: Option<Command> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "guess" => command = Some(Command::Guess),
            "preview" => command = Some(Command::Preview),
            "run" => command = Some(Command::Run),
            "help" | "--help" | "-h" => return Ok(None),
            "-c" | "--config" => {
                i += 1;
                if i < args.len() {
                    config_path = Some(PathBuf::from(&args[i]));
                } else {
                    bail!("Missing value for -c/--config flag");
                }
            }
            other => bail!("Unknown argument '{other}'. Run `backlog-extract help` for usage."),
        }
        i += 1;
    }

    match command {
        Some(command) => Ok(Some(CliArgs {
            command,
            config_path,
        })),
        None => Ok(None),
    }
}

#[derive(Serialize)]
struct ColumnsSnippet<'a> {
    columns: &'a [ColumnConfig],
}

/// Render guessed columns as a `[[columns]]` snippet ready for config.toml.
pub fn render_columns_toml(columns: &[ColumnConfig]) -> Result<String> {
    Ok(toml::to_string_pretty(&ColumnsSnippet { columns })?)
}

pub fn print_help() {
    println!("backlog-extract — pull issues from a Backlog project into typed rows\n");
    println!("USAGE:");
    println!("  backlog-extract guess    Sample issues and print a guessed [[columns]] schema");
    println!("  backlog-extract preview  Project the first few issues and print them as JSON lines");
    println!("  backlog-extract run      Extract every issue in the project as JSON lines");
    println!();
    println!("OPTIONS:");
    println!("  -c, --config <path>  Config file (default ~/.backlog-extract/config.toml)");
    println!();
    println!("Schema comes from [[columns]] in the config, or is guessed per run");
    println!("when dynamic_schema = true.");
}
