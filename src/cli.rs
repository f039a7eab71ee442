use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{self, CommandReport};

#[derive(Debug, Parser)]
#[command(
    name = "jisc-wrangler",
    version,
    about = "Restructure JISC newspaper archives into a canonical TITLE/YYYY/MM/DD layout"
)]
struct Cli {
    /// Print the command report as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct RunFlags {
    /// Where the timestamped working directory (logs, manifests) is created.
    #[arg(long = "working_dir", visible_alias = "working-dir", value_name = "DIR")]
    working_dir: Option<PathBuf>,

    /// Decide everything but leave the output directory untouched.
    #[arg(long)]
    dry_run: bool,

    /// Verbose logging.
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Merge every input file into the canonical output tree.
    Wrangle {
        input_dir: PathBuf,
        output_dir: PathBuf,
        #[command(flatten)]
        flags: RunFlags,
    },
    /// Replace title codes with catalog codes in alto2txt metadata.
    Retitle {
        input_dir: PathBuf,
        output_dir: PathBuf,
        /// Pipe-delimited title code lookup table.
        #[arg(long, value_name = "FILE")]
        lookup: Option<PathBuf>,
        #[command(flatten)]
        flags: RunFlags,
    },
    /// Report how the input would be classified, without copying anything.
    Classify { input_dir: PathBuf },
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!("{}: {}", report.command, if report.ok { "ok" } else { "issues" });
    for detail in &report.details {
        println!("  {detail}");
    }
    for issue in &report.issues {
        println!("  ! {issue}");
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Command::Wrangle {
            input_dir,
            output_dir,
            flags,
        } => commands::wrangle::run(&commands::wrangle::WrangleOptions {
            input_dir,
            output_dir,
            working_dir: flags.working_dir,
            dry_run: flags.dry_run,
            debug: flags.debug,
            quiet: cli.json,
        })?,
        Command::Retitle {
            input_dir,
            output_dir,
            lookup,
            flags,
        } => commands::retitle::run(&commands::retitle::RetitleOptions {
            input_dir,
            output_dir,
            lookup,
            working_dir: flags.working_dir,
            dry_run: flags.dry_run,
            debug: flags.debug,
        })?,
        Command::Classify { input_dir } => {
            commands::classify::run(&commands::classify::ClassifyOptions { input_dir })?
        }
    };

    print_report(&report, cli.json)?;
    if !report.ok {
        std::process::exit(2);
    }
    Ok(())
}
