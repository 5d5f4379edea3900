use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;

use noteload_cli::cli::{Cli, OutputFormat};
use noteload_pipeline::LoadSummary;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version go to stdout and succeed; usage errors are fatal
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    noteload_cli::init_logging(&cli);

    match noteload_cli::run(&cli).await {
        Ok(summary) => {
            print_summary(&summary, cli.format);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn print_summary(summary: &LoadSummary, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!(
            "{} {} notes, {} chunks built; {} lines skipped; {} rows loaded",
            "noteload:".green().bold(),
            summary.notes_built,
            summary.chunks_built,
            summary.skipped_unresolved + summary.skipped_empty,
            summary.rows_loaded
        ),
        OutputFormat::Json => match serde_json::to_string_pretty(summary) {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("{} {err}", "error:".red().bold()),
        },
    }
}
