//! Main entry point for the nima-rs CLI

use anyhow::Result;
use clap::CommandFactory;
use clap::Parser;
use clap_complete::{Generator, generate};
use std::io;

use nima_rs::cli::{Cli, Commands};
use nima_rs::commands;

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if cli.verbose > 0 {
        log::set_max_level(match cli.verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    } else if cli.quiet {
        log::set_max_level(log::LevelFilter::Error);
    }

    match cli.command {
        Commands::Info { file } => commands::info::execute(&file),
        Commands::Tree {
            file,
            depth,
            no_color,
            compact,
        } => commands::tree::execute(&file, depth, no_color, compact),
        Commands::Animations { file } => commands::animations::execute(&file),
        Commands::Sample {
            file,
            animation,
            time,
            steps,
            fps,
            mix,
            json,
        } => commands::sample::execute(
            &file,
            &commands::sample::SampleOptions {
                animation,
                time,
                steps,
                fps,
                mix,
                json,
            },
        ),
        Commands::Completions { shell } => {
            print_completions(shell, &mut Cli::command());
            Ok(())
        }
    }
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}
