mod app;
mod appearance;
mod cli;
mod commands;
mod config;
mod error;
mod fit;
mod input;
mod location;
mod parser;
mod presentation;
mod presenter;
mod render;
mod theme;
mod watch;

use clap::Parser;
use colored::Colorize;
use log::LevelFilter;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    env_logger::Builder::new()
        .filter_level(log_level(cli.verbose, cli.quiet))
        .parse_default_env()
        .format_timestamp(None)
        .init();

    if let Err(e) = cli.run() {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

/// `-q` errors only; warnings by default; `-v` debug; `-vv` trace.
fn log_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
