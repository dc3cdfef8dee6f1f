mod calendar;
mod cli;
mod commands;
mod config;
mod events;
mod goals;
mod logging;
mod prefs;
mod storage;
mod taps;
mod ui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let config = config::Config::resolve(args.data_dir, args.log_level)?;

    // Dropping the handle stops the writer, so it lives until main returns.
    let _logger = match logging::init_logging(&config.log_level, &config.data.log_dir()) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("warning: logging disabled: {:#}", err);
            None
        }
    };

    let command = args.command.unwrap_or(cli::Command::Tui);
    match command {
        cli::Command::Taps => commands::taps(),
        cli::Command::Calendar { month, layers } => commands::calendar(&config, month, layers),
        cli::Command::Events { date, layers } => commands::events(&config, date, layers),
        cli::Command::Goal { command } => commands::goal(&config, command),
        cli::Command::Name { value } => commands::name(&config, value),
        cli::Command::Pref { command } => commands::pref(&config, command),
        cli::Command::Tui => commands::tui(&config),
    }
}
