mod cli;
mod commands;
mod config;
mod drag;
mod logging;
mod model;
mod storage;
mod ui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let command = args.command.unwrap_or(cli::Command::Tui);
    if let cli::Command::Init = command {
        return commands::init();
    }

    let (workspace, config) = commands::open()?;
    if let Err(err) = logging::init(&workspace.dir, config.log_level.as_deref()) {
        eprintln!("warning: logging disabled: {:#}", err);
    }
    tracing::info!(dir = %workspace.dir.display(), scope = workspace.scope.label(), "workspace opened");

    match command {
        cli::Command::Init => Ok(()),
        cli::Command::Dashboard => commands::dashboard(&workspace, &config),
        cli::Command::Config => commands::show_config(&workspace, &config),
        cli::Command::Day(cmd) => commands::day(&workspace, &config, cmd),
        cli::Command::Task(cmd) => commands::task(&workspace, &config, cmd),
        cli::Command::Template(cmd) => commands::template(&workspace, &config, cmd),
        cli::Command::Sticky(cmd) => commands::sticky(&workspace, &config, cmd),
        cli::Command::Habit(cmd) => commands::habit(&workspace, &config, cmd),
        cli::Command::Event(cmd) => commands::event(&workspace, &config, cmd),
        cli::Command::Note(cmd) => commands::note(&workspace, &config, cmd),
        cli::Command::Pomodoro(cmd) => commands::pomodoro(&workspace, &config, cmd),
        cli::Command::Tui => commands::tui(workspace, config),
    }
}
