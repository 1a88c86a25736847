//! pentimento - image overlay daemon for terminals

use clap::Parser;

mod cli;
mod commands;
mod config;
mod daemon;
mod loader;
mod reactor;
mod reconcile;
mod reporter;
mod scheduler;
mod shutdown;
mod signals;
mod state;
mod tmux;
mod windows;

use cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Layer(args) => daemon::run_layer(args),
        Command::QueryWindows { pids } => daemon::query_windows(&pids),
    };

    if let Err(e) = result {
        tracing::error!(kind = e.kind(), error = %e, "pentimento failed");
        eprintln!("pentimento: {}", e);
        std::process::exit(1);
    }
}
