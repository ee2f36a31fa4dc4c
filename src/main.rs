use clap::Parser;
use prio::cli::commands::Cli;
use prio::cli::handlers::{self, Context};
use prio::io::logging;

fn main() {
    let cli = Cli::parse();

    let ctx = match Context::load(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };
    logging::init(ctx.data_dir());

    let result = match cli.command {
        // No subcommand → launch TUI
        None => prio::tui::run(ctx),
        Some(command) => handlers::dispatch(command, &ctx),
    };
    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
