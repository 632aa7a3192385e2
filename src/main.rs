use anyhow::Result;
use clap::Parser;

use agenda::logging::{init_tracing, LogTarget};

fn main() -> Result<()> {
    let cli = agenda::cli::Cli::parse();
    let config = agenda::config::from_cli(&cli)?;

    match cli.command.clone() {
        Some(agenda::cli::CliCommand::Tui) | None => {
            // The terminal belongs to the UI, so logs go to a file.
            init_tracing(cli.log_filter.as_deref(), LogTarget::File(config.log_path()))?;
            agenda::tui::run(config)?;
        }
        Some(command) => {
            init_tracing(cli.log_filter.as_deref(), LogTarget::Stderr)?;
            let stdout = std::io::stdout();
            let handle = stdout.lock();
            agenda::commands::execute(&config, command, handle)?;
        }
    }

    Ok(())
}
