//! avy-cli - Command line tool for reconciling avalanche forecasts and observations.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "avy-cli",
    version,
    about = "Avalanche forecast and observation reconciliation toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: avy_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    avy_cmd::run(cli.command)
}
