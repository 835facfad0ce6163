use aikart_app::cli::{commands::run_cli, opts::Cli};
use aikart_app::telemetry;
use anyhow::Result;
use clap::Parser; // needed for Cli::parse()

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    telemetry::init(args.log_level);
    run_cli(args).await
}
