use anyhow::Result;
use clap::Parser;

mod cli;
mod config;
mod engine;
mod error;
mod models;
mod probe;
mod sink;
#[cfg(test)]
mod testing;
mod utils;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    utils::setup_console();
    utils::init_tracing();

    let cli = cli::Cli::parse();
    cli::dispatch(cli).await
}
