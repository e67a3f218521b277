//! `snooze` entry-point: loads settings, wires the HTTP adapter and runs one
//! command.

use std::io;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use snooze_client::inbound::cli::{Cli, run};
use snooze_client::{ClientSettings, HackOrSnoozeHttpApi};

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let settings = ClientSettings::load_from_env()?;
    let api = HackOrSnoozeHttpApi::new(settings.base_url()?, settings.timeout())
        .wrap_err("build HTTP client")?
        .with_user_agent(settings.user_agent());

    let mut stdout = io::stdout().lock();
    run(cli.command, &api, &settings, &mut stdout).await?;
    Ok(())
}
