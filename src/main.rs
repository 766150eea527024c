mod cli;
mod client;
mod config;
mod model;
mod pipeline;
mod projector;
mod schema;
mod sink;

use std::io;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use cli::Command;
use client::retry::TracingObserver;
use client::BacklogClient;
use pipeline::Pipeline;
use sink::JsonLinesSink;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(parsed) = cli::parse_args(&args)? else {
        cli::print_help();
        return Ok(());
    };

    let config = config::load_config(parsed.config_path.as_deref())?;
    let client = BacklogClient::new(&config)?;
    let observer = TracingObserver;
    let pipeline = Pipeline::new(&client, config.retry_policy(), &observer);

    match parsed.command {
        Command::Guess => {
            let columns = pipeline.guess().await?;
            print!("{}", cli::render_columns_toml(&columns)?);
        }
        Command::Preview => {
            let columns = pipeline.resolve_columns(&config).await?;
            let mut sink = JsonLinesSink::new(&columns, io::stdout().lock());
            let count = pipeline.preview(&columns, &mut sink).await?;
            tracing::info!(records = count, "preview finished");
        }
        Command::Run => {
            let columns = pipeline.resolve_columns(&config).await?;
            let mut sink = JsonLinesSink::new(&columns, io::stdout().lock());
            let count = pipeline.run(&columns, config.page_size, &mut sink).await?;
            tracing::info!(records = count, "extraction finished");
        }
    }

    Ok(())
}
