use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hcc_core::config::resolve::load_from_file;
use hcc_db::SqlxConnector;
use hcc_events::EventLogger;
use hcc_worker::cli::Cli;
use hcc_worker::orchestrator::{Orchestrator, SOURCE};
use hcc_worker::report;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hcc=info,hcc_worker=info,hcc_events=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let logger = EventLogger::spawn(cli.verbose);

    let outcome = run(&cli, &logger).await;
    if let Err(err) = &outcome {
        logger.sink().info(SOURCE, format!("Run aborted: {err:#}"));
    }

    // Every event has been enqueued; flush and stop the logger last.
    logger.shutdown().await;

    match outcome {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(_) => std::process::ExitCode::FAILURE,
    }
}

async fn run(cli: &Cli, logger: &EventLogger) -> anyhow::Result<()> {
    let sink = logger.sink();
    sink.info(SOURCE, "HanaCleanCentral initialising");
    sink.info(
        SOURCE,
        format!("Configuration file = {}", cli.config_file.display()),
    );
    sink.info(SOURCE, format!("Verbose mode = {}", cli.verbose));
    sink.info(SOURCE, format!("Dry run mode = {}", cli.dry_run));

    let config = load_from_file(&cli.config_file, &sink)?;
    config.check_unique()?;

    if cli.print_config {
        let json = config
            .to_pretty_json()
            .context("Printing application configuration failed")?;
        println!("{json}");
        return Ok(());
    }

    sink.info(
        SOURCE,
        format!("Found a valid config for {} databases", config.databases.len()),
    );

    let connector = SqlxConnector;
    let reports = Orchestrator::new(&connector, sink.clone(), cli.dry_run)
        .run(&config)
        .await;
    report::publish(&reports, &sink, cli.dry_run);

    Ok(())
}
