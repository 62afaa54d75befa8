//! Command-line entry point
//!
//! `menu-crawler <menu-board|storefront> [--config <path>]`
//!
//! Runs the selected pipeline over the HTTP fallback driver and writes to
//! the configured output path. Ctrl-C requests cancellation; in-flight
//! parents finish their accounting before the run stops.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use menu_crawler::infrastructure::config::{AppConfig, SiteProfile};
use menu_crawler::infrastructure::http_driver::HttpDriver;
use menu_crawler::infrastructure::logging::init_logging;
use menu_crawler::infrastructure::sink::{JsonDocumentSink, JsonLinesSink};
use menu_crawler::{MenuBoardCrawler, RunSummary, StorefrontCrawler};

struct CliArgs {
    profile: SiteProfile,
    config_file: Option<PathBuf>,
}

fn parse_args() -> Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let profile: SiteProfile = args
        .next()
        .context("usage: menu-crawler <menu-board|storefront> [--config <path>]")?
        .parse()?;

    let mut config_file = None;
    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--config" => {
                let path = args.next().context("--config requires a path")?;
                config_file = Some(PathBuf::from(path));
            }
            other => anyhow::bail!("unknown argument '{other}'"),
        }
    }

    Ok(CliArgs {
        profile,
        config_file,
    })
}

async fn run(args: CliArgs) -> Result<RunSummary> {
    let config = AppConfig::load(args.profile, args.config_file.as_deref())
        .context("failed to load configuration")?;
    init_logging(&config.logging)?;

    info!(
        profile = ?config.crawl.profile,
        seed = %config.crawl.seed_url,
        output = %config.crawl.output_path.display(),
        "starting crawl"
    );

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling run");
            signal_cancel.cancel();
        }
    });

    let driver = HttpDriver::new(&config.http).context("failed to initialize HTTP driver")?;

    let summary = match config.crawl.profile {
        SiteProfile::MenuBoard => {
            let sink = JsonLinesSink::create(&config.crawl.output_path)
                .context("failed to open output file")?;
            let mut crawler =
                MenuBoardCrawler::new(driver, sink, config.crawl.clone(), &config.selectors)?
                    .with_cancellation(cancel);
            crawler.run().await?
        }
        SiteProfile::Storefront => {
            let sink = JsonDocumentSink::create(&config.crawl.output_path)
                .context("failed to open output file")?;
            let mut crawler =
                StorefrontCrawler::new(driver, sink, config.crawl.clone(), &config.selectors)?
                    .with_cancellation(cancel);
            crawler.run().await?
        }
    };

    Ok(summary)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(summary) => {
            info!(
                run_id = %summary.run_id,
                status = ?summary.status,
                emitted = summary.parents_emitted,
                errors = summary.error_count,
                seconds = summary.execution_time_seconds,
                "run summary"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}
