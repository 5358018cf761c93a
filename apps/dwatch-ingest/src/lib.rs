use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dwatch_service::{Capabilities, Pipeline, RunReport};

#[derive(Debug, Parser)]
#[command(
	version = dwatch_cli::VERSION,
	rename_all = "kebab",
	styles = dwatch_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Print the run report as JSON on stdout.
	#[arg(long)]
	pub json: bool,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	// A missing .env is fine; variables may come from the real environment.
	let _ = dotenvy::dotenv();
	let config = dwatch_config::load(&args.config)?;

	init_tracing(&config)?;

	let caps = Capabilities::connect(&config).await?;
	let pipeline = Pipeline::new(&config, caps)?;
	let report = pipeline.run().await?;

	log_report(&report);

	if args.json {
		println!("{}", serde_json::to_string_pretty(&report)?);
	}

	Ok(())
}

fn init_tracing(config: &dwatch_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	Ok(())
}

fn log_report(report: &RunReport) {
	tracing::info!(
		categories = report.categories_fetched,
		fetched = report.fetched,
		skipped = report.skipped_seen,
		enriched = report.enriched,
		existing = report.existing_count,
		new = report.new_count,
		total = report.total_after_merge,
		indexed = report.indexed,
		index_failures = report.index_failures,
		"Ingestion run finished."
	);
}
