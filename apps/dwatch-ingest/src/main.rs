use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = dwatch_ingest::Args::parse();

	dwatch_ingest::run(args).await
}
