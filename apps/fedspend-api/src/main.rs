use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = fedspend_api::Args::parse();
	fedspend_api::run(args).await
}
