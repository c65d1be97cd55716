use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use webpage2pdf::cli::Args;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info,webpage2pdf=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {

    let args = Args::parse();
    init_tracing(args.verbose);

    let cwd = std::env::current_dir().context("Can't read current directory")?;
    let options = args.into_render_options(&cwd)?;

    info!(options = %serde_json::to_string_pretty(&options)?, "resolved options");

    let path = webpage2pdf::render(options)
        .await
        .context("Can't render webpage")?;

    info!(path = %path.display(), "done");

    Ok(())
}
