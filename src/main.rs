use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use library_catalog::application::service::CatalogService;
use library_catalog::infra::json_store::JsonCatalogRepository;
use library_catalog::interface::cli::{Cli, Command};
use library_catalog::interface::{mcp, menu};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout はメニュー / MCP が使うため、ログは stderr へ
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let config = Cli::parse().config();

    match config.mode {
        Command::Menu => {
            let mut svc = CatalogService::open(JsonCatalogRepository::new(config.file));
            tracing::info!(
                location = %svc.location(),
                books = svc.list().len(),
                "catalog opened"
            );
            let stdin = std::io::stdin();
            menu::run(&mut svc, stdin.lock(), std::io::stdout())?;
            Ok(())
        }
        Command::Serve => mcp::run(config.file).await,
    }
}
