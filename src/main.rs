//! NutriScale
//!
//! An MCP server for calorie targets, macro splits and meal suggestions.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use nutriscale::build_info;
use nutriscale::config::Config;
use nutriscale::db::{migrations, Database};
use nutriscale::mcp::NutriScaleService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nutriscale=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Print startup banner to stderr
    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = Config::from_env();
    eprintln!("Database path: {}", config.database_path.display());
    eprintln!("Export directory: {}", config.export_dir.display());

    // Ensure data directory exists
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database and run migrations
    eprintln!("Initializing database...");
    let database = Database::open(&config.database_path)?;
    let version = database.with_conn(migrations::get_schema_version)?;
    eprintln!("Database schema version: {}", version);

    tracing::info!(
        max_search_items = config.recommender.max_search_items,
        node_budget = config.recommender.node_budget,
        "recommender limits"
    );

    // Create the NutriScale service
    let service = NutriScaleService::new(&config, database);

    // Create stdio transport
    let transport = (stdin(), stdout());

    // Start the MCP server
    let server = service.serve(transport).await?;

    // Wait for the server to complete
    server.waiting().await?;

    Ok(())
}
