//! HTTP server for the text-to-SQL form
//! Reads configuration from the environment (and `.env`), then serves forever.

use sql_assistant::{logging, web, Assistant, AssistantConfig};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let config = AssistantConfig::from_env()?;
    info!(
        database = %config.database_path.display(),
        model = %config.model,
        read_only = config.read_only,
        "Starting text-to-SQL assistant"
    );

    let assistant = Assistant::from_config(&config);
    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!("Server listening on {}", config.listen_addr);

    web::serve(listener, &assistant).await?;
    Ok(())
}
