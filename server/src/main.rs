use comanda_server::{Config, Server, init_logger_with_file};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, logging)
    dotenv::dotenv().ok();

    let config = Config::from_env();
    let log_dir = config.log_dir();
    let _ = std::fs::create_dir_all(&log_dir);
    init_logger_with_file(None, log_dir.to_str());

    tracing::info!("🍽️  Comanda server starting...");

    // 2. Run until ctrl-c
    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}
