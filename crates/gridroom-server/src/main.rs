use gridroom::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        bind = %config.bind_addr,
        db = %config.db_path.display(),
        board_size = ?config.board_size,
        notify_rejections = config.notify_rejections,
        "starting gridroom server"
    );

    let server = GridroomServer::builder()
        .bind(&config.bind_addr)
        .coordinator_config(config.coordinator_config())
        .build(JsonFileStore::new(&config.db_path))
        .await?;

    server.run().await?;
    Ok(())
}
