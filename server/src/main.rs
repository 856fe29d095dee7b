use server::{Config, Server, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_environment()?;

    let config = Config::from_env();
    tracing::info!(
        port = config.http_port,
        environment = %config.environment,
        "Marketplace server starting"
    );

    Server::new(config).run().await
}
