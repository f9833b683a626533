use vector_db::cli::ServerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::parse_with_overrides()?;
    vector_db::logging::init(&config.log_level);
    vector_db::run(config).await?;
    Ok(())
}
