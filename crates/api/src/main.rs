use anyhow::Result;
use ivr_api::build_app;
use ivr_api::config::ApiConfig;
use ivr_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("ivr_api");

    let config = ApiConfig::from_env()?;
    let bind = config.bind.clone();
    let record_source = config.record_source.to_string();
    let outbound_calls = config.telephony.is_some();

    let app = build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(
        bind = %bind,
        record_source = %record_source,
        outbound_calls,
        "rail enquiry ivr started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
