//! Print health, quota, and LoRA and voice-model search results.
//!
//! ```sh
//! cargo run --example service_info -- anime
//! ```

use weights_client::{ClientConfig, WeightsClient};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let api_key = std::env::var("WEIGHTS_API_KEY").unwrap_or_default();
    let client = WeightsClient::new(ClientConfig::from_env(api_key))?;

    let health = match client.health().await {
        Ok(h) => h,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(());
        }
    };
    println!("Service at {} is {:?}", client.endpoint(), health.status);

    let quota = client.quota().await?;
    println!("Quota: {}", quota.0);

    let query = std::env::args().nth(1).unwrap_or_else(|| "anime".to_string());
    let loras = client.search_loras(&query).await?;
    println!("LoRAs matching {:?}: {}", query, serde_json::to_string_pretty(&loras)?);

    let voices = client.search_voice_models(&query).await?;
    println!("Voice models matching {:?}: {}", query, serde_json::to_string_pretty(&voices)?);

    Ok(())
}
