//! Generate an image and print each progress change.
//!
//! Reads the endpoint from `WEIGHTS_UNOFFICIAL_ENDPOINT` (default
//! http://localhost:3000) and the API key from `WEIGHTS_API_KEY`.
//!
//! ```sh
//! RUST_LOG=weights_client=debug cargo run --example progressive_generation -- "a koi pond in autumn" pixel-art
//! ```

use weights_client::{
    CancellationToken, ClientConfig, GenerationRequest, WeightsClient, WeightsError,
};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let prompt = args
        .next()
        .unwrap_or_else(|| "a lighthouse on a cliff at dusk, oil painting".to_string());
    let mut request = GenerationRequest::new(prompt);
    if let Some(lora) = args.next() {
        request = request.lora(lora);
    }

    let api_key = std::env::var("WEIGHTS_API_KEY").unwrap_or_default();
    let cancel = CancellationToken::new();
    let client = WeightsClient::new(ClientConfig::from_env(api_key))?
        .with_cancellation(cancel.clone());

    // Ctrl-C stops polling, even mid-interval
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let result = client
        .generate_and_wait(&request, |update| {
            println!("[{}] {}", update.job_id, update.status);
        })
        .await;

    match result {
        Ok(snapshot) => println!("Done: {}", serde_json::to_string_pretty(&snapshot)?),
        Err(WeightsError::GenerationFailed { message, .. }) => eprintln!("Failed: {}", message),
        Err(WeightsError::Cancelled) => eprintln!("Cancelled"),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
