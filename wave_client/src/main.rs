#[tokio::main]
async fn main() {
    if let Err(e) = wave_client::frameworks::bot::run_with_config().await {
        tracing::error!(error = %e, "bot failed");
        std::process::exit(1);
    }
}
