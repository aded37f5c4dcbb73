#[tokio::main]
async fn main() -> std::io::Result<()> {
    wave_server::frameworks::server::run_with_config().await
}
