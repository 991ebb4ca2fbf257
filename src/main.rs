#[tokio::main]
async fn main() {
    if let Err(e) = telecare_lib::run().await {
        tracing::error!("Startup failed: {e}");
        eprintln!("telecare: {e}");
        std::process::exit(1);
    }
}
