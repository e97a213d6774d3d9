// --- Pedido al camión - Archivo principal ---

use pedido_camion::{run_server, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // RUST_LOG puede venir del .env
    let _ = dotenv::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let config = Config::from_env();

    tracing::info!("=== Pedido al camión (API) ===");
    run_server(config).await
}
