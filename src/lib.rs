// Biblioteca raíz del crate `pedido_camion`.
// Reexporta los módulos principales y el orquestador `ejecutar_pedido`.
pub mod config;
pub mod error;
pub mod excel;
pub mod algorithm;
pub mod models;
pub mod api_json;
pub mod server;
pub mod server_handlers;

pub use algorithm::{ejecutar_pedido, InformePedido, ParametrosPedido};
pub use config::Config;
pub use error::{PedidoError, Result};
pub use excel::Rutas;

/// Ejecuta el servidor HTTP (reexport para facilitar uso desde `main`)
pub use server::run_server;
