use actix_web::{web, App, HttpServer};
use tracing::info;

use crate::config::Config;
use crate::server_handlers::{
    convertir_bulk_handler, convertir_diarios_handler, convertir_inventario_handler, ficheros_consumo_handler,
    help_handler, maestro_handler, pedido_handler, resumen_ventas_handler,
};

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.bind.clone();
    info!("🚀 servidor en http://{} (base {:?})", bind_addr, config.base_dir);
    let data = web::Data::new(config);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .route("/ventas/resumen", web::get().to(resumen_ventas_handler))
            .route("/consumo/ficheros", web::get().to(ficheros_consumo_handler))
            .route("/maestro", web::get().to(maestro_handler))
            .route("/pedido", web::post().to(pedido_handler))
            .route("/convertir/diarios", web::post().to(convertir_diarios_handler))
            .route("/convertir/bulk", web::post().to(convertir_bulk_handler))
            .route("/convertir/inventario", web::post().to(convertir_inventario_handler))
            .route("/help", web::get().to(help_handler))
    })
    .bind(bind_addr)?
    .run()
    .await
}
