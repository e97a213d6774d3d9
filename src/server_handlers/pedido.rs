use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use tracing::info;

use crate::api_json::PedidoParams;
use crate::config::Config;
use crate::server_handlers::en_bloqueo;

/// POST /pedido
/// Cuerpo: `PedidoParams`. Devuelve el `InformePedido` completo.
pub async fn pedido_handler(req: HttpRequest, cfg: web::Data<Config>, body: web::Json<serde_json::Value>) -> impl Responder {
    let params: PedidoParams = match serde_json::from_value(body.into_inner()) {
        Ok(p) => p,
        Err(e) => return HttpResponse::BadRequest().json(json!({"error": format!("failed to parse input: {}", e)})),
    };
    let (inicio, fin) = match params.rango() {
        Ok(r) => r,
        Err(e) => return HttpResponse::BadRequest().json(json!({"error": e.to_string()})),
    };

    let client_ip = req.connection_info().realip_remote_addr().unwrap_or("unknown").to_string();
    let start = std::time::Instant::now();
    let rutas = cfg.rutas();
    let parametros = cfg.parametros.clone();
    let evitar_jueves = params.evitar_jueves;

    let resultado = en_bloqueo(move || {
        crate::algorithm::ejecutar_pedido(&rutas, inicio, fin, evitar_jueves, &parametros).map_err(|e| e.to_string())
    })
    .await;

    match resultado {
        Ok(informe) => {
            info!("📦 POST /pedido {}..{} desde {} en {} ms", inicio, fin, client_ip, start.elapsed().as_millis());
            HttpResponse::Ok().json(informe)
        }
        Err(resp) => resp,
    }
}
