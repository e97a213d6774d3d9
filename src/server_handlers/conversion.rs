use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::config::Config;
use crate::excel::{convertir_bulk, convertir_diarios, convertir_inventario, EstadoConversion, ExtractorCalamine, ResultadoConversion};
use crate::server_handlers::en_bloqueo;

fn respuesta(resultados: Vec<ResultadoConversion>) -> HttpResponse {
    let guardados = resultados.iter().filter(|r| r.estado == EstadoConversion::Saved).count();
    HttpResponse::Ok().json(json!({
        "total": resultados.len(),
        "guardados": guardados,
        "resultados": resultados,
    }))
}

/// POST /convertir/diarios
pub async fn convertir_diarios_handler(cfg: web::Data<Config>) -> impl Responder {
    let rutas = cfg.rutas();
    match en_bloqueo(move || convertir_diarios(&rutas, &ExtractorCalamine).map_err(|e| e.to_string())).await {
        Ok(r) => respuesta(r),
        Err(resp) => resp,
    }
}

/// POST /convertir/bulk
pub async fn convertir_bulk_handler(cfg: web::Data<Config>) -> impl Responder {
    let rutas = cfg.rutas();
    match en_bloqueo(move || convertir_bulk(&rutas, &ExtractorCalamine).map_err(|e| e.to_string())).await {
        Ok(r) => respuesta(r),
        Err(resp) => resp,
    }
}

/// POST /convertir/inventario
pub async fn convertir_inventario_handler(cfg: web::Data<Config>) -> impl Responder {
    let rutas = cfg.rutas();
    match en_bloqueo(move || Ok(convertir_inventario(&rutas, &ExtractorCalamine))).await {
        Ok(r) => respuesta(vec![r]),
        Err(resp) => resp,
    }
}
