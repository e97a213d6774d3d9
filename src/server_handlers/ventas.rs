use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::api_json::RangoParams;
use crate::config::Config;
use crate::server_handlers::en_bloqueo;

/// GET /ventas/resumen?inicio=2026-02-01&fin=2026-02-12
pub async fn resumen_ventas_handler(cfg: web::Data<Config>, query: web::Query<RangoParams>) -> impl Responder {
    let (inicio, fin) = match query.rango() {
        Ok(r) => r,
        Err(e) => return HttpResponse::BadRequest().json(json!({"error": e.to_string()})),
    };
    let rutas = cfg.rutas();
    match en_bloqueo(move || {
        crate::algorithm::resumir_rango_desde_disco(&rutas, inicio, fin).map_err(|e| e.to_string())
    })
    .await
    {
        Ok(resumen) => HttpResponse::Ok().json(json!({
            "resumen": resumen,
            "dias_faltantes": resumen.dias_faltantes(),
        })),
        Err(resp) => resp,
    }
}

/// GET /consumo/ficheros
/// Catálogo de ficheros de consumo con su cobertura, ventas y jueves.
pub async fn ficheros_consumo_handler(cfg: web::Data<Config>) -> impl Responder {
    let rutas = cfg.rutas();
    match en_bloqueo(move || {
        let libro = crate::excel::cargar_libro_ventas(&rutas).map_err(|e| e.to_string())?;
        crate::algorithm::escanear_catalogo(&rutas.consumo_teorico, &libro).map_err(|e| e.to_string())
    })
    .await
    {
        Ok(candidatos) => HttpResponse::Ok().json(json!({"total": candidatos.len(), "ficheros": candidatos})),
        Err(resp) => resp,
    }
}

/// GET /maestro
pub async fn maestro_handler(cfg: web::Data<Config>) -> impl Responder {
    let rutas = cfg.rutas();
    match en_bloqueo(move || crate::excel::cargar_maestro(&rutas).map_err(|e| e.to_string())).await {
        Ok(maestro) => HttpResponse::Ok().json(maestro),
        Err(resp) => resp,
    }
}
