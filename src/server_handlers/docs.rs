use actix_web::{HttpResponse, Responder};
use serde_json::json;

use crate::api_json::PedidoParams;

pub async fn help_handler() -> impl Responder {
    let example = PedidoParams {
        inicio: "2026-02-01".to_string(),
        fin: "2026-02-12".to_string(),
        evitar_jueves: false,
    };

    let help = json!({
        "description": "API para calcular el pedido al camión. POST /pedido elige los ficheros de consumo cuyo total de ventas se acerca más al del rango (con el mismo número de jueves) y calcula las cantidades a pedir frente al inventario real.",
        "post_example": example,
        "endpoints": {
            "GET /ventas/resumen?inicio&fin": "ventas del rango por día (real, estimada o faltante)",
            "GET /consumo/ficheros": "catálogo de ficheros de consumo_teorico",
            "GET /maestro": "maestro de productos (congelado, fresco, seco)",
            "POST /pedido": "cálculo completo del pedido",
            "POST /convertir/diarios": "ficheros_a_convertir/ -> consumo_teorico/DD-MM-YY.csv",
            "POST /convertir/bulk": "ficheros_a_convertir_bulk/ -> consumo_teorico/DD-MM-YY_DD-MM-YY.csv",
            "POST /convertir/inventario": "inventario_actual.xls -> inventario_actual/inventario_real.csv"
        },
        "note": "Las fechas aceptan YYYY-MM-DD, DD/MM/YYYY o '12 de febrero de 2026'."
    });

    HttpResponse::Ok().json(help)
}
