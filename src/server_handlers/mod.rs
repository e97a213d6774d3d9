pub mod pedido;
pub mod ventas;
pub mod conversion;
pub mod docs;

pub use pedido::*;
pub use ventas::*;
pub use conversion::*;
pub use docs::*;

use std::sync::{Arc, OnceLock};

use actix_web::HttpResponse;
use serde_json::json;
use tokio::sync::Semaphore;

/// Ejecuta trabajo de disco/CPU fuera del runtime, limitado a tantas tareas
/// simultáneas como CPUs. El error ya viene como respuesta HTTP.
pub(crate) async fn en_bloqueo<F, T>(f: F) -> Result<T, HttpResponse>
where
    F: FnOnce() -> Result<T, String> + Send + 'static,
    T: Send + 'static,
{
    static GLOBAL_SEM: OnceLock<Arc<Semaphore>> = OnceLock::new();
    let sem = GLOBAL_SEM
        .get_or_init(|| Arc::new(Semaphore::new(std::cmp::max(1, num_cpus::get()))))
        .clone();

    let permit = match sem.acquire_owned().await {
        Ok(p) => p,
        Err(_) => return Err(HttpResponse::InternalServerError().json(json!({"error": "failed to acquire semaphore"}))),
    };

    let handle = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        f()
    });

    match handle.await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(msg)) => Err(HttpResponse::InternalServerError().json(json!({"error": msg}))),
        Err(e) => Err(HttpResponse::InternalServerError().json(json!({"error": format!("task join error: {}", e)}))),
    }
}
