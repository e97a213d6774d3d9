//! Configuración de la aplicación a partir de variables de entorno.
//!
//! Se carga un `.env` opcional (igual que hace el módulo de analytics con
//! `dotenv`) y luego se leen:
//! - `PEDIDO_BASE_DIR`: directorio raíz con los ficheros de trabajo (por defecto `.`)
//! - `PEDIDO_BIND`: dirección del servidor HTTP (por defecto `127.0.0.1:8080`)
//! - `PEDIDO_MARGEN_CONSUMO`, `PEDIDO_TASA_MERMA`, `PEDIDO_DIAS_DESCONGELACION`:
//!   sobrescriben los parámetros de cálculo del pedido.

use std::path::PathBuf;
use tracing::warn;

use crate::algorithm::ParametrosPedido;
use crate::excel::Rutas;

pub const BIND_POR_DEFECTO: &str = "127.0.0.1:8080";

#[derive(Debug, Clone)]
pub struct Config {
    pub base_dir: PathBuf,
    pub bind: String,
    pub parametros: ParametrosPedido,
}

impl Config {
    /// Lee la configuración del entorno del proceso.
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Versión parametrizable (inyección del lector de variables) para poder
    /// probar sin tocar el entorno global.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_dir = lookup("PEDIDO_BASE_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let bind = lookup("PEDIDO_BIND")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| BIND_POR_DEFECTO.to_string());

        let mut parametros = ParametrosPedido::default();
        if let Some(v) = leer_f64(&lookup, "PEDIDO_MARGEN_CONSUMO") {
            parametros.margen_consumo = v;
        }
        if let Some(v) = leer_f64(&lookup, "PEDIDO_TASA_MERMA") {
            parametros.tasa_merma = v;
        }
        if let Some(raw) = lookup("PEDIDO_DIAS_DESCONGELACION") {
            match raw.trim().parse::<u32>() {
                Ok(d) => parametros.dias_descongelacion = d,
                Err(_) => warn!("PEDIDO_DIAS_DESCONGELACION inválido ('{}'), se usa {}", raw, parametros.dias_descongelacion),
            }
        }

        Config { base_dir, bind, parametros }
    }

    pub fn rutas(&self) -> Rutas {
        Rutas::new(&self.base_dir)
    }
}

fn leer_f64<F>(lookup: &F, clave: &str) -> Option<f64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(clave)?;
    match crate::excel::parse_numero(&raw) {
        Some(v) if v >= 0.0 => Some(v),
        _ => {
            warn!("{} inválido ('{}'), se mantiene el valor por defecto", clave, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_sin_variables() {
        let cfg = Config::from_lookup(|_| None);
        assert_eq!(cfg.base_dir, PathBuf::from("."));
        assert_eq!(cfg.bind, BIND_POR_DEFECTO);
        assert_eq!(cfg.parametros.dias_descongelacion, 4);
        assert!((cfg.parametros.margen_consumo - 0.20).abs() < 1e-12);
    }

    #[test]
    fn test_overrides_y_valores_invalidos() {
        let vars: HashMap<&str, &str> = [
            ("PEDIDO_BASE_DIR", "/srv/pedido"),
            ("PEDIDO_MARGEN_CONSUMO", "0,25"),
            ("PEDIDO_TASA_MERMA", "abc"),
            ("PEDIDO_DIAS_DESCONGELACION", "5"),
        ]
        .into_iter()
        .collect();
        let cfg = Config::from_lookup(|k| vars.get(k).map(|s| s.to_string()));
        assert_eq!(cfg.base_dir, PathBuf::from("/srv/pedido"));
        assert!((cfg.parametros.margen_consumo - 0.25).abs() < 1e-12);
        // valor inválido -> se mantiene el por defecto
        assert!((cfg.parametros.tasa_merma - 0.04).abs() < 1e-12);
        assert_eq!(cfg.parametros.dias_descongelacion, 5);
        assert_eq!(cfg.rutas().consumo_teorico, PathBuf::from("/srv/pedido/consumo_teorico"));
    }
}
