use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PedidoError, Result};
use crate::excel::parse_fecha_texto;

/// Parámetros de entrada para el cálculo del pedido
///
/// # Estructura del JSON esperado:
/// ```json
/// {
///   "inicio": "2026-02-01",
///   "fin": "12/02/2026",
///   "evitar_jueves": false
/// }
/// ```
///
/// # Campos:
/// - `inicio`, `fin`: extremos del rango (inclusivos). Se aceptan `YYYY-MM-DD`,
///   `DD/MM/YYYY` y la forma larga `12 de febrero de 2026`. Si vienen al revés
///   se intercambian.
/// - `evitar_jueves`: descarta los ficheros de consumo que contienen jueves
///   (si queda alguno sin jueves). Por defecto `false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PedidoParams {
	pub inicio: String,
	pub fin: String,
	#[serde(default)]
	pub evitar_jueves: bool,
}

/// Rango de fechas en query (`?inicio=...&fin=...`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangoParams {
	pub inicio: String,
	pub fin: String,
}

fn fecha(raw: &str) -> Result<NaiveDate> {
	parse_fecha_texto(raw).ok_or_else(|| PedidoError::FechaInvalida(raw.to_string()))
}

/// Fechas del rango ya parseadas y ordenadas.
pub fn resolver_rango(inicio: &str, fin: &str) -> Result<(NaiveDate, NaiveDate)> {
	let (a, b) = (fecha(inicio)?, fecha(fin)?);
	Ok(if b < a { (b, a) } else { (a, b) })
}

impl PedidoParams {
	pub fn rango(&self) -> Result<(NaiveDate, NaiveDate)> {
		resolver_rango(&self.inicio, &self.fin)
	}
}

impl RangoParams {
	pub fn rango(&self) -> Result<(NaiveDate, NaiveDate)> {
		resolver_rango(&self.inicio, &self.fin)
	}
}

/// Parsea el cuerpo JSON de `POST /pedido`.
pub fn parse_json_input(json_str: &str) -> std::result::Result<PedidoParams, serde_json::Error> {
	serde_json::from_str(json_str)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_pedido_params() {
		let p = parse_json_input(r#"{"inicio": "2026-02-01", "fin": "12/02/2026"}"#).unwrap();
		assert!(!p.evitar_jueves);
		let (a, b) = p.rango().unwrap();
		assert_eq!(a, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
		assert_eq!(b, NaiveDate::from_ymd_opt(2026, 2, 12).unwrap());
	}

	#[test]
	fn test_rango_invertido_y_fecha_invalida() {
		let (a, b) = resolver_rango("12/02/2026", "1 de febrero de 2026").unwrap();
		assert!(a < b);
		assert!(matches!(resolver_rango("ayer", "2026-02-01"), Err(PedidoError::FechaInvalida(_))));
	}

	#[test]
	fn test_json_invalido() {
		assert!(parse_json_input(r#"{"inicio": "2026-02-01"}"#).is_err());
	}
}
