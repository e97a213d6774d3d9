//! Catálogo de ficheros de consumo ya convertidos (`consumo_teorico/`).
//!
//! El nombre del fichero es la única fuente de su cobertura:
//! `DD-MM-YY.csv` para un día y `DD-MM-YY_DD-MM-YY.csv` para un rango
//! inclusivo. Los ficheros con otro nombre se ignoran.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::Result;
use crate::excel::listar_ficheros;
use crate::models::{Cobertura, FicheroConsumo, LibroVentas};

const FORMATO_FECHA: &str = "%d-%m-%y";

fn parsear_fecha_corta(s: &str) -> Option<NaiveDate> {
	// chrono admite un solo dígito en día/mes; el formato persistido no
	if s.len() != 8 {
		return None;
	}
	NaiveDate::parse_from_str(s, FORMATO_FECHA).ok()
}

/// Cobertura codificada en un nombre de fichero (con o sin `.csv`). Un rango
/// con el fin anterior al inicio se normaliza intercambiando extremos.
pub fn parsear_nombre_fichero(nombre: &str) -> Option<Cobertura> {
	let stem = match nombre.len().checked_sub(4) {
		Some(i) if nombre.is_char_boundary(i) && nombre[i..].eq_ignore_ascii_case(".csv") => &nombre[..i],
		_ => nombre,
	};
	match stem.split('_').collect::<Vec<_>>().as_slice() {
		[dia] => parsear_fecha_corta(dia).map(|fecha| Cobertura::Dia { fecha }),
		[a, b] => {
			let (inicio, fin) = (parsear_fecha_corta(a)?, parsear_fecha_corta(b)?);
			let (inicio, fin) = if fin < inicio { (fin, inicio) } else { (inicio, fin) };
			Some(Cobertura::Rango { inicio, fin })
		}
		_ => None,
	}
}

/// Nombre persistido de un fichero de consumo para una cobertura.
pub fn nombre_fichero(cobertura: &Cobertura) -> String {
	match cobertura {
		Cobertura::Dia { fecha } => format!("{}.csv", fecha.format(FORMATO_FECHA)),
		Cobertura::Rango { inicio, fin } => {
			format!("{}_{}.csv", inicio.format(FORMATO_FECHA), fin.format(FORMATO_FECHA))
		}
	}
}

/// Candidato a partir de su ruta: cobertura, valor de ventas (real, si no
/// estimada, si no 0, día a día) y jueves de su propia cobertura.
pub fn construir_candidato(ruta: &Path, libro: &LibroVentas) -> Option<FicheroConsumo> {
	let nombre = ruta.file_name()?.to_str()?.to_string();
	let cobertura = parsear_nombre_fichero(&nombre)?;
	let valor_ventas = cobertura.dias().map(|d| libro.valor(d)).sum();
	Some(FicheroConsumo {
		ruta: ruta.to_path_buf(),
		nombre,
		jueves: cobertura.jueves(),
		cobertura,
		valor_ventas,
	})
}

/// Escanea `dir` (sólo `*.csv`, en orden de nombre). Un directorio
/// inexistente da un catálogo vacío.
pub fn escanear_catalogo(dir: &Path, libro: &LibroVentas) -> Result<Vec<FicheroConsumo>> {
	if !dir.is_dir() {
		debug!("catálogo {:?} no existe", dir);
		return Ok(Vec::new());
	}
	let ficheros: Vec<PathBuf> = listar_ficheros(dir, &["csv"])?;
	let total = ficheros.len();
	let candidatos: Vec<FicheroConsumo> = ficheros.iter().filter_map(|p| construir_candidato(p, libro)).collect();
	info!("🗂️ catálogo {:?}: {} candidatos ({} ignorados)", dir, candidatos.len(), total - candidatos.len());
	Ok(candidatos)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn d(y: i32, m: u32, dd: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(y, m, dd).unwrap()
	}

	#[test]
	fn test_parsear_nombres() {
		assert_eq!(parsear_nombre_fichero("05-02-26.csv"), Some(Cobertura::Dia { fecha: d(2026, 2, 5) }));
		assert_eq!(
			parsear_nombre_fichero("01-02-26_12-02-26.csv"),
			Some(Cobertura::Rango { inicio: d(2026, 2, 1), fin: d(2026, 2, 12) })
		);
		// rango invertido
		assert_eq!(
			parsear_nombre_fichero("12-02-26_01-02-26.CSV"),
			Some(Cobertura::Rango { inicio: d(2026, 2, 1), fin: d(2026, 2, 12) })
		);
		assert_eq!(parsear_nombre_fichero("5-2-26.csv"), None);
		assert_eq!(parsear_nombre_fichero("inventario.csv"), None);
		assert_eq!(parsear_nombre_fichero("01-02-26_x.csv"), None);
		assert_eq!(parsear_nombre_fichero("31-02-26.csv"), None);
	}

	#[test]
	fn test_nombre_fichero_inverso() {
		let r = Cobertura::Rango { inicio: d(2026, 1, 26), fin: d(2026, 2, 1) };
		assert_eq!(nombre_fichero(&r), "26-01-26_01-02-26.csv");
		assert_eq!(parsear_nombre_fichero(&nombre_fichero(&r)), Some(r));
	}

	#[test]
	fn test_candidato_valor_y_jueves() {
		let mut reales = HashMap::new();
		let mut estimadas = HashMap::new();
		reales.insert(d(2026, 2, 5), 300.0);
		estimadas.insert(d(2026, 2, 5), 1.0);
		estimadas.insert(d(2026, 2, 6), 200.0);
		let libro = LibroVentas::new(reales, estimadas);

		let c = construir_candidato(Path::new("/x/05-02-26_07-02-26.csv"), &libro).unwrap();
		assert!(c.es_rango());
		assert_eq!(c.valor_ventas, 500.0);
		assert_eq!(c.jueves, 1);
		assert_eq!(c.valor_centimos(), 50_000);
	}
}
