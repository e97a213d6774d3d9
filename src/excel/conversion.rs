//! Conversión en lote de informes `.xls` a los CSV de trabajo.
//!
//! Cada fichero de entrada produce un `ResultadoConversion` con su estado; un
//! fichero que falla no detiene el resto del lote. Los destinos se borran y se
//! reescriben, así que repetir una conversión deja exactamente el mismo CSV.

use std::fmt;
use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

use crate::algorithm::nombre_fichero;
use crate::error::Result;
use crate::excel::consumo::{escribir_consumo, escribir_inventario};
use crate::excel::extractor::{ExtractorTabla, TablaExtraida};
use crate::excel::io::parse_numero;
use crate::excel::{listar_ficheros, nombre_de, Rutas};
use crate::models::{Cobertura, ConsumoProducto, RegistroInventario};

/// Orden de preferencia de la columna de consumo (`Col_n`).
pub const PREFERENCIA_CONSUMO: [usize; 5] = [10, 9, 11, 8, 12];
/// Columna con las existencias reales en el informe de inventario.
pub const COLUMNA_REAL: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoConversion {
    Saved,
    Error,
    NoDate,
    NoProducts,
    NoConsCol,
    NoRealCol,
    ErrorSave,
}

impl EstadoConversion {
    pub fn codigo(&self) -> &'static str {
        match self {
            EstadoConversion::Saved => "SAVED",
            EstadoConversion::Error => "ERROR",
            EstadoConversion::NoDate => "NO_DATE",
            EstadoConversion::NoProducts => "NO_PRODUCTS",
            EstadoConversion::NoConsCol => "NO_CONS_COL",
            EstadoConversion::NoRealCol => "NO_REAL_COL",
            EstadoConversion::ErrorSave => "ERROR_SAVE",
        }
    }
}

impl fmt::Display for EstadoConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.codigo())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultadoConversion {
    /// Fichero de entrada
    pub fichero: String,
    pub estado: EstadoConversion,
    /// Nombre del CSV guardado o descripción del problema
    pub detalle: String,
}

impl ResultadoConversion {
    fn new(fichero: &Path, estado: EstadoConversion, detalle: impl Into<String>) -> Self {
        let r = ResultadoConversion { fichero: nombre_de(fichero), estado, detalle: detalle.into() };
        if estado == EstadoConversion::Saved {
            info!("✅ {}: {} {}", r.fichero, r.estado, r.detalle);
        } else {
            warn!("⚠️ {}: {} {}", r.fichero, r.estado, r.detalle);
        }
        r
    }
}

/// Columna de consumo de una tabla extraída: la primera de
/// `PREFERENCIA_CONSUMO` que exista y, si no, `Col_1`.
pub fn elegir_columna_consumo(tabla: &TablaExtraida) -> Option<usize> {
    PREFERENCIA_CONSUMO
        .iter()
        .copied()
        .find(|n| tabla.tiene_columna(*n))
        .or_else(|| tabla.tiene_columna(1).then_some(1))
}

/// Primer jueves en o después de `fecha`, más siete días.
pub fn segundo_jueves_desde(fecha: NaiveDate) -> NaiveDate {
    let hasta_jueves = (3 + 7 - fecha.weekday().num_days_from_monday() as i64) % 7;
    fecha + Duration::days(hasta_jueves + 7)
}

fn filas_consumo(tabla: &TablaExtraida, col: usize) -> Vec<ConsumoProducto> {
    tabla
        .filas
        .iter()
        .map(|f| ConsumoProducto {
            codigo: f.codigo.clone(),
            articulo: f.articulo.clone(),
            unidad: f.unidad.clone(),
            consumo: f.col(col).and_then(parse_numero).unwrap_or(0.0),
        })
        .collect()
}

/// Pasos comunes a diarios y bulk: extraer, exigir fecha, productos y
/// columna de consumo.
fn preparar_consumo<E: ExtractorTabla>(
    extractor: &E,
    path: &Path,
) -> std::result::Result<(TablaExtraida, NaiveDate, Vec<ConsumoProducto>), ResultadoConversion> {
    let tabla = extractor
        .extraer(path)
        .map_err(|e| ResultadoConversion::new(path, EstadoConversion::Error, e.to_string()))?;
    let Some(fecha) = tabla.fecha else {
        return Err(ResultadoConversion::new(path, EstadoConversion::NoDate, "no se encontró fecha interna"));
    };
    if tabla.filas.is_empty() {
        return Err(ResultadoConversion::new(path, EstadoConversion::NoProducts, "no se extrajeron líneas de producto"));
    }
    let Some(col) = elegir_columna_consumo(&tabla) else {
        return Err(ResultadoConversion::new(path, EstadoConversion::NoConsCol, "no se localizó columna de consumo"));
    };
    let filas = filas_consumo(&tabla, col);
    Ok((tabla, fecha, filas))
}

fn guardar(path: &Path, destino: &Path, filas: &[ConsumoProducto]) -> ResultadoConversion {
    match escribir_consumo(destino, filas) {
        Ok(()) => ResultadoConversion::new(path, EstadoConversion::Saved, nombre_de(destino)),
        Err(e) => ResultadoConversion::new(path, EstadoConversion::ErrorSave, e.to_string()),
    }
}

fn entradas(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    if !dir.is_dir() {
        warn!("no existe la carpeta {:?}", dir);
        return Ok(Vec::new());
    }
    Ok(listar_ficheros(dir, &["xls", "xlsx"])?)
}

/// `ficheros_a_convertir/*.xls` -> `consumo_teorico/DD-MM-YY.csv`.
pub fn convertir_diarios<E: ExtractorTabla>(rutas: &Rutas, extractor: &E) -> Result<Vec<ResultadoConversion>> {
    let mut resultados = Vec::new();
    for path in entradas(&rutas.ficheros_a_convertir)? {
        let (_, fecha, filas) = match preparar_consumo(extractor, &path) {
            Ok(v) => v,
            Err(r) => {
                resultados.push(r);
                continue;
            }
        };
        let destino = rutas.consumo_teorico.join(nombre_fichero(&Cobertura::Dia { fecha }));
        resultados.push(guardar(&path, &destino, &filas));
    }
    Ok(resultados)
}

/// Cobertura de un informe bulk: de la primera fecha de grabación al día
/// anterior a la segunda; con menos de dos fechas, de la fecha interna al
/// segundo jueves.
pub fn cobertura_bulk(tabla: &TablaExtraida, fecha: NaiveDate) -> Cobertura {
    match tabla.fechas_grabacion.as_slice() {
        [inicio, segunda, ..] => Cobertura::Rango { inicio: *inicio, fin: *segunda - Duration::days(1) },
        _ => Cobertura::Rango { inicio: fecha, fin: segundo_jueves_desde(fecha) },
    }
}

/// `ficheros_a_convertir_bulk/*.xls` -> `consumo_teorico/DD-MM-YY_DD-MM-YY.csv`.
pub fn convertir_bulk<E: ExtractorTabla>(rutas: &Rutas, extractor: &E) -> Result<Vec<ResultadoConversion>> {
    let mut resultados = Vec::new();
    for path in entradas(&rutas.ficheros_a_convertir_bulk)? {
        let (tabla, fecha, filas) = match preparar_consumo(extractor, &path) {
            Ok(v) => v,
            Err(r) => {
                resultados.push(r);
                continue;
            }
        };
        let destino = rutas.consumo_teorico.join(nombre_fichero(&cobertura_bulk(&tabla, fecha)));
        resultados.push(guardar(&path, &destino, &filas));
    }
    Ok(resultados)
}

/// `inventario_actual.xls` -> `inventario_actual/inventario_real.csv`, con
/// `Col_16` como existencias reales.
pub fn convertir_inventario<E: ExtractorTabla>(rutas: &Rutas, extractor: &E) -> ResultadoConversion {
    let path = rutas.inventario_actual_xls.as_path();
    if !path.is_file() {
        return ResultadoConversion::new(path, EstadoConversion::Error, "no existe el fichero de inventario");
    }
    let tabla = match extractor.extraer(path) {
        Ok(t) => t,
        Err(e) => return ResultadoConversion::new(path, EstadoConversion::Error, e.to_string()),
    };
    if tabla.filas.is_empty() {
        return ResultadoConversion::new(path, EstadoConversion::NoProducts, "no se extrajeron líneas de producto");
    }
    if !tabla.tiene_columna(COLUMNA_REAL) {
        return ResultadoConversion::new(path, EstadoConversion::NoRealCol, format!("falta la columna Col_{}", COLUMNA_REAL));
    }

    let filas: Vec<RegistroInventario> = tabla
        .filas
        .iter()
        .map(|f| RegistroInventario {
            codigo: f.codigo.clone(),
            articulo: f.articulo.clone(),
            unidad: f.unidad.clone(),
            real: f.col(COLUMNA_REAL).and_then(parse_numero).unwrap_or(0.0),
        })
        .collect();
    match escribir_inventario(&rutas.inventario_real, &filas) {
        Ok(()) => ResultadoConversion::new(path, EstadoConversion::Saved, nombre_de(&rutas.inventario_real)),
        Err(e) => ResultadoConversion::new(path, EstadoConversion::ErrorSave, e.to_string()),
    }
}
