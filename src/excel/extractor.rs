//! Extracción de la tabla de productos de un informe de consumo/inventario
//! exportado a `.xls`.
//!
//! Una fila es de producto cuando la columna 0 contiene un código en
//! mayúsculas (`^[A-Z0-9-]+$`). El artículo se toma de la columna 2 (o de la
//! primera celda no vacía entre la 1 y la 5), la unidad de medida se busca
//! entre las 12 primeras columnas y todo lo que va de la columna 3 en adelante
//! queda como `Col_1`, `Col_2`, ...

use std::path::Path;

use calamine::Data;
use chrono::NaiveDate;

use crate::error::Result;
use crate::excel::io::{cell_to_string, fecha_desde_celda, fecha_desde_serial, leer_hoja_datos, parse_fecha_texto};

pub const PALABRAS_UNIDAD: [&str; 5] = ["Kilogramo", "Bola", "Litro", "Gramo", "Unidad"];
const ETIQUETA_FECHA: &str = "fecha de grabaci";
const PRIMERA_COLUMNA_EXTRA: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct FilaProducto {
    pub codigo: String,
    pub articulo: String,
    pub unidad: String,
    /// Columnas desde la 3 en adelante: `extras[0]` es `Col_1`.
    pub extras: Vec<String>,
}

impl FilaProducto {
    /// Valor de `Col_n` (1-based).
    pub fn col(&self, n: usize) -> Option<&str> {
        n.checked_sub(1).and_then(|i| self.extras.get(i)).map(|s| s.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TablaExtraida {
    /// Fecha interna del informe (primera fecha encontrada).
    pub fecha: Option<NaiveDate>,
    /// Todas las fechas de grabación distintas, en orden de aparición.
    pub fechas_grabacion: Vec<NaiveDate>,
    pub filas: Vec<FilaProducto>,
}

impl TablaExtraida {
    pub fn num_columnas_extra(&self) -> usize {
        self.filas.iter().map(|f| f.extras.len()).max().unwrap_or(0)
    }

    pub fn tiene_columna(&self, n: usize) -> bool {
        n >= 1 && n <= self.num_columnas_extra()
    }
}

/// Extractor de la tabla de productos de un fichero.
pub trait ExtractorTabla {
    fn extraer(&self, path: &Path) -> Result<TablaExtraida>;
}

/// Implementación sobre calamine (`.xls`, `.xlsx`, `.ods`), primera hoja.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractorCalamine;

impl ExtractorTabla for ExtractorCalamine {
    fn extraer(&self, path: &Path) -> Result<TablaExtraida> {
        let rows = leer_hoja_datos(path, "")?;
        Ok(extraer_de_celdas(&rows))
    }
}

pub fn extraer_de_celdas(rows: &[Vec<Data>]) -> TablaExtraida {
    let fechas_grabacion = fechas_del_informe(rows);
    TablaExtraida {
        fecha: fechas_grabacion.first().copied(),
        fechas_grabacion,
        filas: rows.iter().filter_map(|r| fila_producto(r)).collect(),
    }
}

fn limpiar(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c| c == '\'' || c == '"')
        .trim()
        .to_string()
}

fn es_codigo(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
}

fn fila_producto(row: &[Data]) -> Option<FilaProducto> {
    let textos: Vec<String> = row.iter().map(|c| limpiar(&cell_to_string(c))).collect();
    let codigo = textos.first()?.clone();
    if !es_codigo(&codigo) {
        return None;
    }

    let articulo = textos
        .get(2)
        .filter(|s| !s.is_empty())
        .or_else(|| textos.iter().take(6).skip(1).find(|s| !s.is_empty()))
        .map(|s| s.trim_start_matches('*').trim().to_string())
        .unwrap_or_default();

    let unidad = textos
        .iter()
        .take(12)
        .find_map(|t| {
            let t = t.to_lowercase();
            PALABRAS_UNIDAD
                .iter()
                .find(|uw| t.contains(&uw.to_lowercase()))
                .map(|uw| uw.to_string())
        })
        .unwrap_or_default();

    let extras = textos.iter().skip(PRIMERA_COLUMNA_EXTRA).cloned().collect();
    Some(FilaProducto { codigo, articulo, unidad, extras })
}

/// Fechas `d/m/aaaa` escritas dentro de un texto.
fn fechas_en_texto(s: &str) -> Vec<NaiveDate> {
    s.split(|c: char| !(c.is_ascii_digit() || c == '/'))
        .filter(|tok| {
            let partes: Vec<&str> = tok.split('/').collect();
            partes.len() == 3 && (1..=2).contains(&partes[0].len()) && (1..=2).contains(&partes[1].len()) && partes[2].len() == 4
        })
        .filter_map(parse_fecha_texto)
        .collect()
}

/// Fechas del informe: primero las que aparecen escritas en cualquier celda
/// (recorrido por filas), después las que acompañan a la etiqueta
/// "Fecha de grabación" en las 5 celdas a su derecha. Sin repetidos.
pub fn fechas_del_informe(rows: &[Vec<Data>]) -> Vec<NaiveDate> {
    fn push(f: NaiveDate, out: &mut Vec<NaiveDate>) {
        if !out.contains(&f) {
            out.push(f);
        }
    }

    let mut out: Vec<NaiveDate> = Vec::new();

    for row in rows {
        for c in row {
            if let Data::String(s) = c {
                for f in fechas_en_texto(s) {
                    push(f, &mut out);
                }
            }
        }
    }

    for row in rows {
        for (i, c) in row.iter().enumerate() {
            let texto = limpiar(&cell_to_string(c)).to_lowercase();
            if !texto.contains(ETIQUETA_FECHA) {
                continue;
            }
            for vecina in row.iter().skip(i + 1).take(5) {
                let f = match vecina {
                    Data::Empty => None,
                    Data::Float(v) => fecha_desde_serial(*v),
                    Data::Int(v) => fecha_desde_serial(*v as f64),
                    other => fecha_desde_celda(other),
                };
                if let Some(f) = f {
                    push(f, &mut out);
                    break;
                }
            }
        }
    }
    out
}
