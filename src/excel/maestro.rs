//! Maestro de productos: hojas de cálculo por categoría (`congelado/`,
//! `fresco/`, `seco/`) con encabezado y columnas detectados por nombre.
//!
//! La detección va en dos pasos, ambos funciones puras que devuelven
//! `Option`: primero la fila de encabezado (la primera de las 40 iniciales con
//! al menos dos palabras clave) y después cada columna por nombre exacto o
//! por inclusión. Un fichero sin encabezado detectable se omite.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::excel::io::{leer_hoja, parse_numero};
use crate::excel::{listar_ficheros, nombre_de, Rutas};
use crate::models::{Categoria, EntradaMaestro};

pub const PALABRAS_ENCABEZADO: [&str; 8] =
    ["articulo", "artículo", "codigo", "código", "unid", "medida", "embalaje", "nombre"];
pub const FILAS_BUSQUEDA_ENCABEZADO: usize = 40;
pub const MIN_COINCIDENCIAS_ENCABEZADO: usize = 2;

const COL_NOMBRE: [&str; 3] = ["Articulo", "Artículo", "Nombre"];
const COL_CODIGO: [&str; 3] = ["Codigo", "Código", "Cod"];
const COL_UNIDADES: [&str; 5] = ["Unid. Totales", "Unid Totales", "Unidades totales", "Unidades", "Total"];
const COL_MEDIDA: [&str; 3] = ["Medida", "Unidad_de_Medida", "Unidad"];
const COL_EMBALAJE: [&str; 3] = ["Embalaje", "Packaging", "Envase"];

/// Fichero del maestro que no se pudo usar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FicheroOmitido {
    pub fichero: PathBuf,
    pub motivo: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MaestroProductos {
    pub entradas: Vec<EntradaMaestro>,
    pub omitidos: Vec<FicheroOmitido>,
}

impl MaestroProductos {
    /// Índice por código normalizado (trim + mayúsculas). Si un código se
    /// repite gana la última entrada.
    pub fn por_codigo(&self) -> HashMap<String, &EntradaMaestro> {
        self.entradas.iter().map(|e| (normalizar_codigo(&e.codigo), e)).collect()
    }
}

pub fn normalizar_codigo(codigo: &str) -> String {
    codigo.trim().to_uppercase()
}

/// Primera fila (entre las 40 iniciales) con al menos dos palabras clave.
pub fn detectar_fila_encabezado(filas: &[Vec<String>]) -> Option<usize> {
    filas.iter().take(FILAS_BUSQUEDA_ENCABEZADO).position(|fila| {
        let celdas: Vec<String> = fila.iter().map(|c| c.trim().to_lowercase()).collect();
        let coincidencias = PALABRAS_ENCABEZADO
            .iter()
            .filter(|kw| celdas.iter().any(|c| c.contains(*kw)))
            .count();
        coincidencias >= MIN_COINCIDENCIAS_ENCABEZADO
    })
}

/// Columna cuyo encabezado coincide con algún candidato: primero igualdad
/// (sin mayúsculas), después inclusión en cualquier sentido.
pub fn buscar_columna(encabezados: &[String], candidatos: &[&str]) -> Option<usize> {
    let lower: Vec<String> = encabezados.iter().map(|h| h.trim().to_lowercase()).collect();
    for cand in candidatos {
        let c = cand.to_lowercase();
        if let Some(i) = lower.iter().position(|h| *h == c) {
            return Some(i);
        }
    }
    for cand in candidatos {
        let c = cand.to_lowercase();
        if let Some(i) = lower.iter().position(|h| !h.is_empty() && (h.contains(&c) || c.contains(h.as_str()))) {
            return Some(i);
        }
    }
    None
}

/// `total / embalaje`, entero si está a menos de 1e-8 de uno y si no
/// redondeado a 4 decimales.
pub fn unidades_por_embalaje(total: Option<f64>, embalaje: Option<f64>) -> Option<f64> {
    let (u, e) = (total?, embalaje?);
    if e == 0.0 {
        return None;
    }
    let val = u / e;
    if (val - val.round()).abs() < 1e-8 {
        Some(val.round())
    } else {
        Some((val * 10_000.0).round() / 10_000.0)
    }
}

struct Columnas {
    nombre: Option<usize>,
    codigo: Option<usize>,
    unidades: Option<usize>,
    medida: Option<usize>,
    embalaje: Option<usize>,
}

fn celda(fila: &[String], idx: Option<usize>) -> String {
    idx.and_then(|i| fila.get(i)).map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Entradas del maestro a partir de las filas de una hoja. `None` si no hay
/// encabezado reconocible.
pub fn entradas_desde_filas(filas: &[Vec<String>], categoria: Categoria, origen: &str) -> Option<Vec<EntradaMaestro>> {
    let fila_enc = detectar_fila_encabezado(filas)?;
    let encabezados = &filas[fila_enc];
    let cols = Columnas {
        nombre: buscar_columna(encabezados, &COL_NOMBRE),
        codigo: buscar_columna(encabezados, &COL_CODIGO),
        unidades: buscar_columna(encabezados, &COL_UNIDADES),
        medida: buscar_columna(encabezados, &COL_MEDIDA),
        embalaje: buscar_columna(encabezados, &COL_EMBALAJE),
    };

    let datos = &filas[fila_enc + 1..];
    let mut out = Vec::new();
    let mut i = 0;
    while i < datos.len() {
        let fila = &datos[i];
        let nombre = celda(fila, cols.nombre);
        let codigo = celda(fila, cols.codigo);

        // producto partido en dos filas: nombre arriba, datos abajo
        let companera = if codigo.is_empty() && !nombre.is_empty() {
            datos.get(i + 1).filter(|sig| !celda(sig, cols.codigo).is_empty() || !celda(sig, cols.unidades).is_empty())
        } else {
            None
        };
        let (datos_fila, paso) = match companera {
            Some(sig) => (sig, 2),
            None => (fila, 1),
        };

        let codigo = celda(datos_fila, cols.codigo);
        if !codigo.is_empty() {
            let unidades_totales = parse_numero(&celda(datos_fila, cols.unidades));
            let embalaje = parse_numero(&celda(datos_fila, cols.embalaje));
            let medida = Some(celda(datos_fila, cols.medida)).filter(|m| !m.is_empty());
            out.push(EntradaMaestro {
                codigo,
                nombre,
                unidades_totales,
                medida,
                embalaje,
                unidades_por_embalaje: unidades_por_embalaje(unidades_totales, embalaje),
                categoria,
                origen: origen.to_string(),
            });
        }
        i += paso;
    }
    Some(out)
}

fn cargar_fichero(path: &Path, categoria: Categoria) -> std::result::Result<Vec<EntradaMaestro>, String> {
    let filas = leer_hoja(path, "").map_err(|e| e.to_string())?;
    entradas_desde_filas(&filas, categoria, &nombre_de(path))
        .ok_or_else(|| "no se encontró fila de encabezado".to_string())
}

/// Carga el maestro completo de las tres carpetas de categoría.
pub fn cargar_maestro(rutas: &Rutas) -> Result<MaestroProductos> {
    let mut maestro = MaestroProductos::default();
    for categoria in Categoria::TODAS {
        let dir = rutas.carpeta_maestro(categoria);
        if !dir.is_dir() {
            debug!("carpeta de maestro {:?} no existe", dir);
            continue;
        }
        for f in listar_ficheros(&dir, &["xls", "xlsx"])? {
            match cargar_fichero(&f, categoria) {
                Ok(entradas) => {
                    debug!("maestro {:?}: {} productos", f, entradas.len());
                    maestro.entradas.extend(entradas);
                }
                Err(motivo) => {
                    warn!("⚠️ maestro {:?} omitido: {}", f, motivo);
                    maestro.omitidos.push(FicheroOmitido { fichero: f, motivo });
                }
            }
        }
    }
    info!("📦 maestro: {} productos, {} ficheros omitidos", maestro.entradas.len(), maestro.omitidos.len());
    Ok(maestro)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filas(v: &[&[&str]]) -> Vec<Vec<String>> {
        v.iter().map(|r| r.iter().map(|s| s.to_string()).collect()).collect()
    }

    #[test]
    fn test_detectar_encabezado_umbral() {
        let f = filas(&[
            &["Listado de productos", "", ""],
            &["Código", "", ""],
            &["Código", "Artículo", "Unid. Totales"],
        ]);
        assert_eq!(detectar_fila_encabezado(&f), Some(2));
        // una sola palabra clave no basta
        assert_eq!(detectar_fila_encabezado(&filas(&[&["Código", "x"]])), None);
    }

    #[test]
    fn test_buscar_columna_exacta_y_parcial() {
        let enc: Vec<String> = ["", "Cod. Artículo", "Nombre", "Unidades totales (uds)"].iter().map(|s| s.to_string()).collect();
        assert_eq!(buscar_columna(&enc, &COL_NOMBRE), Some(2));
        assert_eq!(buscar_columna(&enc, &COL_CODIGO), Some(1));
        assert_eq!(buscar_columna(&enc, &COL_UNIDADES), Some(3));
        assert_eq!(buscar_columna(&enc, &COL_EMBALAJE), None);
    }

    #[test]
    fn test_fusion_dos_filas_y_unidades_por_embalaje() {
        let f = filas(&[
            &["Codigo", "Nombre", "Unid. Totales", "Medida", "Embalaje"],
            &["", "Masa fina", "", "", ""],
            &["BF", "", "24", "Bola", "4"],
            &["GAMBC", "Gamba cocida", "10", "Kilogramo", "3"],
            &["", "", "", "", ""],
        ]);
        let e = entradas_desde_filas(&f, Categoria::Congelado, "congelados.xlsx").unwrap();
        assert_eq!(e.len(), 2);
        assert_eq!(e[0].codigo, "BF");
        assert_eq!(e[0].nombre, "Masa fina");
        assert_eq!(e[0].unidades_por_embalaje, Some(6.0));
        assert_eq!(e[1].unidades_por_embalaje, Some(3.3333));
        assert_eq!(e[1].categoria, Categoria::Congelado);
    }

    #[test]
    fn test_unidades_por_embalaje_cero() {
        assert_eq!(unidades_por_embalaje(Some(10.0), Some(0.0)), None);
        assert_eq!(unidades_por_embalaje(None, Some(2.0)), None);
    }
}
