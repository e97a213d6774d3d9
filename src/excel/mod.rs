//! Módulo `excel`: todo lo que toca ficheros en disco.
//!
//! Submódulos:
//! - `io`: helpers de lectura de hojas, parseo de números y fechas
//! - `ventas`: libro de ventas reales y estimadas
//! - `consumo`: CSVs de consumo teórico e inventario real
//! - `maestro`: maestro de productos por categoría (congelado / fresco / seco)
//! - `extractor`: extracción de la tabla de productos de un informe `.xls`
//! - `conversion`: conversiones en lote de informes a CSV

/// Helpers de IO y utilidades para parsing de Excel
mod io;

/// Libro de ventas: `cargar_libro_ventas`
pub mod ventas;

/// Lectura/escritura de consumos e inventario
pub mod consumo;

/// Maestro de productos: `cargar_maestro`
pub mod maestro;

/// Extractor de tablas de producto (trait + implementación calamine)
pub mod extractor;

/// Conversiones en lote: diarios, bulk e inventario
pub mod conversion;

pub use io::{
    cell_to_string, fecha_desde_celda, fecha_desde_serial, leer_hoja, leer_hoja_datos, normalize_name,
    numero_desde_celda, parse_fecha_texto, parse_numero,
};
pub use ventas::{cargar_libro_ventas, leer_ventas_estimadas, leer_ventas_reales};
pub use consumo::{escribir_consumo, escribir_inventario, leer_consumo, leer_inventario};
pub use maestro::{cargar_maestro, MaestroProductos};
pub use extractor::{ExtractorCalamine, ExtractorTabla, FilaProducto, TablaExtraida};
pub use conversion::{convertir_bulk, convertir_diarios, convertir_inventario, EstadoConversion, ResultadoConversion};

use std::path::{Path, PathBuf};

use crate::models::Categoria;

/// Disposición fija de ficheros bajo el directorio base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rutas {
    pub base: PathBuf,
    /// Ventas reales (`venta.xlsx`)
    pub venta_real: PathBuf,
    /// Carpeta con CSVs de venta estimada
    pub venta_estimada: PathBuf,
    /// Catálogo de consumos ya convertidos (`DD-MM-YY.csv`, `DD-MM-YY_DD-MM-YY.csv`)
    pub consumo_teorico: PathBuf,
    /// Snapshot de inventario (`inventario_actual/inventario_real.csv`)
    pub inventario_real: PathBuf,
    /// Informe de inventario sin convertir
    pub inventario_actual_xls: PathBuf,
    pub ficheros_a_convertir: PathBuf,
    pub ficheros_a_convertir_bulk: PathBuf,
}

impl Rutas {
    pub fn new<P: AsRef<Path>>(base: P) -> Self {
        let base = base.as_ref().to_path_buf();
        Rutas {
            venta_real: base.join("venta.xlsx"),
            venta_estimada: base.join("venta_estimada"),
            consumo_teorico: base.join("consumo_teorico"),
            inventario_real: base.join("inventario_actual").join("inventario_real.csv"),
            inventario_actual_xls: base.join("inventario_actual.xls"),
            ficheros_a_convertir: base.join("ficheros_a_convertir"),
            ficheros_a_convertir_bulk: base.join("ficheros_a_convertir_bulk"),
            base,
        }
    }

    /// Carpeta del maestro de una categoría (`congelado/`, `fresco/`, `seco/`).
    pub fn carpeta_maestro(&self, categoria: Categoria) -> PathBuf {
        self.base.join(categoria.carpeta())
    }
}

/// Ficheros de un directorio con alguna de las extensiones dadas, ordenados
/// por nombre. Ignora ocultos y temporales de editor (`~$x.xlsx`, `x~`).
pub fn listar_ficheros(dir: &Path, extensiones: &[&str]) -> std::io::Result<Vec<PathBuf>> {
    let mut out: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir)?.flatten() {
        let p = entry.path();
        if !p.is_file() {
            continue;
        }
        let Some(name) = p.file_name().and_then(|s| s.to_str()) else { continue };
        if name.starts_with('.') || name.starts_with('~') || name.ends_with('~') {
            continue;
        }
        if extensiones.iter().any(|ext| tiene_extension(&p, ext)) {
            out.push(p);
        }
    }
    out.sort();
    Ok(out)
}

/// Extensión sin distinguir mayúsculas (`XLSX` cuenta como `xlsx`).
pub(crate) fn tiene_extension(p: &Path, ext: &str) -> bool {
    p.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Nombre de fichero como String (vacío si no es UTF-8).
pub(crate) fn nombre_de(p: &Path) -> String {
    p.file_name().and_then(|s| s.to_str()).unwrap_or_default().to_string()
}
