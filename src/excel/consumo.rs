//! CSVs de consumo teórico (`Codigo, Articulo, Unidad_de_Medida, Consumo`) e
//! inventario real (`Codigo, Articulo, Unidad_de_Medida, Real`).

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{PedidoError, Result};
use crate::excel::io::parse_numero;
use crate::models::{ConsumoProducto, RegistroInventario};

const COLUMNAS_ID: [&str; 3] = ["Codigo", "Articulo", "Unidad_de_Medida"];

/// Lee un fichero como texto: UTF-8 (sin BOM) y, si no lo es, latin-1.
fn leer_texto(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    let sin_bom = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF][..]).unwrap_or(&bytes);
    match std::str::from_utf8(sin_bom) {
        Ok(s) => Ok(s.to_string()),
        Err(_) => {
            debug!("{:?} no es UTF-8, se lee como latin-1", path);
            Ok(sin_bom.iter().map(|&b| b as char).collect())
        }
    }
}

/// Tabla CSV cruda: encabezados y filas.
struct TablaCsv {
    headers: Vec<String>,
    filas: Vec<csv::StringRecord>,
}

impl TablaCsv {
    fn leer(path: &Path) -> Result<Self> {
        let texto = leer_texto(path)?;
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(texto.as_bytes());
        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut filas = Vec::new();
        for rec in rdr.records() {
            match rec {
                Ok(r) => filas.push(r),
                Err(e) => warn!("fila ilegible en {:?}: {}", path, e),
            }
        }
        Ok(TablaCsv { headers, filas })
    }

    fn indice(&self, nombre: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == nombre)
    }

    fn texto(rec: &csv::StringRecord, idx: Option<usize>) -> String {
        idx.and_then(|i| rec.get(i))
            .map(|s| s.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
            .unwrap_or_default()
    }

    fn numero(rec: &csv::StringRecord, idx: Option<usize>) -> f64 {
        idx.and_then(|i| rec.get(i)).and_then(parse_numero).unwrap_or(0.0)
    }
}

/// Columna de consumo: `Consumo` si existe, si no la última columna que no
/// sea identificador.
pub fn columna_consumo(headers: &[String]) -> Option<usize> {
    headers.iter().position(|h| h == "Consumo").or_else(|| {
        headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !COLUMNAS_ID.contains(&h.as_str()))
            .map(|(i, _)| i)
            .last()
    })
}

/// Lee un fichero de consumo. Valores no numéricos cuentan como 0; un
/// fichero sin `Codigo` o sin columna de consumo es un error.
pub fn leer_consumo(path: &Path) -> Result<Vec<ConsumoProducto>> {
    let tabla = TablaCsv::leer(path)?;
    let idx_codigo = tabla.indice("Codigo").ok_or_else(|| PedidoError::ColumnaNoEncontrada {
        fichero: path.to_path_buf(),
        columna: "Codigo".to_string(),
    })?;
    let idx_consumo = columna_consumo(&tabla.headers).ok_or_else(|| PedidoError::ColumnaNoEncontrada {
        fichero: path.to_path_buf(),
        columna: "Consumo".to_string(),
    })?;
    let idx_articulo = tabla.indice("Articulo");
    let idx_unidad = tabla.indice("Unidad_de_Medida");

    Ok(tabla
        .filas
        .iter()
        .map(|rec| ConsumoProducto {
            codigo: TablaCsv::texto(rec, Some(idx_codigo)),
            articulo: TablaCsv::texto(rec, idx_articulo),
            unidad: TablaCsv::texto(rec, idx_unidad),
            consumo: TablaCsv::numero(rec, Some(idx_consumo)),
        })
        .filter(|c| !c.codigo.is_empty())
        .collect())
}

/// Lee `inventario_real.csv`. Fichero ausente -> inventario vacío; sin
/// columna `Real` todas las existencias valen 0.
pub fn leer_inventario(path: &Path) -> Result<Vec<RegistroInventario>> {
    if !path.is_file() {
        debug!("sin inventario en {:?}", path);
        return Ok(Vec::new());
    }
    let tabla = TablaCsv::leer(path)?;
    let idx_codigo = tabla.indice("Codigo").ok_or_else(|| PedidoError::ColumnaNoEncontrada {
        fichero: path.to_path_buf(),
        columna: "Codigo".to_string(),
    })?;
    let idx_real = tabla.indice("Real");
    if idx_real.is_none() {
        warn!("{:?} no tiene columna 'Real': existencias a 0", path);
    }
    let idx_articulo = tabla.indice("Articulo");
    let idx_unidad = tabla.indice("Unidad_de_Medida");

    Ok(tabla
        .filas
        .iter()
        .map(|rec| RegistroInventario {
            codigo: TablaCsv::texto(rec, Some(idx_codigo)),
            articulo: TablaCsv::texto(rec, idx_articulo),
            unidad: TablaCsv::texto(rec, idx_unidad),
            real: TablaCsv::numero(rec, idx_real),
        })
        .filter(|r| !r.codigo.is_empty())
        .collect())
}

#[derive(Serialize)]
struct FilaConsumoCsv<'a> {
    #[serde(rename = "Codigo")]
    codigo: &'a str,
    #[serde(rename = "Articulo")]
    articulo: &'a str,
    #[serde(rename = "Unidad_de_Medida")]
    unidad: &'a str,
    #[serde(rename = "Consumo")]
    consumo: f64,
}

#[derive(Serialize)]
struct FilaInventarioCsv<'a> {
    #[serde(rename = "Codigo")]
    codigo: &'a str,
    #[serde(rename = "Articulo")]
    articulo: &'a str,
    #[serde(rename = "Unidad_de_Medida")]
    unidad: &'a str,
    #[serde(rename = "Real")]
    real: f64,
}

/// Borra el destino si existe y crea el directorio padre.
fn preparar_destino(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}

/// Escribe un CSV de consumo reemplazando el fichero anterior.
pub fn escribir_consumo(path: &Path, filas: &[ConsumoProducto]) -> Result<()> {
    preparar_destino(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    if filas.is_empty() {
        wtr.write_record(["Codigo", "Articulo", "Unidad_de_Medida", "Consumo"])?;
    }
    for f in filas {
        wtr.serialize(FilaConsumoCsv {
            codigo: &f.codigo,
            articulo: &f.articulo,
            unidad: &f.unidad,
            consumo: f.consumo,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Escribe `inventario_real.csv` reemplazando el fichero anterior.
pub fn escribir_inventario(path: &Path, filas: &[RegistroInventario]) -> Result<()> {
    preparar_destino(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    if filas.is_empty() {
        wtr.write_record(["Codigo", "Articulo", "Unidad_de_Medida", "Real"])?;
    }
    for f in filas {
        wtr.serialize(FilaInventarioCsv {
            codigo: &f.codigo,
            articulo: &f.articulo,
            unidad: &f.unidad,
            real: f.real,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn tmp_dir(nombre: &str) -> PathBuf {
        let d = std::env::temp_dir().join(format!("pedido_consumo_{}_{}", nombre, std::process::id()));
        let _ = fs::remove_dir_all(&d);
        fs::create_dir_all(&d).unwrap();
        d
    }

    #[test]
    fn test_columna_consumo_fallback() {
        let h = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(columna_consumo(&h(&["Codigo", "Articulo", "Unidad_de_Medida", "Consumo"])), Some(3));
        assert_eq!(columna_consumo(&h(&["Codigo", "Articulo", "Col_1", "Col_2", "Unidad_de_Medida"])), Some(3));
        assert_eq!(columna_consumo(&h(&["Codigo", "Articulo", "Unidad_de_Medida"])), None);
    }

    #[test]
    fn test_escribir_y_leer_consumo_con_coma_decimal() {
        let dir = tmp_dir("coma");
        let p = dir.join("05-02-26.csv");
        fs::write(&p, "Codigo,Articulo,Unidad_de_Medida,Consumo\nBF,Masa fina,Bola,\"12,5\"\nX1,Otro,Kilogramo,abc\n").unwrap();
        let filas = leer_consumo(&p).unwrap();
        assert_eq!(filas.len(), 2);
        assert_eq!(filas[0].consumo, 12.5);
        assert_eq!(filas[1].consumo, 0.0);

        // reescritura: reemplaza el contenido
        escribir_consumo(&p, &filas[..1]).unwrap();
        let otra = leer_consumo(&p).unwrap();
        assert_eq!(otra.len(), 1);
        assert_eq!(otra[0].codigo, "BF");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_inventario_ausente_y_sin_real() {
        let dir = tmp_dir("inv");
        assert!(leer_inventario(&dir.join("no_existe.csv")).unwrap().is_empty());

        let p = dir.join("inventario_real.csv");
        fs::write(&p, "Codigo,Articulo,Unidad_de_Medida\nBF,Masa,Bola\n").unwrap();
        let inv = leer_inventario(&p).unwrap();
        assert_eq!(inv.len(), 1);
        assert_eq!(inv[0].real, 0.0);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_latin1() {
        let dir = tmp_dir("latin1");
        let p = dir.join("inv.csv");
        let mut bytes = b"Codigo,Articulo,Unidad_de_Medida,Real\nA1,Az".to_vec();
        bytes.push(0xFA); // 'ú' en latin-1
        bytes.extend_from_slice(b"car,Kilogramo,3\n");
        fs::write(&p, bytes).unwrap();
        let inv = leer_inventario(&p).unwrap();
        assert_eq!(inv[0].articulo, "Azúcar");
        assert_eq!(inv[0].real, 3.0);
        let _ = fs::remove_dir_all(&dir);
    }
}
