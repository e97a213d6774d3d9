//! Carga del libro de ventas: ventas reales (`venta.xlsx`) y estimadas
//! (carpeta `venta_estimada/` con CSVs de formato libre).

use std::collections::HashMap;
use std::path::Path;

use calamine::Data;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::excel::io::{cell_to_string, fecha_desde_celda, leer_hoja_datos, numero_desde_celda, parse_fecha_texto, parse_numero};
use crate::excel::{listar_ficheros, Rutas};
use crate::models::LibroVentas;

/// Lee `venta.xlsx` (columnas `fecha` y `ventas`). Las filas sin fecha
/// parseable se descartan y las fechas repetidas se suman. Si el fichero no
/// existe se devuelve un mapa vacío.
pub fn leer_ventas_reales(rutas: &Rutas) -> Result<HashMap<NaiveDate, f64>> {
    let path = &rutas.venta_real;
    if !path.is_file() {
        debug!("sin ventas reales: {:?} no existe", path);
        return Ok(HashMap::new());
    }
    let rows = leer_hoja_datos(path, "")?;
    Ok(ventas_reales_desde_filas(&rows))
}

/// Agregación de ventas reales a partir de las filas crudas de la hoja
/// (fila 0 = encabezados).
pub fn ventas_reales_desde_filas(rows: &[Vec<Data>]) -> HashMap<NaiveDate, f64> {
    let mut ventas: HashMap<NaiveDate, f64> = HashMap::new();
    let Some(header) = rows.first() else { return ventas };

    let headers: Vec<String> = header.iter().map(|c| cell_to_string(c).trim().to_lowercase()).collect();
    let idx_fecha = headers.iter().position(|h| h == "fecha");
    let idx_ventas = headers.iter().position(|h| h == "ventas");
    let (Some(idx_fecha), Some(idx_ventas)) = (idx_fecha, idx_ventas) else {
        warn!("venta.xlsx sin columnas 'fecha'/'ventas' (encabezados: {:?})", headers);
        return ventas;
    };

    let mut descartadas = 0usize;
    for row in rows.iter().skip(1) {
        let fecha = row.get(idx_fecha).and_then(fecha_desde_celda);
        let valor = row.get(idx_ventas).and_then(numero_desde_celda);
        match (fecha, valor) {
            (Some(f), Some(v)) => *ventas.entry(f).or_insert(0.0) += v,
            (Some(f), None) => {
                ventas.entry(f).or_insert(0.0);
            }
            _ => descartadas += 1,
        }
    }
    if descartadas > 0 {
        debug!("ventas reales: {} filas sin fecha descartadas", descartadas);
    }
    ventas
}

/// Lee todos los `*.csv` de `venta_estimada/` en orden de nombre. Un fichero
/// ilegible o una fila mal formada se saltan; si dos ficheros traen la misma
/// fecha gana el último.
pub fn leer_ventas_estimadas(rutas: &Rutas) -> Result<HashMap<NaiveDate, f64>> {
    let mut mapping: HashMap<NaiveDate, f64> = HashMap::new();
    let dir = &rutas.venta_estimada;
    if !dir.is_dir() {
        debug!("sin ventas estimadas: {:?} no existe", dir);
        return Ok(mapping);
    }

    for f in listar_ficheros(dir, &["csv"])? {
        match leer_csv_estimado(&f) {
            Ok(parcial) => {
                debug!("venta estimada {:?}: {} fechas", f, parcial.len());
                mapping.extend(parcial);
            }
            Err(e) => warn!("no se pudo leer venta estimada {:?}: {}", f, e),
        }
    }
    Ok(mapping)
}

/// Índices (fecha, valor) detectados por encabezado en un CSV de estimación.
pub fn detectar_columnas_estimadas(headers: &[String]) -> Option<(usize, usize)> {
    if headers.is_empty() {
        return None;
    }
    let lower: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

    let idx_fecha = lower
        .iter()
        .position(|h| h.contains("fecha") || h.contains("date"))
        .unwrap_or(0);

    let idx_valor = lower
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != idx_fecha)
        .find(|(_, h)| h.contains("estim"))
        .or_else(|| {
            lower.iter().enumerate().filter(|(i, _)| *i != idx_fecha).find(|(_, h)| {
                h.contains("venta") || h.contains("sale") || h.contains("valor") || h.contains("value")
            })
        })
        .map(|(i, _)| i)
        .unwrap_or(if headers.len() > 1 { 1 } else { 0 });

    Some((idx_fecha, idx_valor))
}

fn leer_csv_estimado(path: &Path) -> Result<HashMap<NaiveDate, f64>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let mut out = HashMap::new();
    let Some((idx_fecha, idx_valor)) = detectar_columnas_estimadas(&headers) else {
        return Ok(out);
    };

    for record in rdr.records() {
        let Ok(record) = record else { continue };
        let Some(fecha) = record.get(idx_fecha).and_then(parse_fecha_texto) else { continue };
        let Some(valor) = record.get(idx_valor).and_then(parse_numero) else { continue };
        out.insert(fecha, valor);
    }
    Ok(out)
}

/// Construye el libro completo (reales + estimadas).
pub fn cargar_libro_ventas(rutas: &Rutas) -> Result<LibroVentas> {
    let libro = LibroVentas::new(leer_ventas_reales(rutas)?, leer_ventas_estimadas(rutas)?);
    info!("📒 libro de ventas: {} días reales, {} estimados", libro.num_reales(), libro.num_estimadas());
    Ok(libro)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, dd: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, dd).unwrap()
    }

    #[test]
    fn test_ventas_reales_suma_y_descarta() {
        let rows = vec![
            vec![Data::String("Fecha".into()), Data::String("Ventas".into())],
            vec![Data::String("01/02/2026".into()), Data::Float(100.0)],
            vec![Data::String("01/02/2026".into()), Data::Float(50.5)],
            vec![Data::String("no es fecha".into()), Data::Float(999.0)],
            vec![Data::Float(46055.0), Data::Int(20)],
        ];
        let m = ventas_reales_desde_filas(&rows);
        assert_eq!(m.get(&d(2026, 2, 1)), Some(&150.5));
        // 46055 -> 2026-02-02
        assert_eq!(m.get(&d(2026, 2, 2)), Some(&20.0));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_detectar_columnas_estimadas() {
        let h = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(detectar_columnas_estimadas(&h(&["Dia", "Fecha", "Venta estimada"])), Some((1, 2)));
        assert_eq!(detectar_columnas_estimadas(&h(&["date", "valor"])), Some((0, 1)));
        // sin pistas: primera columna fecha, segunda valor
        assert_eq!(detectar_columnas_estimadas(&h(&["a", "b", "c"])), Some((0, 1)));
        assert_eq!(detectar_columnas_estimadas(&h(&["solo"])), Some((0, 0)));
        assert_eq!(detectar_columnas_estimadas(&[]), None);
    }
}
