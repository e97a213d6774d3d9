use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};

use crate::error::{PedidoError, Result};

/// Convierte un `Data` de calamine a String (versión genérica para celdas)
pub fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if (f.floor() - f).abs() < f64::EPSILON {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Int(i) => format!("{}", i),
        Data::Bool(b) => format!("{}", b),
        Data::Empty => String::new(),
        Data::Error(_) => String::new(),
        Data::DateTime(s) => s.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Minúsculas sin tildes y con espacios colapsados ("Artículo " -> "articulo").
pub fn normalize_name(s: &str) -> String {
    let mut out = String::new();
    for ch in s.chars() {
        let c = match ch {
            'Á' | 'À' | 'Ä' | 'Â' | 'á' | 'à' | 'ä' | 'â' => 'a',
            'É' | 'È' | 'Ë' | 'Ê' | 'é' | 'è' | 'ë' | 'ê' => 'e',
            'Í' | 'Ì' | 'Ï' | 'Î' | 'í' | 'ì' | 'ï' | 'î' => 'i',
            'Ó' | 'Ò' | 'Ö' | 'Ô' | 'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'Ú' | 'Ù' | 'Ü' | 'Û' | 'ú' | 'ù' | 'ü' | 'û' => 'u',
            'Ñ' | 'ñ' => 'n',
            other => other,
        };
        out.extend(c.to_lowercase());
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lee la primera hoja (o `sheet_name` si existe) y la devuelve como celdas crudas.
pub fn leer_hoja_datos<P: AsRef<Path>>(path: P, sheet_name: &str) -> Result<Vec<Vec<Data>>> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)?;

    // Preferir la hoja con el nombre solicitado; si no existe, tomar la primera
    let names = workbook.sheet_names().to_owned();
    let sheet_to_use = names
        .iter()
        .find(|s| !sheet_name.is_empty() && *s == sheet_name)
        .or_else(|| names.first())
        .cloned()
        .ok_or_else(|| PedidoError::SinHojas(path.to_path_buf()))?;

    let range = workbook.worksheet_range(&sheet_to_use)?;
    Ok(range.rows().map(|r| r.to_vec()).collect())
}

/// Igual que `leer_hoja_datos` pero con cada celda convertida a texto.
pub fn leer_hoja<P: AsRef<Path>>(path: P, sheet_name: &str) -> Result<Vec<Vec<String>>> {
    let rows = leer_hoja_datos(path, sheet_name)?;
    Ok(rows
        .iter()
        .map(|r| r.iter().map(cell_to_string).collect())
        .collect())
}

/// Parseo numérico único para todo el crate.
///
/// Acepta coma o punto como separador decimal. Si aparecen ambos, el que
/// está más a la derecha es el decimal y el otro se descarta como separador de
/// miles; si un mismo separador aparece varias veces se trata como de miles.
/// Se eliminan comillas, espacios y símbolos de moneda o porcentaje.
pub fn parse_numero(raw: &str) -> Option<f64> {
    let limpio: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+'))
        .collect();
    if limpio.is_empty() || !limpio.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let ultima_coma = limpio.rfind(',');
    let ultimo_punto = limpio.rfind('.');
    let normalizado = match (ultima_coma, ultimo_punto) {
        (Some(c), Some(p)) if c > p => limpio.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => limpio.replace(',', ""),
        (Some(_), None) => {
            if limpio.matches(',').count() == 1 {
                limpio.replace(',', ".")
            } else {
                limpio.replace(',', "")
            }
        }
        (None, Some(_)) => {
            if limpio.matches('.').count() == 1 {
                limpio
            } else {
                limpio.replace('.', "")
            }
        }
        (None, None) => limpio,
    };

    normalizado.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Valor numérico de una celda de hoja de cálculo.
pub fn numero_desde_celda(c: &Data) -> Option<f64> {
    match c {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => parse_numero(s),
        _ => None,
    }
}

const MESES: [(&str, u32); 13] = [
    ("enero", 1),
    ("febrero", 2),
    ("marzo", 3),
    ("abril", 4),
    ("mayo", 5),
    ("junio", 6),
    ("julio", 7),
    ("agosto", 8),
    ("septiembre", 9),
    ("setiembre", 9),
    ("octubre", 10),
    ("noviembre", 11),
    ("diciembre", 12),
];

fn mes_por_nombre(nombre: &str) -> Option<u32> {
    let n = normalize_name(nombre);
    MESES.iter().find(|(m, _)| *m == n).map(|(_, num)| *num)
}

/// Fecha numérica con día primero (`27/01/2026`, `27-01-26`, `27.01.2026`)
/// o ISO (`2026-01-27`). Años de dos dígitos se interpretan como 20YY.
fn parse_fecha_numerica(token: &str) -> Option<NaiveDate> {
    let partes: Vec<&str> = token.split(['/', '-', '.']).collect();
    if partes.len() != 3 || partes.iter().any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }
    let nums: Vec<u32> = partes.iter().filter_map(|p| p.parse::<u32>().ok()).collect();
    if nums.len() != 3 {
        return None;
    }
    if partes[0].len() == 4 {
        return NaiveDate::from_ymd_opt(nums[0] as i32, nums[1], nums[2]);
    }
    let anio = match partes[2].len() {
        2 => 2000 + nums[2] as i32,
        4 => nums[2] as i32,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(anio, nums[1], nums[0])
}

/// Fecha escrita como texto libre. Soporta formatos numéricos (con hora
/// opcional) y la forma larga en castellano: "27 enero 2026",
/// "martes, 27 de enero de 2026".
pub fn parse_fecha_texto(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim().trim_matches(|c| c == '\'' || c == '"').trim();
    if s.is_empty() {
        return None;
    }

    // fecha numérica, con o sin hora detrás
    if let Some(primero) = s.split(|c: char| c.is_whitespace() || c == 'T').next() {
        if let Some(f) = parse_fecha_numerica(primero) {
            return Some(f);
        }
    }

    // forma larga: buscar (día, mes, año) consecutivos ignorando "de"
    let tokens: Vec<String> = s
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty() && t != "de" && t != "del")
        .collect();
    for w in tokens.windows(3) {
        let dia = match w[0].parse::<u32>() {
            Ok(d) if w[0].len() <= 2 => d,
            _ => continue,
        };
        let Some(mes) = mes_por_nombre(&w[1]) else { continue };
        let anio = match w[2].parse::<i32>() {
            Ok(a) if w[2].len() == 4 => a,
            _ => continue,
        };
        if let Some(f) = NaiveDate::from_ymd_opt(anio, mes, dia) {
            return Some(f);
        }
    }
    None
}

/// Número de serie de Excel (días desde 1899-12-30) a fecha.
pub fn fecha_desde_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > 2_958_465.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Fecha contenida en una celda: serial de Excel, ISO o texto libre.
pub fn fecha_desde_celda(c: &Data) -> Option<NaiveDate> {
    match c {
        Data::DateTime(dt) => fecha_desde_serial(dt.as_f64()),
        Data::DateTimeIso(s) => parse_fecha_texto(s),
        Data::Float(f) => fecha_desde_serial(*f),
        Data::Int(i) => fecha_desde_serial(*i as f64),
        Data::String(s) => parse_fecha_texto(s),
        _ => None,
    }
}
