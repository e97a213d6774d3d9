use chrono::NaiveDate;
use pedido_camion::algorithm::{escanear_catalogo, resumir_rango_desde_disco};
use pedido_camion::error::{PedidoError, Result};
use pedido_camion::excel::extractor::FilaProducto;
use pedido_camion::excel::{
    cargar_libro_ventas, convertir_bulk, convertir_diarios, convertir_inventario, leer_consumo, leer_inventario,
    EstadoConversion, ExtractorTabla, Rutas, TablaExtraida,
};
use pedido_camion::models::{Cobertura, FuenteDia};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

fn d(y: i32, m: u32, dd: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, dd).unwrap()
}

fn base_temporal(nombre: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pedido_camion_ficheros_{}_{}", nombre, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_ventas_estimadas_el_ultimo_fichero_gana() {
    let rutas = Rutas::new(base_temporal("estimadas"));
    fs::create_dir_all(&rutas.venta_estimada).unwrap();
    fs::write(rutas.venta_estimada.join("a.csv"), "Fecha,Estimacion\n01/02/2026,100\n02/02/2026,\"1.200,50\"\n").unwrap();
    fs::write(rutas.venta_estimada.join("b.csv"), "date,sales\n2026-02-01,150\nbasura,7\n").unwrap();

    let libro = cargar_libro_ventas(&rutas).unwrap();
    assert_eq!(libro.num_estimadas(), 2);
    assert_eq!(libro.valor(d(2026, 2, 1)), 150.0);
    assert_eq!(libro.valor(d(2026, 2, 2)), 1_200.5);

    let resumen = resumir_rango_desde_disco(&rutas, d(2026, 2, 1), d(2026, 2, 3)).unwrap();
    assert_eq!(resumen.total, 1_350.5);
    assert_eq!(resumen.por_dia[2].fuente, FuenteDia::Faltante);

    let _ = fs::remove_dir_all(&rutas.base);
}

#[test]
fn test_catalogo_desde_disco() {
    let rutas = Rutas::new(base_temporal("catalogo"));
    fs::create_dir_all(&rutas.venta_estimada).unwrap();
    fs::write(rutas.venta_estimada.join("e.csv"), "fecha,venta\n2026-02-05,300\n2026-02-06,200\n").unwrap();
    fs::create_dir_all(&rutas.consumo_teorico).unwrap();
    for nombre in ["06-02-26_05-02-26.csv", "05-02-26.csv", "5-2-26.csv", "resumen.xlsx", "~05-02-26.csv"] {
        fs::write(rutas.consumo_teorico.join(nombre), "Codigo,Consumo\nA,1\n").unwrap();
    }

    let libro = cargar_libro_ventas(&rutas).unwrap();
    let c = escanear_catalogo(&rutas.consumo_teorico, &libro).unwrap();
    let nombres: Vec<&str> = c.iter().map(|f| f.nombre.as_str()).collect();
    assert_eq!(nombres, vec!["05-02-26.csv", "06-02-26_05-02-26.csv"]);
    assert_eq!(c[1].cobertura, Cobertura::Rango { inicio: d(2026, 2, 5), fin: d(2026, 2, 6) });
    assert_eq!(c[1].valor_ventas, 500.0);
    assert_eq!(c[1].jueves, 1);

    // carpeta inexistente: catálogo vacío
    assert!(escanear_catalogo(&rutas.base.join("no_existe"), &libro).unwrap().is_empty());

    let _ = fs::remove_dir_all(&rutas.base);
}

/// Extractor en memoria por nombre de fichero.
struct ExtractorFalso(HashMap<String, TablaExtraida>);

impl ExtractorTabla for ExtractorFalso {
    fn extraer(&self, path: &Path) -> Result<TablaExtraida> {
        let nombre = path.file_name().and_then(|s| s.to_str()).unwrap_or_default();
        self.0
            .get(nombre)
            .cloned()
            .ok_or_else(|| PedidoError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, format!("{} ilegible", nombre))))
    }
}

fn fila(codigo: &str, extras: &[&str]) -> FilaProducto {
    FilaProducto {
        codigo: codigo.into(),
        articulo: format!("Articulo {}", codigo),
        unidad: "Kilogramo".into(),
        extras: extras.iter().map(|s| s.to_string()).collect(),
    }
}

fn extras_con(col: usize, valor: &str) -> Vec<String> {
    let mut v = vec![String::new(); col];
    v[col - 1] = valor.to_string();
    v
}

#[test]
fn test_conversion_diarios_estados() {
    let rutas = Rutas::new(base_temporal("diarios"));
    fs::create_dir_all(&rutas.ficheros_a_convertir).unwrap();
    for n in ["a.xls", "b.xls", "c.xls", "d.xls", "e.xlsx"] {
        fs::write(rutas.ficheros_a_convertir.join(n), b"x").unwrap();
    }

    let col10 = extras_con(10, "2,5");
    let col10: Vec<&str> = col10.iter().map(|s| s.as_str()).collect();
    let mut tablas = HashMap::new();
    tablas.insert(
        "a.xls".to_string(),
        TablaExtraida { fecha: Some(d(2026, 2, 3)), fechas_grabacion: vec![], filas: vec![fila("X1", &col10)] },
    );
    tablas.insert("b.xls".to_string(), TablaExtraida { fecha: None, fechas_grabacion: vec![], filas: vec![fila("X1", &col10)] });
    tablas.insert("c.xls".to_string(), TablaExtraida { fecha: Some(d(2026, 2, 4)), fechas_grabacion: vec![], filas: vec![] });
    tablas.insert(
        "d.xls".to_string(),
        TablaExtraida { fecha: Some(d(2026, 2, 5)), fechas_grabacion: vec![], filas: vec![fila("X1", &[])] },
    );
    let extractor = ExtractorFalso(tablas);

    let r = convertir_diarios(&rutas, &extractor).unwrap();
    let estados: Vec<EstadoConversion> = r.iter().map(|x| x.estado).collect();
    assert_eq!(
        estados,
        vec![
            EstadoConversion::Saved,
            EstadoConversion::NoDate,
            EstadoConversion::NoProducts,
            EstadoConversion::NoConsCol,
            EstadoConversion::Error,
        ]
    );

    let consumo = leer_consumo(&rutas.consumo_teorico.join("03-02-26.csv")).unwrap();
    assert_eq!(consumo.len(), 1);
    assert_eq!(consumo[0].consumo, 2.5);

    // idempotente: se reescribe el mismo fichero
    let r2 = convertir_diarios(&rutas, &extractor).unwrap();
    assert_eq!(r2[0].detalle, "03-02-26.csv");

    let _ = fs::remove_dir_all(&rutas.base);
}

#[test]
fn test_conversion_bulk_nombre_por_fechas_de_grabacion() {
    let rutas = Rutas::new(base_temporal("bulk"));
    fs::create_dir_all(&rutas.ficheros_a_convertir_bulk).unwrap();
    fs::write(rutas.ficheros_a_convertir_bulk.join("semana.xls"), b"x").unwrap();
    fs::write(rutas.ficheros_a_convertir_bulk.join("suelto.xls"), b"x").unwrap();

    let col9 = extras_con(9, "4");
    let col9: Vec<&str> = col9.iter().map(|s| s.as_str()).collect();
    let mut tablas = HashMap::new();
    tablas.insert(
        "semana.xls".to_string(),
        TablaExtraida {
            fecha: Some(d(2026, 1, 26)),
            fechas_grabacion: vec![d(2026, 1, 26), d(2026, 2, 2)],
            filas: vec![fila("X1", &col9)],
        },
    );
    // lunes 2 de febrero: segundo jueves = 12
    tablas.insert(
        "suelto.xls".to_string(),
        TablaExtraida { fecha: Some(d(2026, 2, 2)), fechas_grabacion: vec![d(2026, 2, 2)], filas: vec![fila("X1", &col9)] },
    );

    let r = convertir_bulk(&rutas, &ExtractorFalso(tablas)).unwrap();
    let destinos: Vec<&str> = r.iter().map(|x| x.detalle.as_str()).collect();
    assert_eq!(destinos, vec!["26-01-26_01-02-26.csv", "02-02-26_12-02-26.csv"]);
    assert!(rutas.consumo_teorico.join("26-01-26_01-02-26.csv").is_file());

    let _ = fs::remove_dir_all(&rutas.base);
}

#[test]
fn test_conversion_inventario() {
    let rutas = Rutas::new(base_temporal("inventario"));
    let vacio = ExtractorFalso(HashMap::new());
    assert_eq!(convertir_inventario(&rutas, &vacio).estado, EstadoConversion::Error);

    fs::write(&rutas.inventario_actual_xls, b"x").unwrap();
    let col16 = extras_con(16, "7,5");
    let col16: Vec<&str> = col16.iter().map(|s| s.as_str()).collect();
    let mut tablas = HashMap::new();
    tablas.insert(
        "inventario_actual.xls".to_string(),
        TablaExtraida { fecha: None, fechas_grabacion: vec![], filas: vec![fila("X1", &col16)] },
    );
    let r = convertir_inventario(&rutas, &ExtractorFalso(tablas));
    assert_eq!(r.estado, EstadoConversion::Saved);

    let inv = leer_inventario(&rutas.inventario_real).unwrap();
    assert_eq!(inv.len(), 1);
    assert_eq!(inv[0].real, 7.5);

    let mut corta = HashMap::new();
    corta.insert(
        "inventario_actual.xls".to_string(),
        TablaExtraida { fecha: None, fechas_grabacion: vec![], filas: vec![fila("X1", &["1"])] },
    );
    assert_eq!(convertir_inventario(&rutas, &ExtractorFalso(corta)).estado, EstadoConversion::NoRealCol);

    let _ = fs::remove_dir_all(&rutas.base);
}
