use chrono::NaiveDate;
use pedido_camion::algorithm::{ejecutar_pedido, AvisoSeleccion, ParametrosPedido};
use pedido_camion::excel::Rutas;
use pedido_camion::models::{Categoria, OrigenRevision};
use std::fs;
use std::path::PathBuf;

fn d(y: i32, m: u32, dd: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, dd).unwrap()
}

fn base_temporal(nombre: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pedido_camion_{}_{}", nombre, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Febrero 2026 con 100 € estimados cada día del 1 al 20, un fichero bulk
/// del 1 al 12 (jueves 5 y 12) y tres diarios.
fn preparar(nombre: &str) -> Rutas {
    let rutas = Rutas::new(base_temporal(nombre));
    fs::create_dir_all(&rutas.venta_estimada).unwrap();
    let mut est = String::from("fecha,venta_estimada\n");
    for dia in 1..=20 {
        est.push_str(&format!("2026-02-{:02},100\n", dia));
    }
    fs::write(rutas.venta_estimada.join("febrero.csv"), est).unwrap();

    fs::create_dir_all(&rutas.consumo_teorico).unwrap();
    fs::write(
        rutas.consumo_teorico.join("01-02-26_12-02-26.csv"),
        "Codigo,Articulo,Unidad_de_Medida,Consumo\nBF,Masa fina,Bola,24\nX1,Queso,Kilogramo,10\nZZ1,ZZ-TEST,Unidad,5\n",
    )
    .unwrap();
    fs::write(rutas.consumo_teorico.join("05-02-26.csv"), "Codigo,Articulo,Unidad_de_Medida,Consumo\nX1,Queso,Kilogramo,1\n").unwrap();
    for diario in ["09-02-26.csv", "12-02-26.csv"] {
        fs::write(rutas.consumo_teorico.join(diario), "Codigo,Articulo,Unidad_de_Medida,Consumo\nX1,Queso,Kilogramo,1\n").unwrap();
    }
    fs::write(rutas.consumo_teorico.join("notas.csv"), "x\n").unwrap();

    fs::create_dir_all(rutas.inventario_real.parent().unwrap()).unwrap();
    fs::write(
        &rutas.inventario_real,
        "Codigo,Articulo,Unidad_de_Medida,Real\nX1,Queso,Kilogramo,2\nQ9,Vinagre,Litro,3\n",
    )
    .unwrap();
    rutas
}

#[test]
fn test_pedido_extremo_a_extremo_elige_bulk() {
    let rutas = preparar("bulk");
    let informe = ejecutar_pedido(&rutas, d(2026, 2, 1), d(2026, 2, 12), false, &ParametrosPedido::default()).unwrap();

    assert_eq!(informe.resumen.total, 1_200.0);
    assert!(informe.dias_faltantes.is_empty());
    assert_eq!(informe.candidatos.len(), 4);
    assert_eq!(informe.seleccion.jueves_requeridos, 2);

    let elegidos: Vec<&str> = informe.seleccion.elegidos.iter().map(|i| i.fichero.nombre.as_str()).collect();
    assert_eq!(elegidos, vec!["01-02-26_12-02-26.csv"]);
    assert_eq!(informe.pedido.ajuste_pct, 0.0);

    // masas: 24 / 1200 por euro, 4 días extra de 100 -> +8
    assert_eq!(informe.pedido.masas.fechas_extra.first(), Some(&d(2026, 2, 13)));
    assert!((informe.pedido.masas.consumo_anadido - 8.0).abs() < 1e-9);

    let bf = informe.pedido.lineas.iter().find(|l| l.codigo == "BF").unwrap();
    assert!((bf.consumo - 32.0).abs() < 1e-9);
    // 32 * 1.2 = 38.4 bolas -> 38
    assert_eq!(bf.cantidad_a_pedir, 38.0);

    let x1 = informe.pedido.lineas.iter().find(|l| l.codigo == "X1").unwrap();
    assert!((x1.cantidad_a_pedir - 10.08).abs() < 1e-9);
    assert!(informe.pedido.lineas.iter().all(|l| l.codigo != "ZZ1"));

    let revision: Vec<(&str, OrigenRevision)> =
        informe.pedido.revision.iter().map(|f| (f.codigo.as_str(), f.origen)).collect();
    assert_eq!(
        revision,
        vec![
            ("Q9", OrigenRevision::Inventario),
            ("BF", OrigenRevision::ConsumoAgregado),
            ("BM", OrigenRevision::ConsumoAgregado),
            ("BP", OrigenRevision::ConsumoAgregado),
        ]
    );
    assert_eq!(informe.pedido.masas.por_codigo["BM"], 0.0);
    assert!(informe.pedido.lineas.iter().any(|l| l.codigo == "BP" && l.cantidad_a_pedir == 0.0));

    let _ = fs::remove_dir_all(&rutas.base);
}

#[test]
fn test_pedido_evitando_jueves() {
    let rutas = preparar("evitar");
    let informe = ejecutar_pedido(&rutas, d(2026, 2, 1), d(2026, 2, 12), true, &ParametrosPedido::default()).unwrap();

    assert_eq!(informe.seleccion.excluidos_por_jueves, vec!["01-02-26_12-02-26.csv", "05-02-26.csv", "12-02-26.csv"]);
    let elegidos: Vec<&str> = informe.seleccion.elegidos.iter().map(|i| i.fichero.nombre.as_str()).collect();
    assert_eq!(elegidos, vec!["09-02-26.csv"]);
    assert!(matches!(informe.seleccion.avisos[0], AvisoSeleccion::JuevesEvitados { .. }));
    // 100 de 1200: el ajuste sube el pedido
    assert!(informe.pedido.ajuste_pct > 0.9);

    let _ = fs::remove_dir_all(&rutas.base);
}

#[test]
fn test_base_vacia_avisa_sin_fallar() {
    let rutas = Rutas::new(base_temporal("vacia"));
    let informe = ejecutar_pedido(&rutas, d(2026, 2, 1), d(2026, 2, 3), false, &ParametrosPedido::default()).unwrap();

    assert_eq!(informe.dias_faltantes.len(), 3);
    assert!(informe.candidatos.is_empty());
    assert_eq!(informe.seleccion.avisos, vec![AvisoSeleccion::SinCandidatos]);
    assert!(informe.pedido.lineas.is_empty());
    assert!(informe.avisos.iter().any(|a| a.contains("01/02/2026")));

    let _ = fs::remove_dir_all(&rutas.base);
}

#[test]
fn test_venta_real_corrupta_sigue_con_estimadas() {
    let rutas = preparar("venta_corrupta");
    fs::create_dir_all(rutas.venta_real.parent().unwrap()).unwrap();
    fs::write(&rutas.venta_real, b"no es una hoja de calculo").unwrap();

    let informe = ejecutar_pedido(&rutas, d(2026, 2, 1), d(2026, 2, 12), false, &ParametrosPedido::default()).unwrap();
    assert_eq!(informe.resumen.total, 1_200.0);
    assert!(informe.avisos.iter().any(|a| a.contains("venta.xlsx")));
    let elegidos: Vec<&str> = informe.seleccion.elegidos.iter().map(|i| i.fichero.nombre.as_str()).collect();
    assert_eq!(elegidos, vec!["01-02-26_12-02-26.csv"]);

    let _ = fs::remove_dir_all(&rutas.base);
}

#[test]
fn test_inventario_sin_columna_codigo_pide_todo_el_consumo() {
    let rutas = preparar("inventario_corrupto");
    fs::write(&rutas.inventario_real, "Code,Real\nX1,2\n").unwrap();

    let informe = ejecutar_pedido(&rutas, d(2026, 2, 1), d(2026, 2, 12), false, &ParametrosPedido::default()).unwrap();
    assert!(informe.avisos.iter().any(|a| a.contains("inventario_real.csv")));
    // sin inventario: 10 * 1.2
    let x1 = informe.pedido.lineas.iter().find(|l| l.codigo == "X1").unwrap();
    assert_eq!(x1.real, 0.0);
    assert!((x1.cantidad_a_pedir - 12.0).abs() < 1e-9);
    assert!(informe.pedido.revision.iter().all(|f| f.codigo != "Q9"));

    let _ = fs::remove_dir_all(&rutas.base);
}

#[test]
fn test_fichero_elegido_sin_columna_de_consumo() {
    let rutas = preparar("sin_consumo");
    fs::write(
        rutas.consumo_teorico.join("01-02-26_12-02-26.csv"),
        "Codigo,Articulo,Unidad_de_Medida\nBF,Masa fina,Bola\n",
    )
    .unwrap();

    let informe = ejecutar_pedido(&rutas, d(2026, 2, 1), d(2026, 2, 12), false, &ParametrosPedido::default()).unwrap();
    assert_eq!(informe.pedido.ficheros_ilegibles, vec!["01-02-26_12-02-26.csv"]);
    assert!(informe.avisos.iter().any(|a| a.contains("no se pudo leer el fichero de consumo 01-02-26_12-02-26.csv")));
    assert!(informe.pedido.lineas.is_empty());

    let _ = fs::remove_dir_all(&rutas.base);
}

#[test]
fn test_maestro_ilegible_se_omite() {
    let rutas = preparar("maestro_ilegible");
    let carpeta = rutas.carpeta_maestro(Categoria::Fresco);
    fs::create_dir_all(&carpeta).unwrap();
    fs::write(carpeta.join("maestro.xlsx"), b"sin cabecera ni formato").unwrap();

    let informe = ejecutar_pedido(&rutas, d(2026, 2, 1), d(2026, 2, 12), false, &ParametrosPedido::default()).unwrap();
    assert_eq!(informe.maestro_omitidos.len(), 1);
    assert!(informe.avisos.iter().any(|a| a.starts_with("maestro: se omite")));
    // sin maestro todo cae en seco y sin embalajes
    let x1 = informe.pedido.lineas.iter().find(|l| l.codigo == "X1").unwrap();
    assert_eq!(x1.categoria, Categoria::Seco);
    assert_eq!(x1.embalajes_a_pedir, None);

    let _ = fs::remove_dir_all(&rutas.base);
}
