//! Orquestación completa: ventas del rango, catálogo, selección e inventario
//! hasta el pedido. Cada llamada devuelve un `InformePedido` independiente.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::algorithm::pedido::{calcular_pedido, EntradaPedido, ResultadoPedido};
use crate::algorithm::seleccion::{seleccionar_ficheros, ResultadoSeleccion};
use crate::algorithm::{escanear_catalogo, resumir_rango, ParametrosPedido};
use crate::error::{PedidoError, Result};
use crate::excel::maestro::FicheroOmitido;
use crate::excel::{cargar_maestro, leer_consumo, leer_inventario, leer_ventas_estimadas, leer_ventas_reales, Rutas};
use crate::models::{contar_jueves, ConsumoProducto, FicheroConsumo, ItemSeleccion, LibroVentas, ResumenRango};

#[derive(Debug, Clone, Serialize)]
pub struct InformePedido {
	pub resumen: ResumenRango,
	/// Días del rango sin venta real ni estimada
	pub dias_faltantes: Vec<NaiveDate>,
	pub candidatos: Vec<FicheroConsumo>,
	pub seleccion: ResultadoSeleccion,
	pub pedido: ResultadoPedido,
	pub maestro_omitidos: Vec<FicheroOmitido>,
	/// Avisos legibles de todas las etapas, en orden
	pub avisos: Vec<String>,
}

/// Lee el consumo de cada elemento elegido (una vez por fichero distinto,
/// una tabla por aparición). Los ficheros que fallan se devuelven aparte.
pub fn leer_consumos_elegidos(elegidos: &[ItemSeleccion]) -> (Vec<Vec<ConsumoProducto>>, Vec<String>) {
	let mut cache: HashMap<PathBuf, Option<Vec<ConsumoProducto>>> = HashMap::new();
	let mut tablas = Vec::with_capacity(elegidos.len());
	let mut ilegibles = Vec::new();
	for item in elegidos {
		let entrada = cache.entry(item.fichero.ruta.clone()).or_insert_with(|| match leer_consumo(&item.fichero.ruta) {
			Ok(filas) => Some(filas),
			Err(e) => {
				warn!("⚠️ no se pudo leer {}: {}", item.fichero.nombre, e);
				ilegibles.push(item.fichero.nombre.clone());
				None
			}
		});
		if let Some(filas) = entrada {
			tablas.push(filas.clone());
		}
	}
	(tablas, ilegibles)
}

/// Un fichero de entrada ilegible no detiene el pedido: se avisa y se sigue
/// sin sus datos.
fn o_vacio<T: Default>(leido: std::result::Result<T, PedidoError>, fichero: &str, avisos: &mut Vec<String>) -> T {
	leido.unwrap_or_else(|e| {
		warn!("⚠️ {} ilegible: {}", fichero, e);
		avisos.push(format!("no se pudo leer {} ({}); se continúa sin esos datos", fichero, e));
		T::default()
	})
}

/// Ejecuta el cálculo completo del pedido para `[inicio, fin]`.
pub fn ejecutar_pedido(
	rutas: &Rutas,
	inicio: NaiveDate,
	fin: NaiveDate,
	evitar_jueves: bool,
	params: &ParametrosPedido,
) -> Result<InformePedido> {
	let mut avisos = Vec::new();
	let reales = o_vacio(leer_ventas_reales(rutas), "venta.xlsx", &mut avisos);
	let estimadas = o_vacio(leer_ventas_estimadas(rutas), "venta_estimada", &mut avisos);
	let libro = LibroVentas::new(reales, estimadas);
	let resumen = resumir_rango(&libro, inicio, fin);

	let dias_faltantes = resumen.dias_faltantes();
	if !dias_faltantes.is_empty() {
		let lista: Vec<String> = dias_faltantes.iter().map(|d| d.format("%d/%m/%Y").to_string()).collect();
		warn!("faltan ventas para {} días del rango", dias_faltantes.len());
		avisos.push(format!("no hay ventas reales ni estimadas para: {}", lista.join(", ")));
	}

	let candidatos = escanear_catalogo(&rutas.consumo_teorico, &libro)?;
	if !rutas.consumo_teorico.is_dir() {
		avisos.push(format!("no existe la carpeta {}", rutas.consumo_teorico.display()));
	}

	let jueves_requeridos = contar_jueves(resumen.inicio, resumen.fin);
	let seleccion = seleccionar_ficheros(&candidatos, resumen.objetivo_centimos(), jueves_requeridos, evitar_jueves);
	avisos.extend(seleccion.avisos.iter().map(|a| a.to_string()));

	let inventario = match leer_inventario(&rutas.inventario_real) {
		Ok(inv) => {
			if inv.is_empty() {
				avisos.push("inventario real vacío o inexistente".to_string());
			}
			inv
		}
		Err(e) => o_vacio(Err(e), "inventario_real.csv", &mut avisos),
	};
	let maestro = cargar_maestro(rutas)?;
	for o in &maestro.omitidos {
		avisos.push(format!("maestro: se omite {} ({})", o.fichero.display(), o.motivo));
	}

	let (consumos, ilegibles) = leer_consumos_elegidos(&seleccion.elegidos);
	for nombre in &ilegibles {
		avisos.push(format!("no se pudo leer el fichero de consumo {}", nombre));
	}

	let entrada = EntradaPedido {
		consumos: &consumos,
		inventario: &inventario,
		maestro: &maestro,
		libro: &libro,
		fin_rango: resumen.fin,
		ventas_rango: resumen.total,
		ventas_elegidas: seleccion.ventas_elegidas(),
	};
	let mut pedido = calcular_pedido(&entrada, params);
	pedido.ficheros_ilegibles = ilegibles;

	info!(
		"✅ pedido {}..{}: {} candidatos, {} elegidos, {} líneas",
		resumen.inicio,
		resumen.fin,
		candidatos.len(),
		seleccion.elegidos.len(),
		pedido.lineas.len()
	);
	Ok(InformePedido {
		resumen,
		dias_faltantes,
		candidatos,
		seleccion,
		pedido,
		maestro_omitidos: maestro.omitidos,
		avisos,
	})
}
