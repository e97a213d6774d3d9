//! Conciliación de consumos con inventario y cálculo de cantidades a pedir.
//!
//! Flujo (todo en memoria, sin tocar disco):
//! 1. agregar los consumos de los ficheros elegidos por (código, artículo, unidad)
//! 2. extrapolar las masas que necesitan descongelación a los días siguientes al rango
//! 3. cruzar con el inventario real y aplicar margen de consumo y merma
//! 4. ajustar por la diferencia entre ventas del rango y ventas de los ficheros
//! 5. redondear, excluir artículos internos y enriquecer con el maestro
//! 6. construir la lista de productos a revisar

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::{debug, info};

use crate::algorithm::ParametrosPedido;
use crate::excel::maestro::normalizar_codigo;
use crate::excel::MaestroProductos;
use crate::models::{
	Categoria, ClaveProducto, ConsumoProducto, FilaRevision, LibroVentas, LineaPedido, OrigenRevision,
	RegistroInventario,
};

/// Resumen de la extrapolación de masas.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResumenMasas {
	pub dias_extra: u32,
	pub fechas_extra: Vec<NaiveDate>,
	/// Venta estimada de los días extra
	pub ventas_extra: f64,
	/// Consumo de masas antes de extrapolar
	pub consumo_actual: f64,
	/// Consumo de masas por unidad de venta del rango
	pub ratio: f64,
	pub consumo_anadido: f64,
	pub por_codigo: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultadoPedido {
	pub lineas: Vec<LineaPedido>,
	pub revision: Vec<FilaRevision>,
	/// Consumo agregado ya extrapolado
	pub consumo_agregado: Vec<ConsumoProducto>,
	pub masas: ResumenMasas,
	/// Ajuste relativo aplicado (0 si la diferencia no llega al umbral)
	pub ajuste_pct: f64,
	pub ventas_rango: f64,
	pub ventas_elegidas: f64,
	/// `ventas_elegidas - ventas_rango`
	pub diferencia_ventas: f64,
	/// Ficheros elegidos que no se pudieron leer
	pub ficheros_ilegibles: Vec<String>,
}

impl ResultadoPedido {
	/// Líneas con cantidad positiva de una categoría.
	pub fn lineas_de(&self, categoria: Categoria) -> Vec<&LineaPedido> {
		self.lineas.iter().filter(|l| l.categoria == categoria && l.cantidad_a_pedir > 0.0).collect()
	}
}

/// Datos de entrada del cálculo.
#[derive(Debug, Clone, Copy)]
pub struct EntradaPedido<'a> {
	/// Tabla de consumo de cada elemento elegido (un duplicado aparece tantas veces como se eligió)
	pub consumos: &'a [Vec<ConsumoProducto>],
	pub inventario: &'a [RegistroInventario],
	pub maestro: &'a MaestroProductos,
	pub libro: &'a LibroVentas,
	pub fin_rango: NaiveDate,
	pub ventas_rango: f64,
	pub ventas_elegidas: f64,
}

/// Suma de consumos por clave, en orden de clave.
pub fn agregar_consumos(consumos: &[Vec<ConsumoProducto>]) -> BTreeMap<ClaveProducto, f64> {
	let mut agg: BTreeMap<ClaveProducto, f64> = BTreeMap::new();
	for fila in consumos.iter().flatten() {
		*agg.entry(fila.clave()).or_insert(0.0) += fila.consumo;
	}
	agg
}

fn consumo_codigo(agg: &BTreeMap<ClaveProducto, f64>, codigo: &str) -> f64 {
	agg.iter().filter(|((c, _, _), _)| c.trim() == codigo).fold(0.0, |acc, (_, v)| acc + v)
}

/// Extiende el consumo de las masas `dias_descongelacion` días más allá del
/// fin del rango, con la venta estimada de esos días y la proporción
/// consumo de masas / ventas del rango. El extra se reparte según el peso
/// actual de cada código (a partes iguales si no hay consumo). Cada código
/// de masa queda con fila propia aunque su extra sea 0.
pub fn aplicar_extrapolacion_masas(
	agg: &mut BTreeMap<ClaveProducto, f64>,
	fin_rango: NaiveDate,
	ventas_rango: f64,
	libro: &LibroVentas,
	params: &ParametrosPedido,
) -> ResumenMasas {
	let codigos = &params.codigos_masa;
	let mut resumen = ResumenMasas { dias_extra: params.dias_descongelacion, ..Default::default() };
	if codigos.is_empty() || params.dias_descongelacion == 0 {
		return resumen;
	}

	resumen.fechas_extra = (1..=params.dias_descongelacion as i64).map(|i| fin_rango + Duration::days(i)).collect();
	resumen.ventas_extra = resumen.fechas_extra.iter().filter_map(|d| libro.estimada(*d)).fold(0.0, |acc, v| acc + v);

	let por_codigo: Vec<f64> = codigos.iter().map(|c| consumo_codigo(agg, c)).collect();
	resumen.consumo_actual = por_codigo.iter().fold(0.0, |acc, v| acc + v);
	resumen.ratio = if ventas_rango > 0.0 { resumen.consumo_actual / ventas_rango } else { 0.0 };
	let necesario = resumen.ventas_extra * resumen.ratio;

	for (codigo, actual) in codigos.iter().zip(por_codigo) {
		let cuota = if resumen.consumo_actual > 0.0 {
			actual / resumen.consumo_actual
		} else {
			1.0 / codigos.len() as f64
		};
		let anadido = necesario * cuota;
		let fila = agg.iter_mut().find(|((c, _, _), _)| c.trim() == codigo.as_str()).map(|(_, v)| v);
		match fila {
			Some(v) => *v += anadido,
			None => {
				agg.insert((codigo.clone(), String::new(), String::new()), anadido);
			}
		}
		resumen.consumo_anadido += anadido;
		resumen.por_codigo.insert(codigo.clone(), anadido);
	}
	debug!(
		"masas: ratio={:.6} ventas_extra={:.2} añadido={:.3}",
		resumen.ratio, resumen.ventas_extra, resumen.consumo_anadido
	);
	resumen
}

/// Ajuste relativo `(ventas_rango - ventas_elegidas) / ventas_rango`, o 0 si
/// el rango no tiene ventas o la diferencia no llega al umbral.
pub fn ajuste_por_rango(ventas_rango: f64, ventas_elegidas: f64, umbral: f64) -> f64 {
	if ventas_rango == 0.0 {
		return 0.0;
	}
	let pct = (ventas_rango - ventas_elegidas) / ventas_rango;
	if pct.abs() >= umbral { pct } else { 0.0 }
}

/// `max(0, round((consumo_ajustado - real_ajustado) * (1 + ajuste), 2))`. El
/// factor `(1 + ajuste)` no baja de 0.
pub fn cantidad_a_pedir(consumo_ajustado: f64, real_ajustado: f64, ajuste_pct: f64) -> f64 {
	let factor = (1.0 + ajuste_pct).max(0.0);
	let bruto = ((consumo_ajustado - real_ajustado) * factor).max(0.0);
	(bruto * 100.0).round() / 100.0
}

/// Redondeo al entero con .5 hacia arriba.
pub fn redondeo_mitad_arriba(x: f64) -> f64 {
	if x - x.floor() >= 0.5 { x.ceil() } else { x.floor() }
}

/// Artículos internos (prefijos excluidos) salvo el código de excepción.
pub fn es_excluido(codigo: &str, articulo: &str, params: &ParametrosPedido) -> bool {
	let articulo = articulo.trim().to_uppercase();
	let con_prefijo = params.prefijos_excluidos.iter().any(|p| articulo.starts_with(&p.to_uppercase()));
	con_prefijo && normalizar_codigo(codigo) != normalizar_codigo(&params.codigo_excepcion)
}

/// Categoría de cada código según la carpeta del maestro; congelado tiene
/// prioridad sobre fresco y fresco sobre seco.
fn categorias(maestro: &MaestroProductos) -> HashMap<String, Categoria> {
	let mut out = HashMap::new();
	for cat in Categoria::TODAS {
		for e in maestro.entradas.iter().filter(|e| e.categoria == cat) {
			out.entry(normalizar_codigo(&e.codigo)).or_insert(cat);
		}
	}
	out
}

fn lista_revision(
	agg: &BTreeMap<ClaveProducto, f64>,
	inventario: &[RegistroInventario],
	reales: &HashMap<ClaveProducto, f64>,
	params: &ParametrosPedido,
) -> Vec<FilaRevision> {
	let codigos_inv: HashSet<String> = inventario.iter().map(|r| r.codigo.trim().to_string()).collect();
	let codigos_agg: HashSet<String> = agg.keys().map(|(c, _, _)| c.trim().to_string()).collect();

	let mut revision: Vec<FilaRevision> = Vec::new();
	for r in inventario.iter().filter(|r| !codigos_agg.contains(r.codigo.trim())) {
		revision.push(FilaRevision {
			codigo: r.codigo.clone(),
			articulo: r.articulo.clone(),
			unidad: r.unidad.clone(),
			real: r.real,
			consumo: 0.0,
			origen: OrigenRevision::Inventario,
		});
	}
	for ((codigo, articulo, unidad), consumo) in agg.iter().filter(|((c, _, _), _)| !codigos_inv.contains(c.trim())) {
		revision.push(FilaRevision {
			codigo: codigo.clone(),
			articulo: articulo.clone(),
			unidad: unidad.clone(),
			real: 0.0,
			consumo: *consumo,
			origen: OrigenRevision::ConsumoAgregado,
		});
	}

	let ya_listados: HashSet<String> = revision.iter().map(|f| f.codigo.trim().to_string()).collect();
	for (clave, consumo) in agg.iter().filter(|(_, v)| **v == 0.0) {
		if ya_listados.contains(clave.0.trim()) {
			continue;
		}
		revision.push(FilaRevision {
			codigo: clave.0.clone(),
			articulo: clave.1.clone(),
			unidad: clave.2.clone(),
			real: reales.get(clave).copied().unwrap_or(0.0),
			consumo: *consumo,
			origen: OrigenRevision::ConsumoCero,
		});
	}

	revision.retain(|f| !es_excluido(&f.codigo, &f.articulo, params));
	revision
}

/// Cálculo completo del pedido a partir de los consumos ya leídos.
pub fn calcular_pedido(entrada: &EntradaPedido<'_>, params: &ParametrosPedido) -> ResultadoPedido {
	let mut agg = agregar_consumos(entrada.consumos);
	// sin ficheros elegidos no hay consumo que extender
	let masas = if entrada.consumos.is_empty() {
		ResumenMasas { dias_extra: params.dias_descongelacion, ..Default::default() }
	} else {
		aplicar_extrapolacion_masas(&mut agg, entrada.fin_rango, entrada.ventas_rango, entrada.libro, params)
	};

	let mut reales: HashMap<ClaveProducto, f64> = HashMap::new();
	for r in entrada.inventario {
		*reales.entry(r.clave()).or_insert(0.0) += r.real;
	}

	let ajuste_pct = ajuste_por_rango(entrada.ventas_rango, entrada.ventas_elegidas, params.umbral_ajuste);
	let upe = entrada.maestro.por_codigo();
	let cats = categorias(entrada.maestro);
	let unidades_enteras: Vec<String> = params.unidades_enteras.iter().map(|u| u.trim().to_lowercase()).collect();

	let mut lineas = Vec::new();
	for (clave, consumo) in &agg {
		let (codigo, articulo, unidad) = clave;
		if es_excluido(codigo, articulo, params) {
			continue;
		}
		let real = reales.get(clave).copied().unwrap_or(0.0);
		let consumo_ajustado = consumo * (1.0 + params.margen_consumo);
		let real_ajustado = real * (1.0 - params.tasa_merma);
		let mut cantidad = cantidad_a_pedir(consumo_ajustado, real_ajustado, ajuste_pct);
		if unidades_enteras.contains(&unidad.trim().to_lowercase()) {
			cantidad = redondeo_mitad_arriba(cantidad);
		}

		let cod_norm = normalizar_codigo(codigo);
		let unidades_por_embalaje = upe.get(&cod_norm).and_then(|e| e.unidades_por_embalaje);
		let embalajes_a_pedir = unidades_por_embalaje
			.filter(|u| *u > 0.0)
			.map(|u| (cantidad / u).ceil() as u64);
		lineas.push(LineaPedido {
			codigo: codigo.clone(),
			articulo: articulo.clone(),
			unidad: unidad.clone(),
			consumo: *consumo,
			real,
			consumo_ajustado,
			real_ajustado,
			cantidad_a_pedir: cantidad,
			unidades_por_embalaje,
			embalajes_a_pedir,
			categoria: cats.get(&cod_norm).copied().unwrap_or(Categoria::Seco),
		});
	}

	let revision = lista_revision(&agg, entrada.inventario, &reales, params);
	let consumo_agregado = agg
		.iter()
		.map(|((codigo, articulo, unidad), consumo)| ConsumoProducto {
			codigo: codigo.clone(),
			articulo: articulo.clone(),
			unidad: unidad.clone(),
			consumo: *consumo,
		})
		.collect();

	info!(
		"🧾 pedido: {} líneas, {} a revisar, ajuste {:.2}%",
		lineas.len(),
		revision.len(),
		ajuste_pct * 100.0
	);
	ResultadoPedido {
		lineas,
		revision,
		consumo_agregado,
		masas,
		ajuste_pct,
		ventas_rango: entrada.ventas_rango,
		ventas_elegidas: entrada.ventas_elegidas,
		diferencia_ventas: entrada.ventas_elegidas - entrada.ventas_rango,
		ficheros_ilegibles: Vec::new(),
	}
}
