//! Motor de selección de ficheros de consumo.
//!
//! Dado el catálogo de candidatos, el total de ventas del rango (en céntimos)
//! y el número de jueves del rango, elige el subconjunto que minimiza en orden
//! lexicográfico `(|jueves_requeridos - jueves|, |ventas - objetivo|)`.
//!
//! 1. Conjunto de trabajo: con `evitar_jueves` se usan sólo los ficheros sin
//!    jueves (si queda alguno). Sin él, los ficheros de un solo día que son
//!    jueves se duplican en round-robin hasta cubrir los jueves requeridos;
//!    los rangos nunca se duplican.
//! 2. Búsqueda: enumeración completa hasta `MAX_EXACTO` elementos y, por
//!    encima, partición en dos mitades (meet-in-the-middle). La mitad derecha
//!    se agrupa por número de jueves y se ordena por suma; para cada suma de
//!    la mitad izquierda se miran `VENTANA_VECINOS` vecinos a cada lado del
//!    punto de bisección de cada grupo. Por encima de `MAX_BUSQUEDA` el
//!    conjunto se recorta, así que el óptimo sólo está garantizado sobre los
//!    elementos conservados.
//! 3. Avisos: jueves evitados, déficit sin resolver y selección con menos
//!    jueves de los requeridos.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::models::{FicheroConsumo, ItemSeleccion};

/// Tamaño máximo del conjunto de trabajo para enumeración completa.
pub const MAX_EXACTO: usize = 20;
/// Vecinos revisados a cada lado del punto de bisección.
pub const VENTANA_VECINOS: usize = 5;
/// Tope del conjunto de trabajo para la búsqueda partida (2^22 sumas por mitad).
pub const MAX_BUSQUEDA: usize = 44;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tipo", rename_all = "snake_case")]
pub enum AvisoSeleccion {
	SinCandidatos,
	SinCombinacion,
	/// Ficheros descartados por contener jueves
	JuevesEvitados { ficheros: Vec<String> },
	/// Todos los candidatos tienen jueves: se usan igualmente
	SinAlternativaSinJueves,
	/// No hay ficheros de un día en jueves para duplicar
	DeficitJuevesSinResolver { faltan: u32 },
	SinJuevesDisponibles { requeridos: u32 },
	JuevesInsuficientes { elegidos: u32, requeridos: u32 },
	/// Conjunto de trabajo recortado a `MAX_BUSQUEDA` elementos
	ConjuntoRecortado { descartados: Vec<String> },
}

impl fmt::Display for AvisoSeleccion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AvisoSeleccion::SinCandidatos => write!(f, "no hay ficheros de consumo disponibles"),
			AvisoSeleccion::SinCombinacion => write!(f, "no se encontró ninguna combinación de ficheros utilizable"),
			AvisoSeleccion::JuevesEvitados { ficheros } => {
				write!(f, "se evitarán los siguientes ficheros porque contienen jueves: {}", ficheros.join(", "))
			}
			AvisoSeleccion::SinAlternativaSinJueves => {
				write!(f, "no hay alternativas sin jueves; se usarán todos los ficheros disponibles")
			}
			AvisoSeleccion::DeficitJuevesSinResolver { faltan } => {
				write!(f, "faltan {} jueves y no hay ficheros de un solo día en jueves para duplicar", faltan)
			}
			AvisoSeleccion::SinJuevesDisponibles { requeridos } => write!(
				f,
				"los ficheros consultados solo contienen 0 jueves mientras que el rango requiere {} jueves",
				requeridos
			),
			AvisoSeleccion::JuevesInsuficientes { elegidos, requeridos } => write!(
				f,
				"los ficheros consultados contienen {} jueves mientras que el rango requiere {} jueves; se usarán los datos disponibles",
				elegidos, requeridos
			),
			AvisoSeleccion::ConjuntoRecortado { descartados } => {
				write!(f, "demasiados ficheros; no se han considerado: {}", descartados.join(", "))
			}
		}
	}
}

/// Conjunto de trabajo previo a la búsqueda.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConjuntoTrabajo {
	pub items: Vec<ItemSeleccion>,
	pub excluidos_por_jueves: Vec<String>,
	pub avisos: Vec<AvisoSeleccion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultadoSeleccion {
	/// Elementos elegidos, con los duplicados expandidos
	pub elegidos: Vec<ItemSeleccion>,
	pub avisos: Vec<AvisoSeleccion>,
	pub excluidos_por_jueves: Vec<String>,
	pub jueves_requeridos: u32,
	pub jueves_elegidos: u32,
	pub objetivo_centimos: i64,
	pub ventas_elegidas_centimos: i64,
	/// `true` si se enumeraron todos los subconjuntos
	pub exacta: bool,
}

impl ResultadoSeleccion {
	/// Suma de ventas de los elementos elegidos (cada aparición cuenta).
	pub fn ventas_elegidas(&self) -> f64 {
		self.elegidos.iter().map(|i| i.fichero.valor_ventas).sum()
	}
}

fn es_jueves_de_un_dia(f: &FicheroConsumo) -> bool {
	!f.es_rango() && f.jueves == 1
}

/// Paso 1: conjunto de trabajo según el modo de jueves.
pub fn construir_conjunto_trabajo(
	candidatos: &[FicheroConsumo],
	jueves_requeridos: u32,
	evitar_jueves: bool,
) -> ConjuntoTrabajo {
	let mut avisos = Vec::new();
	let mut excluidos_por_jueves = Vec::new();

	if evitar_jueves {
		let (con_jueves, sin_jueves): (Vec<&FicheroConsumo>, Vec<&FicheroConsumo>) =
			candidatos.iter().partition(|c| c.jueves > 0);
		let usados: Vec<&FicheroConsumo> = if con_jueves.is_empty() {
			sin_jueves
		} else if sin_jueves.is_empty() {
			avisos.push(AvisoSeleccion::SinAlternativaSinJueves);
			con_jueves
		} else {
			excluidos_por_jueves = con_jueves.iter().map(|c| c.nombre.clone()).collect();
			avisos.push(AvisoSeleccion::JuevesEvitados { ficheros: excluidos_por_jueves.clone() });
			sin_jueves
		};
		let items = usados.into_iter().cloned().map(ItemSeleccion::original).collect();
		return ConjuntoTrabajo { items, excluidos_por_jueves, avisos };
	}

	let mut items: Vec<ItemSeleccion> = candidatos.iter().cloned().map(ItemSeleccion::original).collect();
	let total: u32 = items.iter().map(|i| i.fichero.jueves).sum();
	if total < jueves_requeridos {
		let faltan = jueves_requeridos - total;
		let fuentes: Vec<&FicheroConsumo> = candidatos.iter().filter(|c| es_jueves_de_un_dia(c)).collect();
		if fuentes.is_empty() {
			warn!("faltan {} jueves y no hay ficheros de jueves de un día", faltan);
			avisos.push(AvisoSeleccion::DeficitJuevesSinResolver { faltan });
		} else {
			let mut copias = vec![0u32; fuentes.len()];
			for k in 0..faltan as usize {
				let idx = k % fuentes.len();
				copias[idx] += 1;
				items.push(ItemSeleccion { fichero: fuentes[idx].clone(), copia: copias[idx] });
			}
			debug!("duplicados {} ficheros de jueves para cubrir {} jueves", faltan, jueves_requeridos);
		}
	}
	ConjuntoTrabajo { items, excluidos_por_jueves, avisos }
}

/// Clave lexicográfica (distancia en jueves, distancia en céntimos).
type Clave = (u32, u64);

fn clave(suma: i64, jueves: u32, objetivo: i64, requeridos: u32) -> Clave {
	(jueves.abs_diff(requeridos), suma.abs_diff(objetivo))
}

/// Sumas y jueves de todos los subconjuntos de `valores`, indexados por
/// máscara (cada máscara reutiliza la de sin su bit más bajo).
fn enumerar(valores: &[i64], jueves: &[u32]) -> (Vec<i64>, Vec<u32>) {
	let total = 1usize << valores.len();
	let mut sumas = vec![0i64; total];
	let mut th = vec![0u32; total];
	for mask in 1..total {
		let bajo = mask.trailing_zeros() as usize;
		let resto = mask & (mask - 1);
		sumas[mask] = sumas[resto] + valores[bajo];
		th[mask] = th[resto] + jueves[bajo];
	}
	(sumas, th)
}

fn indices_de(mask: u64, desplazamiento: usize) -> impl Iterator<Item = usize> {
	(0..64usize).filter(move |i| mask >> i & 1 == 1).map(move |i| i + desplazamiento)
}

fn busqueda_exacta(valores: &[i64], jueves: &[u32], objetivo: i64, requeridos: u32) -> Vec<usize> {
	let (sumas, th) = enumerar(valores, jueves);
	let mut mejor = (clave(0, 0, objetivo, requeridos), 0usize);
	for mask in 1..sumas.len() {
		let k = clave(sumas[mask], th[mask], objetivo, requeridos);
		if k < mejor.0 {
			mejor = (k, mask);
		}
	}
	indices_de(mejor.1 as u64, 0).collect()
}

fn busqueda_partida(valores: &[i64], jueves: &[u32], objetivo: i64, requeridos: u32) -> Vec<usize> {
	let h = valores.len() / 2;
	let (sumas_a, th_a) = enumerar(&valores[..h], &jueves[..h]);
	let (sumas_b, th_b) = enumerar(&valores[h..], &jueves[h..]);

	// mitad derecha agrupada por jueves y ordenada por suma
	let mut grupos: BTreeMap<u32, Vec<(i64, u64)>> = BTreeMap::new();
	for (mask, (&s, &t)) in sumas_b.iter().zip(th_b.iter()).enumerate() {
		grupos.entry(t).or_default().push((s, mask as u64));
	}
	for g in grupos.values_mut() {
		g.sort_by_key(|&(s, _)| s);
	}

	let mut mejor: Option<(Clave, u64, u64)> = None;
	for (mask_a, (&sa, &ta)) in sumas_a.iter().zip(th_a.iter()).enumerate() {
		let necesita = objetivo - sa;
		for (&tb, grupo) in &grupos {
			let dist_jueves = (ta + tb).abs_diff(requeridos);
			if matches!(mejor, Some(((dj, _), _, _)) if dist_jueves > dj) {
				continue;
			}
			let i = grupo.partition_point(|&(s, _)| s < necesita);
			let desde = i.saturating_sub(VENTANA_VECINOS);
			let hasta = (i + VENTANA_VECINOS + 1).min(grupo.len());
			for &(sb, mask_b) in &grupo[desde..hasta] {
				let k = clave(sa + sb, ta + tb, objetivo, requeridos);
				if mejor.is_none_or(|(m, _, _)| k < m) {
					mejor = Some((k, mask_a as u64, mask_b));
				}
			}
		}
	}

	match mejor {
		Some((_, ma, mb)) => indices_de(ma, 0).chain(indices_de(mb, h)).collect(),
		None => Vec::new(),
	}
}

/// Un elemento con valor 0 y sin jueves no cambia la clave de ningún subconjunto.
fn es_util(valor: i64, jueves: u32) -> bool {
	valor != 0 || jueves != 0
}

/// `true` si la búsqueda sobre estos elementos será la enumeración completa.
pub fn busqueda_es_exacta(valores: &[i64], jueves: &[u32]) -> bool {
	valores.iter().zip(jueves).filter(|(v, t)| es_util(**v, **t)).count() <= MAX_EXACTO
}

/// Paso 2: índices del subconjunto de mejor clave. Los elementos que no son
/// útiles se apartan antes de buscar.
pub fn mejor_subconjunto(valores: &[i64], jueves: &[u32], objetivo: i64, requeridos: u32) -> Vec<usize> {
	let utiles: Vec<usize> = (0..valores.len()).filter(|&i| es_util(valores[i], jueves[i])).collect();
	let v: Vec<i64> = utiles.iter().map(|&i| valores[i]).collect();
	let t: Vec<u32> = utiles.iter().map(|&i| jueves[i]).collect();

	let elegidos = if v.len() <= MAX_EXACTO {
		busqueda_exacta(&v, &t, objetivo, requeridos)
	} else {
		busqueda_partida(&v, &t, objetivo, requeridos)
	};
	elegidos.into_iter().map(|i| utiles[i]).collect()
}

/// Recorta el conjunto de trabajo a `MAX_BUSQUEDA` elementos conservando
/// primero los que aportan jueves y después los de cobertura más reciente.
fn recortar(items: Vec<ItemSeleccion>) -> (Vec<ItemSeleccion>, Vec<String>) {
	if items.len() <= MAX_BUSQUEDA {
		return (items, Vec::new());
	}
	let mut orden: Vec<usize> = (0..items.len()).collect();
	orden.sort_by(|&a, &b| {
		let (fa, fb) = (&items[a].fichero, &items[b].fichero);
		(fb.jueves > 0).cmp(&(fa.jueves > 0)).then(fb.cobertura.fin().cmp(&fa.cobertura.fin()))
	});
	let mut conservar = vec![false; items.len()];
	for &i in orden.iter().take(MAX_BUSQUEDA) {
		conservar[i] = true;
	}
	let mut kept = Vec::with_capacity(MAX_BUSQUEDA);
	let mut descartados = Vec::new();
	for (item, keep) in items.into_iter().zip(conservar) {
		if keep {
			kept.push(item);
		} else {
			descartados.push(item.fichero.nombre);
		}
	}
	(kept, descartados)
}

/// Selección completa: conjunto de trabajo, búsqueda y avisos.
pub fn seleccionar_ficheros(
	candidatos: &[FicheroConsumo],
	objetivo_centimos: i64,
	jueves_requeridos: u32,
	evitar_jueves: bool,
) -> ResultadoSeleccion {
	let mut resultado = ResultadoSeleccion {
		elegidos: Vec::new(),
		avisos: Vec::new(),
		excluidos_por_jueves: Vec::new(),
		jueves_requeridos,
		jueves_elegidos: 0,
		objetivo_centimos,
		ventas_elegidas_centimos: 0,
		exacta: true,
	};
	if candidatos.is_empty() {
		resultado.avisos.push(AvisoSeleccion::SinCandidatos);
		return resultado;
	}

	let conjunto = construir_conjunto_trabajo(candidatos, jueves_requeridos, evitar_jueves);
	resultado.avisos.extend(conjunto.avisos);
	resultado.excluidos_por_jueves = conjunto.excluidos_por_jueves;

	let (items, descartados) = recortar(conjunto.items);
	if !descartados.is_empty() {
		warn!("conjunto de trabajo recortado: {} ficheros fuera", descartados.len());
		resultado.avisos.push(AvisoSeleccion::ConjuntoRecortado { descartados });
	}

	let valores: Vec<i64> = items.iter().map(|i| i.fichero.valor_centimos()).collect();
	let jueves: Vec<u32> = items.iter().map(|i| i.fichero.jueves).collect();
	resultado.exacta = busqueda_es_exacta(&valores, &jueves);
	let indices = mejor_subconjunto(&valores, &jueves, objetivo_centimos, jueves_requeridos);

	resultado.jueves_elegidos = indices.iter().map(|&i| jueves[i]).sum();
	resultado.ventas_elegidas_centimos = indices.iter().map(|&i| valores[i]).sum();
	resultado.elegidos = indices.into_iter().map(|i| items[i].clone()).collect();

	if resultado.elegidos.is_empty() {
		resultado.avisos.push(AvisoSeleccion::SinCombinacion);
	}
	if !evitar_jueves && resultado.jueves_elegidos < jueves_requeridos {
		resultado.avisos.push(if resultado.jueves_elegidos == 0 {
			AvisoSeleccion::SinJuevesDisponibles { requeridos: jueves_requeridos }
		} else {
			AvisoSeleccion::JuevesInsuficientes { elegidos: resultado.jueves_elegidos, requeridos: jueves_requeridos }
		});
	}

	info!(
		"🎯 selección: {} ficheros ({} jueves de {}), ventas {} / objetivo {} céntimos",
		resultado.elegidos.len(),
		resultado.jueves_elegidos,
		jueves_requeridos,
		resultado.ventas_elegidas_centimos,
		objetivo_centimos
	);
	resultado
}
