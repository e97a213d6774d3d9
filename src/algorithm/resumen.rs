//! Resumen de ventas de un rango de fechas.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::Result;
use crate::excel::{cargar_libro_ventas, Rutas};
use crate::models::{FuenteDia, FuenteVenta, LibroVentas, ResumenRango, VentaDia};

/// Clasifica cada día de `[inicio, fin]` (se intercambian si vienen al revés)
/// como real, estimado o faltante. `total = total_real + total_estimada_usada`
/// es el objetivo del motor de selección.
pub fn resumir_rango(libro: &LibroVentas, inicio: NaiveDate, fin: NaiveDate) -> ResumenRango {
	let (inicio, fin) = if inicio > fin { (fin, inicio) } else { (inicio, fin) };

	let mut por_dia = Vec::new();
	let mut total_real = 0.0;
	let mut total_estimada_usada = 0.0;
	for fecha in inicio.iter_days().take_while(|d| *d <= fin) {
		let dia = match libro.venta(fecha) {
			Some(r) if r.fuente == FuenteVenta::Real => {
				total_real += r.valor;
				VentaDia { fecha, fuente: FuenteDia::Real, valor: r.valor }
			}
			Some(r) => {
				total_estimada_usada += r.valor;
				VentaDia { fecha, fuente: FuenteDia::Estimada, valor: r.valor }
			}
			None => VentaDia { fecha, fuente: FuenteDia::Faltante, valor: 0.0 },
		};
		por_dia.push(dia);
	}

	debug!(
		"resumen {}..{}: real={:.2} estimada={:.2} ({} días)",
		inicio,
		fin,
		total_real,
		total_estimada_usada,
		por_dia.len()
	);
	ResumenRango {
		inicio,
		fin,
		por_dia,
		total_real,
		total_estimada_usada,
		total: total_real + total_estimada_usada,
	}
}

/// Igual que `resumir_rango` cargando antes el libro de ventas del disco.
pub fn resumir_rango_desde_disco(rutas: &Rutas, inicio: NaiveDate, fin: NaiveDate) -> Result<ResumenRango> {
	let libro = cargar_libro_ventas(rutas)?;
	Ok(resumir_rango(&libro, inicio, fin))
}
