// Núcleo del cálculo del pedido: resumen de ventas del rango, catálogo de
// ficheros de consumo, selección del subconjunto y cálculo de cantidades.
// Declarar submódulos (archivos en la carpeta `src/algorithm`)
pub mod resumen;
pub mod catalogo;
pub mod seleccion;
pub mod pedido;
pub mod pipeline;

// Reexportar solo la API pública que se usa desde fuera
pub use resumen::{resumir_rango, resumir_rango_desde_disco};
pub use catalogo::{construir_candidato, escanear_catalogo, nombre_fichero, parsear_nombre_fichero};
pub use seleccion::{construir_conjunto_trabajo, mejor_subconjunto, seleccionar_ficheros, AvisoSeleccion, ResultadoSeleccion};
pub use pedido::{
	agregar_consumos, aplicar_extrapolacion_masas, calcular_pedido, cantidad_a_pedir, es_excluido, redondeo_mitad_arriba,
	EntradaPedido, ResultadoPedido, ResumenMasas,
};
pub use pipeline::{ejecutar_pedido, InformePedido};

use serde::{Deserialize, Serialize};

/// Parámetros del cálculo de cantidades. Los valores por defecto son los
/// del almacén; margen, merma y días de descongelación se pueden cambiar por
/// entorno (ver `config`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametrosPedido {
	/// Margen de seguridad sobre el consumo previsto (0.20 = +20%)
	pub margen_consumo: f64,
	/// Merma aplicada al inventario disponible (0.04 = -4%)
	pub tasa_merma: f64,
	/// Días extra de previsión para las masas que requieren descongelación
	pub dias_descongelacion: u32,
	pub codigos_masa: Vec<String>,
	/// Unidades de medida que se piden en enteros
	pub unidades_enteras: Vec<String>,
	/// Prefijos de artículo internos que nunca se piden
	pub prefijos_excluidos: Vec<String>,
	/// Código que se pide aunque su artículo tenga un prefijo excluido
	pub codigo_excepcion: String,
	/// Diferencia relativa mínima para aplicar el ajuste por rango
	pub umbral_ajuste: f64,
}

impl Default for ParametrosPedido {
	fn default() -> Self {
		ParametrosPedido {
			margen_consumo: 0.20,
			tasa_merma: 0.04,
			dias_descongelacion: 4,
			codigos_masa: vec!["BF".into(), "BM".into(), "BP".into()],
			unidades_enteras: vec!["bola".into(), "unidad".into()],
			prefijos_excluidos: vec!["ZZ".into(), "YY".into()],
			codigo_excepcion: "GAMBC".into(),
			umbral_ajuste: 0.01,
		}
	}
}
