// Estructuras de datos principales

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Origen de una cifra de ventas. La venta real siempre tiene prioridad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuenteVenta {
    Real,
    Estimada,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistroVenta {
    pub fecha: NaiveDate,
    pub valor: f64,
    pub fuente: FuenteVenta,
}

/// Libro de ventas: mapas fecha -> valor para ventas reales y estimadas.
#[derive(Debug, Clone, Default)]
pub struct LibroVentas {
    reales: HashMap<NaiveDate, f64>,
    estimadas: HashMap<NaiveDate, f64>,
}

impl LibroVentas {
    pub fn new(reales: HashMap<NaiveDate, f64>, estimadas: HashMap<NaiveDate, f64>) -> Self {
        LibroVentas { reales, estimadas }
    }

    /// Venta conocida para `fecha`: real si existe, si no estimada.
    pub fn venta(&self, fecha: NaiveDate) -> Option<RegistroVenta> {
        if let Some(v) = self.reales.get(&fecha) {
            return Some(RegistroVenta { fecha, valor: *v, fuente: FuenteVenta::Real });
        }
        self.estimadas
            .get(&fecha)
            .map(|v| RegistroVenta { fecha, valor: *v, fuente: FuenteVenta::Estimada })
    }

    /// Valor usado para valorar un día (0 si no hay ningún dato).
    pub fn valor(&self, fecha: NaiveDate) -> f64 {
        self.venta(fecha).map(|r| r.valor).unwrap_or(0.0)
    }

    /// Sólo la venta estimada, ignorando la real (la usa la extrapolación de masas).
    pub fn estimada(&self, fecha: NaiveDate) -> Option<f64> {
        self.estimadas.get(&fecha).copied()
    }

    pub fn num_reales(&self) -> usize {
        self.reales.len()
    }

    pub fn num_estimadas(&self) -> usize {
        self.estimadas.len()
    }
}

/// Clasificación de un día del rango consultado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuenteDia {
    Real,
    Estimada,
    Faltante,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VentaDia {
    pub fecha: NaiveDate,
    pub fuente: FuenteDia,
    pub valor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumenRango {
    pub inicio: NaiveDate,
    pub fin: NaiveDate,
    pub por_dia: Vec<VentaDia>,
    pub total_real: f64,
    pub total_estimada_usada: f64,
    pub total: f64,
}

impl ResumenRango {
    pub fn dias_faltantes(&self) -> Vec<NaiveDate> {
        self.por_dia
            .iter()
            .filter(|d| d.fuente == FuenteDia::Faltante)
            .map(|d| d.fecha)
            .collect()
    }

    /// Total del rango en céntimos: objetivo del motor de selección.
    pub fn objetivo_centimos(&self) -> i64 {
        a_centimos(self.total)
    }
}

pub fn a_centimos(valor: f64) -> i64 {
    (valor * 100.0).round() as i64
}

/// Días que cubre un fichero de consumo: uno suelto o un rango inclusivo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tipo", rename_all = "snake_case")]
pub enum Cobertura {
    Dia { fecha: NaiveDate },
    Rango { inicio: NaiveDate, fin: NaiveDate },
}

impl Cobertura {
    pub fn inicio(&self) -> NaiveDate {
        match self {
            Cobertura::Dia { fecha } => *fecha,
            Cobertura::Rango { inicio, .. } => *inicio,
        }
    }

    pub fn fin(&self) -> NaiveDate {
        match self {
            Cobertura::Dia { fecha } => *fecha,
            Cobertura::Rango { fin, .. } => *fin,
        }
    }

    pub fn es_rango(&self) -> bool {
        matches!(self, Cobertura::Rango { .. })
    }

    pub fn dias(&self) -> impl Iterator<Item = NaiveDate> {
        let fin = self.fin();
        self.inicio().iter_days().take_while(move |d| *d <= fin)
    }

    pub fn num_dias(&self) -> i64 {
        (self.fin() - self.inicio()).num_days() + 1
    }

    pub fn contiene(&self, fecha: NaiveDate) -> bool {
        self.inicio() <= fecha && fecha <= self.fin()
    }

    /// Jueves dentro de la propia cobertura (no recortada al rango consultado).
    pub fn jueves(&self) -> u32 {
        contar_jueves(self.inicio(), self.fin())
    }
}

/// Número de jueves en `[inicio, fin]` (0 si el rango está invertido).
pub fn contar_jueves(inicio: NaiveDate, fin: NaiveDate) -> u32 {
    inicio
        .iter_days()
        .take_while(|d| *d <= fin)
        .filter(|d| d.weekday() == Weekday::Thu)
        .count() as u32
}

/// Fichero candidato del catálogo `consumo_teorico`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FicheroConsumo {
    pub ruta: PathBuf,
    pub nombre: String,
    pub cobertura: Cobertura,
    /// Suma de ventas (real, si no estimada, si no 0) de los días cubiertos.
    pub valor_ventas: f64,
    pub jueves: u32,
}

impl FicheroConsumo {
    pub fn es_rango(&self) -> bool {
        self.cobertura.es_rango()
    }

    pub fn valor_centimos(&self) -> i64 {
        a_centimos(self.valor_ventas)
    }
}

/// Entrada del conjunto de trabajo del motor de selección. `copia` es 0 para
/// el fichero original y >0 para los duplicados de jueves de un solo día.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSeleccion {
    pub fichero: FicheroConsumo,
    pub copia: u32,
}

impl ItemSeleccion {
    pub fn original(fichero: FicheroConsumo) -> Self {
        ItemSeleccion { fichero, copia: 0 }
    }

    pub fn es_duplicado(&self) -> bool {
        self.copia > 0
    }
}

/// Clave de agrupación (Codigo, Articulo, Unidad_de_Medida).
pub type ClaveProducto = (String, String, String);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumoProducto {
    pub codigo: String,
    pub articulo: String,
    pub unidad: String,
    pub consumo: f64,
}

impl ConsumoProducto {
    pub fn clave(&self) -> ClaveProducto {
        (self.codigo.clone(), self.articulo.clone(), self.unidad.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistroInventario {
    pub codigo: String,
    pub articulo: String,
    pub unidad: String,
    pub real: f64,
}

impl RegistroInventario {
    pub fn clave(&self) -> ClaveProducto {
        (self.codigo.clone(), self.articulo.clone(), self.unidad.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Categoria {
    Congelado,
    Fresco,
    Seco,
}

impl Categoria {
    pub const TODAS: [Categoria; 3] = [Categoria::Congelado, Categoria::Fresco, Categoria::Seco];

    /// Nombre de la carpeta del maestro de esta categoría.
    pub fn carpeta(&self) -> &'static str {
        match self {
            Categoria::Congelado => "congelado",
            Categoria::Fresco => "fresco",
            Categoria::Seco => "seco",
        }
    }
}

/// Fila del maestro de productos (congelado / fresco / seco).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntradaMaestro {
    pub codigo: String,
    pub nombre: String,
    pub unidades_totales: Option<f64>,
    pub medida: Option<String>,
    pub embalaje: Option<f64>,
    pub unidades_por_embalaje: Option<f64>,
    pub categoria: Categoria,
    pub origen: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineaPedido {
    pub codigo: String,
    pub articulo: String,
    pub unidad: String,
    pub consumo: f64,
    pub real: f64,
    pub consumo_ajustado: f64,
    pub real_ajustado: f64,
    pub cantidad_a_pedir: f64,
    pub unidades_por_embalaje: Option<f64>,
    pub embalajes_a_pedir: Option<u64>,
    pub categoria: Categoria,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrigenRevision {
    /// En inventario pero sin consumo agregado.
    Inventario,
    /// Con consumo agregado pero ausente del inventario.
    ConsumoAgregado,
    /// Consumo agregado exactamente 0.
    ConsumoCero,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilaRevision {
    pub codigo: String,
    pub articulo: String,
    pub unidad: String,
    pub real: f64,
    pub consumo: f64,
    pub origen: OrigenRevision,
}
