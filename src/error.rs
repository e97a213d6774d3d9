//! Tipo de error único de la librería.
//!
//! Los errores de un fichero concreto dentro de un lote (conversiones,
//! lectura de consumos, maestro) no llegan aquí: se convierten en estados o
//! avisos por fichero. `PedidoError` queda para lo que impide completar una
//! operación individual.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PedidoError {
    #[error("error de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("error CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("error leyendo hoja de cálculo: {0}")]
    Hoja(#[from] calamine::Error),

    #[error("el fichero {0:?} no contiene hojas")]
    SinHojas(PathBuf),

    #[error("no se encontró la columna '{columna}' en {fichero:?}")]
    ColumnaNoEncontrada { fichero: PathBuf, columna: String },

    #[error("fecha inválida: '{0}'")]
    FechaInvalida(String),
}

pub type Result<T> = std::result::Result<T, PedidoError>;
