//! # Errores del Servidor
//! src/error.rs
//!
//! Errores fatales: los que impiden arrancar o mantener el servidor.
//! Los errores de un request individual se convierten en respuestas HTTP
//! y nunca llegan hasta aquí.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}
