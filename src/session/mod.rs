//! # Sesiones
//! src/session/mod.rs
//!
//! - `record`: estado de un visitante
//! - `store`: tabla compartida de sesiones

pub mod record;
pub mod store;

pub use record::{PendingGrant, Session};
pub use store::SessionStore;

/// Nombre de la cookie que guarda el id de sesión
pub const SESSION_COOKIE: &str = "sessionId";
