//! # Almacén de Sesiones
//! src/session/store.rs
//!
//! Tabla en memoria `session_id -> Session`, compartida entre threads.
//! No expira, no tiene límite de tamaño y se pierde al reiniciar.
//!
//! Cada operación de lectura-modificación-escritura ocurre bajo un solo
//! lock, así dos requests de la misma sesión no pueden duplicar una parte
//! resuelta.

use crate::challenge::flags::FlagPart;
use crate::session::record::Session;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Genera un identificador de sesión en base 36
///
/// Aleatorio pero no criptográfico: alcanza para una demo.
pub fn generate_id() -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let mut n: u64 = rand::random();
    let mut id = Vec::with_capacity(13);
    loop {
        id.push(DIGITS[(n % 36) as usize]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    id.reverse();
    String::from_utf8_lossy(&id).into_owned()
}

/// Almacén de sesiones thread-safe
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Obtiene la sesión `id` o crea una nueva
    ///
    /// Si `id` es `None` o no existe en la tabla, se genera un id nuevo con
    /// un registro vacío. Retorna el id efectivo y si se creó.
    pub fn get_or_create(&self, id: Option<&str>) -> (String, bool) {
        let mut sessions = self.sessions.lock().unwrap();

        if let Some(id) = id.filter(|id| sessions.contains_key(*id)) {
            return (id.to_string(), false);
        }

        let mut new_id = generate_id();
        while sessions.contains_key(&new_id) {
            new_id = generate_id();
        }
        sessions.insert(new_id.clone(), Session::new());

        tracing::debug!(session = %new_id, "session created");
        (new_id, true)
    }

    /// Ejecuta `f` sobre el registro de la sesión, bajo el lock
    ///
    /// Las modificaciones quedan visibles de inmediato. Retorna `None` si la
    /// sesión no existe.
    pub fn with_session<R>(&self, id: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.get_mut(id).map(f)
    }

    /// Copia del registro actual
    pub fn snapshot(&self, id: &str) -> Option<Session> {
        self.with_session(id, |session| session.clone())
    }

    /// Marca `part` como resuelta (test-and-set atómico)
    ///
    /// Retorna `true` solo si la parte no estaba resuelta.
    pub fn mark_solved(&self, id: &str, part: FlagPart) -> bool {
        self.with_session(id, |session| session.mark_solved(part))
            .unwrap_or(false)
    }

    pub fn is_solved(&self, id: &str, part: FlagPart) -> bool {
        self.with_session(id, |session| session.is_solved(part))
            .unwrap_or(false)
    }

    pub fn push_comment(&self, id: &str, comment: String) {
        self.with_session(id, |session| session.push_comment(comment));
    }

    /// Cancela el otorgamiento pendiente de `part`, si lo hay
    pub fn cancel_pending(&self, id: &str, part: FlagPart) -> bool {
        self.with_session(id, |session| session.cancel_pending(part))
            .unwrap_or(false)
    }

    /// Cantidad de sesiones
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
