//! # Registro de Sesión
//! src/session/record.rs
//!
//! Estado por visitante: partes resueltas, comentarios guardados y los
//! otorgamientos diferidos que siguen pendientes.

use crate::challenge::flags::FlagPart;
use crate::scheduler::TaskHandle;

/// Otorgamiento diferido de una parte del flag
#[derive(Debug, Clone)]
pub struct PendingGrant {
    pub part: FlagPart,
    pub handle: TaskHandle,
}

/// Registro de una sesión
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Partes resueltas, en el orden en que se resolvieron, sin repetidos
    solved: Vec<FlagPart>,

    /// Comentarios crudos, en orden de llegada
    comments: Vec<String>,

    /// Handles de los otorgamientos que todavía no dispararon
    pending: Vec<PendingGrant>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partes resueltas en orden de resolución
    pub fn solved(&self) -> &[FlagPart] {
        &self.solved
    }

    /// Nivel actual: cantidad de partes resueltas
    pub fn level(&self) -> usize {
        self.solved.len()
    }

    pub fn is_solved(&self, part: FlagPart) -> bool {
        self.solved.contains(&part)
    }

    /// Marca una parte como resuelta
    ///
    /// Retorna `false` si ya estaba resuelta; nunca agrega repetidos.
    pub fn mark_solved(&mut self, part: FlagPart) -> bool {
        if self.is_solved(part) {
            return false;
        }
        self.solved.push(part);
        true
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn push_comment(&mut self, comment: String) {
        self.comments.push(comment);
    }

    /// Otorgamientos aún pendientes
    pub fn pending(&self) -> impl Iterator<Item = &PendingGrant> {
        self.pending.iter().filter(|g| g.handle.is_pending())
    }

    /// Indica si ya hay un otorgamiento pendiente para `part`
    pub fn has_pending(&self, part: FlagPart) -> bool {
        self.pending().any(|g| g.part == part)
    }

    /// Guarda el handle de un otorgamiento y descarta los ya terminados
    pub fn track_pending(&mut self, part: FlagPart, handle: TaskHandle) {
        self.pending.retain(|g| g.handle.is_pending());
        self.pending.push(PendingGrant { part, handle });
    }

    /// Cancela el otorgamiento pendiente de `part`
    ///
    /// Retorna `false` si no había ninguno pendiente.
    pub fn cancel_pending(&mut self, part: FlagPart) -> bool {
        let mut cancelled = false;
        self.pending.retain(|g| {
            if g.part != part {
                return g.handle.is_pending();
            }
            cancelled |= g.handle.cancel();
            false
        });
        cancelled
    }
}
