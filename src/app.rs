//! # Estado de la Aplicación
//! src/app.rs
//!
//! Todo lo que los handlers comparten: sesiones, scheduler de
//! otorgamientos diferidos, renderizador de la página y los ajustes
//! derivados de la configuración.

use crate::challenge::flags::FlagPart;
use crate::challenge::page::PageRenderer;
use crate::config::Config;
use crate::error::ServerError;
use crate::scheduler::{Clock, Scheduler, SystemClock};
use crate::session::SessionStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Ajustes que usan los handlers
#[derive(Debug, Clone)]
pub struct Settings {
    /// Retraso de los otorgamientos disparados por comentarios
    pub grant_delay: Duration,

    /// Directorio de archivos estáticos
    pub public_dir: PathBuf,

    /// Directorio de avatares subidos
    pub upload_dir: PathBuf,

    /// Conservar los avatares después de inspeccionarlos
    pub keep_uploads: bool,
}

impl Settings {
    /// Crea los ajustes desde la configuración global
    pub fn from_config(config: &Config) -> Self {
        Self {
            grant_delay: Duration::from_millis(config.grant_delay_ms),
            public_dir: PathBuf::from(&config.public_dir),
            upload_dir: PathBuf::from(&config.upload_dir),
            keep_uploads: config.keep_uploads,
        }
    }
}

/// Estado compartido por todas las conexiones
pub struct AppState {
    pub store: SessionStore,
    pub scheduler: Scheduler,
    pub renderer: PageRenderer,
    pub settings: Settings,
}

impl AppState {
    /// Crea el estado con un reloj arbitrario
    pub fn new(settings: Settings, clock: Arc<dyn Clock>) -> Result<Self, ServerError> {
        Ok(Self {
            store: SessionStore::new(),
            scheduler: Scheduler::new(clock),
            renderer: PageRenderer::new()?,
            settings,
        })
    }

    /// Crea el estado con el reloj del sistema
    pub fn from_config(config: &Config) -> Result<Self, ServerError> {
        Self::new(Settings::from_config(config), Arc::new(SystemClock::new()))
    }

    /// Programa el otorgamiento diferido de `part` para la sesión
    ///
    /// No programa nada si la parte ya está resuelta o si ya hay un
    /// otorgamiento pendiente para ella. Retorna si se programó.
    pub fn schedule_grant(&self, session_id: &str, part: FlagPart) -> bool {
        let delay = self.settings.grant_delay;

        let scheduled = self
            .store
            .with_session(session_id, |session| {
                if session.is_solved(part) || session.has_pending(part) {
                    debug!(session = %session_id, part = part.index(), "grant skipped");
                    return false;
                }

                let store = self.store.clone();
                let id = session_id.to_string();
                let handle = self.scheduler.schedule(delay, move || {
                    if store.mark_solved(&id, part) {
                        info!(session = %id, part = part.index(), "flag part granted");
                    }
                });
                session.track_pending(part, handle);
                true
            })
            .unwrap_or(false);

        if scheduled {
            debug!(
                session = %session_id,
                part = part.index(),
                delay_ms = delay.as_millis() as u64,
                "grant scheduled"
            );
        }
        scheduled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualClock;

    fn state_with_clock() -> (AppState, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let settings = Settings::from_config(&Config::default());
        let state = AppState::new(settings, clock.clone()).unwrap();
        (state, clock)
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.grant_delay_ms = 250;
        config.keep_uploads = true;

        let settings = Settings::from_config(&config);
        assert_eq!(settings.grant_delay, Duration::from_millis(250));
        assert_eq!(settings.upload_dir, PathBuf::from("./uploads"));
        assert!(settings.keep_uploads);
    }

    #[test]
    fn test_grant_fires_after_delay() {
        let (state, clock) = state_with_clock();
        let (id, _) = state.store.get_or_create(None);

        assert!(state.schedule_grant(&id, FlagPart::StoredCookie));

        clock.advance(Duration::from_millis(14_999));
        state.scheduler.run_due();
        assert!(!state.store.is_solved(&id, FlagPart::StoredCookie));

        clock.advance(Duration::from_millis(1));
        state.scheduler.run_due();
        assert!(state.store.is_solved(&id, FlagPart::StoredCookie));
    }

    #[test]
    fn test_one_pending_grant_per_part() {
        let (state, _clock) = state_with_clock();
        let (id, _) = state.store.get_or_create(None);

        assert!(state.schedule_grant(&id, FlagPart::CspBypass));
        assert!(!state.schedule_grant(&id, FlagPart::CspBypass));
        assert!(state.schedule_grant(&id, FlagPart::StoredCookie));
        assert_eq!(state.scheduler.pending(), 2);
    }

    #[test]
    fn test_no_grant_for_solved_part() {
        let (state, _clock) = state_with_clock();
        let (id, _) = state.store.get_or_create(None);
        state.store.mark_solved(&id, FlagPart::StoredCookie);

        assert!(!state.schedule_grant(&id, FlagPart::StoredCookie));
        assert_eq!(state.scheduler.pending(), 0);
    }

    #[test]
    fn test_no_grant_for_unknown_session() {
        let (state, _clock) = state_with_clock();
        assert!(!state.schedule_grant("ghost", FlagPart::StoredCookie));
    }

    #[test]
    fn test_late_grant_does_not_duplicate() {
        let (state, clock) = state_with_clock();
        let (id, _) = state.store.get_or_create(None);

        state.schedule_grant(&id, FlagPart::CspBypass);
        // Resuelta por otro camino antes de que venza el timer
        state.store.mark_solved(&id, FlagPart::CspBypass);

        clock.advance(Duration::from_secs(15));
        state.scheduler.run_due();

        let session = state.store.snapshot(&id).unwrap();
        assert_eq!(session.solved(), &[FlagPart::CspBypass]);
    }
}
