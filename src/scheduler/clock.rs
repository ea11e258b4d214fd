//! # Relojes
//! src/scheduler/clock.rs
//!
//! El scheduler lee el tiempo a través del trait [`Clock`]. En producción
//! se usa [`SystemClock`]; en los tests [`ManualClock`] permite avanzar un
//! reloj virtual sin esperar tiempo real.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Fuente de tiempo monotónica
///
/// `now()` retorna el tiempo transcurrido desde la época del reloj.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Reloj real basado en `Instant`
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Reloj virtual que solo avanza cuando se le pide
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Avanza el reloj `delta`
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }
}
