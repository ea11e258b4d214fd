//! # Scheduler de Tareas Diferidas
//! src/scheduler/mod.rs
//!
//! Los flags del comentario almacenado y del bypass por comentario se
//! otorgan con retraso. Este módulo reemplaza los timers "dispara y olvida"
//! por tareas con handle cancelable y un reloj inyectable:
//!
//! - `clock`: trait `Clock`, reloj real y reloj manual para tests
//! - `timer`: cola de tareas, handles y worker en background

pub mod clock;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use timer::{Scheduler, TaskHandle, TaskState};
