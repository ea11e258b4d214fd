//! # Cola de Tareas Diferidas
//! src/scheduler/timer.rs
//!
//! Tareas de un solo disparo que se ejecutan cuando el reloj alcanza su
//! vencimiento. Cada `schedule` retorna un [`TaskHandle`] que permite
//! consultar el estado de la tarea o cancelarla.
//!
//! El heap está ordenado por vencimiento (el más próximo primero) y, a igual
//! vencimiento, por orden de llegada.

use super::clock::Clock;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{self, AtomicBool, AtomicU64, AtomicU8};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const PENDING: u8 = 0;
const CANCELLED: u8 = 1;
const FIRED: u8 = 2;

/// Estado de una tarea diferida
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Esperando su vencimiento
    Pending,

    /// Cancelada antes de ejecutarse
    Cancelled,

    /// Ya se ejecutó
    Fired,
}

/// Handle de una tarea programada
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: u64,
    state: Arc<AtomicU8>,
}

impl TaskHandle {
    fn new(id: u64) -> Self {
        Self {
            id,
            state: Arc::new(AtomicU8::new(PENDING)),
        }
    }

    /// Estado actual de la tarea
    pub fn state(&self) -> TaskState {
        match self.state.load(atomic::Ordering::SeqCst) {
            PENDING => TaskState::Pending,
            CANCELLED => TaskState::Cancelled,
            _ => TaskState::Fired,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state() == TaskState::Pending
    }

    /// Cancela la tarea
    ///
    /// Retorna `true` si estaba pendiente; `false` si ya se ejecutó o ya
    /// estaba cancelada.
    pub fn cancel(&self) -> bool {
        self.transition(CANCELLED)
    }

    /// Reclama la tarea para ejecutarla (PENDING → FIRED)
    fn claim(&self) -> bool {
        self.transition(FIRED)
    }

    fn transition(&self, to: u8) -> bool {
        self.state
            .compare_exchange(PENDING, to, atomic::Ordering::SeqCst, atomic::Ordering::SeqCst)
            .is_ok()
    }
}

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Tarea dentro del heap
struct ScheduledTask {
    due: Duration,
    handle: TaskHandle,
    task: Task,
}

// Ordenamiento invertido: BinaryHeap es max-heap y queremos el vencimiento
// más próximo arriba
impl PartialEq for ScheduledTask {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.handle.id == other.handle.id
    }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledTask {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.handle.id.cmp(&self.handle.id))
    }
}

/// Estado compartido entre el scheduler y su worker
struct Shared {
    clock: Arc<dyn Clock>,
    queue: Mutex<BinaryHeap<ScheduledTask>>,
    condvar: Condvar,
    next_id: AtomicU64,
    shutdown: AtomicBool,
}

/// Scheduler de tareas diferidas
///
/// Clonarlo es barato: todos los clones comparten la misma cola.
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Scheduler {
    /// Crea un scheduler que lee el tiempo de `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                clock,
                queue: Mutex::new(BinaryHeap::new()),
                condvar: Condvar::new(),
                next_id: AtomicU64::new(1),
                shutdown: AtomicBool::new(false),
            }),
        }
    }

    /// Programa `task` para ejecutarse dentro de `delay`
    ///
    /// La tarea nunca corre antes de `delay`; puede correr después si el
    /// worker está ocupado.
    pub fn schedule<F>(&self, delay: Duration, task: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.shared.next_id.fetch_add(1, atomic::Ordering::SeqCst);
        let handle = TaskHandle::new(id);
        let due = self.shared.clock.now() + delay;

        let mut queue = self.shared.queue.lock().unwrap();
        queue.push(ScheduledTask {
            due,
            handle: handle.clone(),
            task: Box::new(task),
        });

        // Despertar al worker: puede que esta tarea venza antes que las demás
        self.shared.condvar.notify_one();

        tracing::debug!(task_id = id, delay_ms = delay.as_millis() as u64, "task scheduled");
        handle
    }

    /// Número de tareas pendientes (no canceladas) en la cola
    pub fn pending(&self) -> usize {
        let queue = self.shared.queue.lock().unwrap();
        queue.iter().filter(|t| t.handle.is_pending()).count()
    }

    /// Ejecuta todas las tareas vencidas
    ///
    /// Retorna cuántas tareas se ejecutaron (las canceladas no cuentan).
    pub fn run_due(&self) -> usize {
        let due: Vec<ScheduledTask> = {
            let mut queue = self.shared.queue.lock().unwrap();
            let now = self.shared.clock.now();
            let mut due = Vec::new();
            while queue.peek().is_some_and(|t| t.due <= now) {
                if let Some(task) = queue.pop() {
                    due.push(task);
                }
            }
            due
        };

        // Las tareas corren fuera del lock de la cola
        let mut executed = 0;
        for scheduled in due {
            if scheduled.handle.claim() {
                (scheduled.task)();
                executed += 1;
            } else {
                tracing::debug!(task_id = scheduled.handle.id, "skipping cancelled task");
            }
        }
        executed
    }

    /// Lanza el thread que ejecuta las tareas en tiempo real
    pub fn spawn_worker(&self) -> std::io::Result<JoinHandle<()>> {
        let scheduler = self.clone();
        thread::Builder::new()
            .name("grant-timer".to_string())
            .spawn(move || scheduler.worker_loop())
    }

    /// Detiene el worker
    pub fn shutdown(&self) {
        self.shared.shutdown.store(true, atomic::Ordering::SeqCst);
        // Tomar el lock evita perder la notificación entre el chequeo y el wait
        let _queue = self.shared.queue.lock().unwrap();
        self.shared.condvar.notify_all();
    }

    /// Loop principal del worker
    fn worker_loop(&self) {
        tracing::debug!("timer worker started");

        loop {
            {
                let mut queue = self.shared.queue.lock().unwrap();
                loop {
                    if self.shared.shutdown.load(atomic::Ordering::SeqCst) {
                        tracing::debug!("timer worker stopped");
                        return;
                    }

                    let now = self.shared.clock.now();
                    match queue.peek().map(|t| t.due) {
                        Some(due) if due <= now => break,
                        Some(due) => {
                            let (guard, _) = self.shared.condvar.wait_timeout(queue, due - now).unwrap();
                            queue = guard;
                        }
                        None => {
                            queue = self.shared.condvar.wait(queue).unwrap();
                        }
                    }
                }
            }

            self.run_due();
        }
    }
}
