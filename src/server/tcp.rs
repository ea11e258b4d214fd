//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Implementación del servidor TCP que maneja múltiples conexiones simultáneas
//! usando threads. Cada conexión se procesa en su propio thread y atiende un
//! solo request (HTTP/1.0, `Connection: close`).

use crate::app::AppState;
use crate::config::Config;
use crate::error::ServerError;
use crate::http::request::find_head_end;
use crate::http::{Method, Request, Response, StatusCode};
use crate::router::Router;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn};

/// Tamaño de cada lectura del socket
const READ_CHUNK: usize = 8192;

/// Tiempo máximo esperando bytes de un cliente
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Resultado de leer un request del socket
#[derive(Debug, PartialEq, Eq)]
enum ReadOutcome {
    /// El cliente cerró sin enviar nada
    Closed,

    /// Headers + body superan el límite configurado
    TooLarge,

    /// Bytes del request (el body puede venir incompleto si el cliente cerró)
    Complete(Vec<u8>),
}

/// Servidor HTTP/1.0 concurrente del reto
pub struct Server {
    config: Config,
    router: Arc<Router>,
    state: Arc<AppState>,
    listener: TcpListener,
}

impl Server {
    /// Crea el estado de la aplicación y abre el socket
    pub fn bind(config: Config) -> Result<Self, ServerError> {
        let state = AppState::from_config(&config)?;
        Self::with_state(config, state)
    }

    /// Abre el socket con un estado ya construido
    pub fn with_state(config: Config, state: AppState) -> Result<Self, ServerError> {
        let address = config.address();
        let listener = TcpListener::bind(&address)?;
        info!("listening on {}", listener.local_addr()?);

        Ok(Self {
            config,
            router: Arc::new(Router::challenge()),
            state: Arc::new(state),
            listener,
        })
    }

    /// Dirección real del socket (útil con puerto 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Estado compartido
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Acepta conexiones hasta que falle el listener
    ///
    /// Lanza primero el worker de otorgamientos diferidos.
    pub fn run(&self) -> Result<(), ServerError> {
        let _timer = self.state.scheduler.spawn_worker()?;
        info!("concurrent mode: one thread per connection");

        let max_request_bytes = self.config.max_request_bytes;

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let router = Arc::clone(&self.router);
                    let state = Arc::clone(&self.state);

                    let peer_addr = stream
                        .peer_addr()
                        .map(|addr| addr.to_string())
                        .unwrap_or_else(|_| "unknown".to_string());
                    debug!(peer = %peer_addr, "new connection");

                    thread::spawn(move || {
                        if let Err(e) = Self::handle_connection(stream, &router, &state, max_request_bytes) {
                            warn!("connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("failed to accept connection: {}", e);
                }
            }
        }

        Ok(())
    }

    fn handle_connection(
        mut stream: TcpStream,
        router: &Router,
        state: &AppState,
        max_request_bytes: usize,
    ) -> io::Result<()> {
        let start = Instant::now();
        let request_id = format!("{:016x}", rand::random::<u64>());
        let span = info_span!("request", id = %&request_id[..8]);
        let _enter = span.enter();

        stream.set_read_timeout(Some(READ_TIMEOUT))?;

        let mut response = match read_request(&mut stream, max_request_bytes)? {
            ReadOutcome::Closed => {
                debug!("connection closed without request");
                return Ok(());
            }
            ReadOutcome::TooLarge => {
                warn!(limit = max_request_bytes, "request too large");
                let mut response = Response::error(StatusCode::PayloadTooLarge, "Payload Too Large");
                router.add_common_headers(&mut response);
                response
            }
            ReadOutcome::Complete(bytes) => match Request::parse(&bytes) {
                Ok(request) => {
                    info!("{} {}", request.method().as_str(), request.path());
                    let mut response = router.route(&request, state);
                    if request.method() == Method::HEAD {
                        response.strip_body();
                    }
                    response
                }
                Err(e) => {
                    warn!("parse error: {}", e);
                    let mut response =
                        Response::error(StatusCode::BadRequest, &format!("Invalid request: {}", e));
                    router.add_common_headers(&mut response);
                    response
                }
            },
        };

        response.add_header("X-Request-Id", &request_id);

        stream.write_all(&response.to_bytes())?;
        stream.flush()?;

        let latency = start.elapsed();
        info!(
            status = response.status().as_u16(),
            latency_ms = latency.as_secs_f64() * 1000.0,
            "response sent"
        );

        Ok(())
    }
}

/// Lee headers y body hasta `Content-Length`
///
/// Corta en cuanto el tamaño esperado supera `max_bytes`, sin leer el resto.
fn read_request(stream: &mut impl Read, max_bytes: usize) -> io::Result<ReadOutcome> {
    let mut buffer = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];
    let mut expected: Option<usize> = None;

    loop {
        if let Some(total) = expected {
            if buffer.len() >= total {
                buffer.truncate(total);
                return Ok(ReadOutcome::Complete(buffer));
            }
        }

        let bytes_read = stream.read(&mut chunk)?;
        if bytes_read == 0 {
            return Ok(if buffer.is_empty() {
                ReadOutcome::Closed
            } else {
                ReadOutcome::Complete(buffer)
            });
        }
        buffer.extend_from_slice(&chunk[..bytes_read]);

        if expected.is_none() {
            match find_head_end(&buffer) {
                Some(head_end) => {
                    let total = (head_end + 4).checked_add(declared_length(&buffer[..head_end]));
                    match total {
                        Some(total) if total <= max_bytes => expected = Some(total),
                        _ => return Ok(ReadOutcome::TooLarge),
                    }
                }
                None if buffer.len() > max_bytes => return Ok(ReadOutcome::TooLarge),
                None => {}
            }
        }
    }
}

/// `Content-Length` declarado en los headers (0 si falta o es inválido)
fn declared_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .split("\r\n")
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}
