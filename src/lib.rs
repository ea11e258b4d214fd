//! # Markup Mayhem
//! src/lib.rs
//!
//! Servidor HTTP/1.0 de un reto de XSS, implementado desde cero sobre
//! `std::net`. Cada visitante tiene una sesión (cookie `sessionId`) y va
//! resolviendo cuatro retos; cada reto resuelto revela una parte del flag.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: Parsing y manejo del protocolo HTTP/1.0 (incluye multipart)
//! - `server`: Lógica del servidor TCP y manejo de conexiones
//! - `router`: Enrutamiento de peticiones a handlers y archivos estáticos
//! - `challenge`: Flags, detectores de payloads, página y endpoints
//! - `session`: Sesiones en memoria
//! - `scheduler`: Tareas diferidas (otorgamientos con retraso)
//! - `assets`: Archivos estáticos del directorio público
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use markup_mayhem::config::Config;
//! use markup_mayhem::server::Server;
//!
//! let config = Config::default();
//! let server = Server::bind(config).expect("Error al abrir el socket");
//! server.run().expect("Error al iniciar servidor");
//! ```

pub mod app;
pub mod assets;
pub mod challenge;
pub mod config;
pub mod error;
pub mod http;
pub mod router;
pub mod scheduler;
pub mod server;
pub mod session;
