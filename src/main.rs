//! # Markup Mayhem - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor del reto.

use markup_mayhem::config::Config;
use markup_mayhem::error::ServerError;
use markup_mayhem::server::Server;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    // Crear configuración (CLI + variables de entorno)
    let config = Config::new();

    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = start(config) {
        error!("💥 Error fatal: {}", e);
        std::process::exit(1);
    }
}

/// Valida la configuración, abre el socket y atiende conexiones
fn start(config: Config) -> Result<(), ServerError> {
    config.validate().map_err(ServerError::Config)?;
    config.print_summary();

    let server = Server::bind(config)?;

    // Esto bloquea el thread
    server.run()
}
