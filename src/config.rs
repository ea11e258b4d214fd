//! # Configuración del Servidor
//! src/config.rs
//!
//! Este módulo define la configuración del servidor del reto con soporte
//! completo para argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./markup_mayhem --port 3000 \
//!   --public-dir ./public \
//!   --upload-dir ./uploads \
//!   --grant-delay-ms 15000
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 HTTP_HOST=0.0.0.0 RUST_LOG=debug ./markup_mayhem
//! ```

use clap::Parser;

/// Configuración del servidor del reto
#[derive(Debug, Clone, Parser)]
#[command(name = "markup_mayhem")]
#[command(about = "Servidor HTTP/1.0 del reto de XSS \"Markup Mayhem\"")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor (0 = puerto efímero)
    #[arg(short, long, default_value = "3000", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    // === Archivos ===

    /// Directorio de archivos estáticos
    #[arg(long = "public-dir", default_value = "./public", env = "PUBLIC_DIR")]
    pub public_dir: String,

    /// Directorio donde se escriben los avatares subidos
    #[arg(long = "upload-dir", default_value = "./uploads", env = "UPLOAD_DIR")]
    pub upload_dir: String,

    /// Conservar los avatares en disco después del request
    #[arg(long = "keep-uploads", env = "KEEP_UPLOADS")]
    pub keep_uploads: bool,

    // === Reto ===

    /// Retraso de los flags otorgados por comentario, en milisegundos
    #[arg(long = "grant-delay-ms", default_value = "15000", env = "GRANT_DELAY_MS")]
    pub grant_delay_ms: u64,

    // === Límites ===

    /// Tamaño máximo de un request completo (headers + body)
    #[arg(long = "max-request-bytes", default_value = "10485760", env = "MAX_REQUEST_BYTES")]
    pub max_request_bytes: usize,

    // === Logging ===

    /// Filtro de logs (sintaxis de `EnvFilter`, ej: "info,markup_mayhem=debug")
    #[arg(long = "log-filter", default_value = "info", env = "RUST_LOG")]
    pub log_filter: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use markup_mayhem::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:3000");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("Host must not be empty".to_string());
        }
        if self.public_dir.trim().is_empty() {
            return Err("Public dir must not be empty".to_string());
        }
        if self.upload_dir.trim().is_empty() {
            return Err("Upload dir must not be empty".to_string());
        }
        if self.max_request_bytes == 0 {
            return Err("Max request bytes must be >= 1".to_string());
        }

        Ok(())
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("╔══════════════════════════════════════════════════════════════╗");
        println!("║              Markup Mayhem Server Configuration              ║");
        println!("╚══════════════════════════════════════════════════════════════╝");
        println!();
        println!("🌐 Network:");
        println!("   Address:      http://{}", self.address());
        println!("   Max request:  {} bytes", self.max_request_bytes);
        println!();
        println!("📁 Files:");
        println!("   Public dir:   {}", self.public_dir);
        println!("   Upload dir:   {}", self.upload_dir);
        println!(
            "   Uploads:      {}",
            if self.keep_uploads { "kept on disk" } else { "removed after inspection" }
        );
        println!();
        println!("🚩 Challenge:");
        println!("   Grant delay:  {} ms", self.grant_delay_ms);
        println!("   Log filter:   {}", self.log_filter);
        println!();
        println!("═══════════════════════════════════════════════════════════════");
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 3000,
            host: "127.0.0.1".to_string(),
            public_dir: "./public".to_string(),
            upload_dir: "./uploads".to_string(),
            keep_uploads: false,
            grant_delay_ms: 15_000,
            max_request_bytes: 10 * 1024 * 1024,
            log_filter: "info".to_string(),
        }
    }
}
