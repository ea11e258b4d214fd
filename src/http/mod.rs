//! # Módulo HTTP
//!
//! Este módulo implementa el protocolo HTTP/1.0 desde cero, sin usar
//! librerías de alto nivel. Incluye:
//!
//! - Parsing de requests HTTP/1.0 (query, headers, cookies, body)
//! - Construcción de responses HTTP (HTML, script, redirecciones)
//! - Manejo de status codes
//! - Parsing de `multipart/form-data` para la subida de avatares
//!
//! ### Formato de Request
//!
//! ```text
//! GET /search?q=hola HTTP/1.0\r\n
//! Cookie: sessionId=k3j2h1\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 302 Found\r\n
//! Location: /?q=hola\r\n
//! \r\n
//! ```

pub mod multipart; // Parsing de multipart/form-data
pub mod request;   // Parsing de HTTP requests
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use request::{Method, Request};
pub use response::Response;
pub use status::StatusCode;
