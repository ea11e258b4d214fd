//! # Construcción de Respuestas HTTP
//!
//! Este módulo proporciona una API para construir respuestas HTTP/1.0
//! de forma programática y convertirlas a bytes para enviar al cliente.
//!
//! ## Formato de una respuesta HTTP/1.0
//!
//! ```text
//! HTTP/1.0 302 Found\r\n
//! Location: /\r\n
//! Set-Cookie: sessionId=k3j2h1; Path=/; HttpOnly\r\n
//! Content-Length: 23\r\n
//! \r\n
//! Found. Redirecting to /
//! ```
//!
//! ## Ejemplo de uso
//!
//! ```
//! use markup_mayhem::http::{Response, StatusCode};
//!
//! let response = Response::redirect("/?csp_success=1");
//!
//! assert_eq!(response.status(), StatusCode::Found);
//! assert_eq!(response.header("Location"), Some("/?csp_success=1"));
//! ```

use super::StatusCode;
use std::collections::HashMap;

/// Escapa texto para insertarlo en HTML (páginas de error)
///
/// Es el escape completo; la página del reto usa uno incompleto a propósito.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Representa una respuesta HTTP/1.0 completa
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado HTTP
    status: StatusCode,

    /// Headers HTTP (Content-Type, Content-Length, etc.)
    /// Usamos HashMap para evitar duplicados
    headers: HashMap<String, String>,

    /// Cuerpo de la respuesta (puede ser vacío)
    body: Vec<u8>,
}

impl Response {
    /// Crea una nueva respuesta con el código de estado especificado
    ///
    /// Por defecto, la respuesta no tiene headers ni body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Agrega un header a la respuesta
    ///
    /// Si el header ya existe, se sobrescribe.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Agrega un header a una respuesta existente (versión mutable)
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Establece el cuerpo de la respuesta desde un string
    ///
    /// Automáticamente calcula y agrega el header `Content-Length`.
    pub fn with_body(self, body: &str) -> Self {
        self.with_body_bytes(body.as_bytes().to_vec())
    }

    /// Establece el cuerpo de la respuesta desde bytes
    ///
    /// Útil para archivos estáticos (imágenes, SVG, etc.)
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self.headers.insert(
            "Content-Length".to_string(),
            self.body.len().to_string()
        );
        self
    }

    /// Agrega la cookie de sesión: `HttpOnly`, sin expiración, `Path=/`
    pub fn with_cookie(self, name: &str, value: &str) -> Self {
        let cookie = format!("{}={}; Path=/; HttpOnly", name, value);
        self.with_header("Set-Cookie", &cookie)
    }

    /// Crea una respuesta HTML exitosa (200 OK)
    pub fn html(body: &str) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Content-Type", "text/html; charset=utf-8")
            .with_body(body)
    }

    /// Crea una respuesta de script ejecutable (200 OK)
    pub fn javascript(body: &str) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Content-Type", "application/javascript; charset=utf-8")
            .with_body(body)
    }

    /// Crea una redirección `302 Found` hacia `location`
    pub fn redirect(location: &str) -> Self {
        Self::new(StatusCode::Found)
            .with_header("Location", location)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body(&format!("Found. Redirecting to {}", location))
    }

    /// Crea una página de error al estilo del framework
    ///
    /// Formato: `<pre>mensaje</pre>` con el mensaje escapado.
    ///
    /// # Ejemplo
    /// ```
    /// use markup_mayhem::http::{Response, StatusCode};
    ///
    /// let response = Response::error(StatusCode::NotFound, "Cannot GET /<x>");
    /// let body = String::from_utf8(response.body().to_vec()).unwrap();
    /// assert!(body.contains("<pre>Cannot GET /&lt;x&gt;</pre>"));
    /// ```
    pub fn error(status: StatusCode, message: &str) -> Self {
        let body = format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>Error</title>\n</head>\n<body>\n<pre>{}</pre>\n</body>\n</html>\n",
            escape_html(message)
        );
        Self::new(status)
            .with_header("Content-Type", "text/html; charset=utf-8")
            .with_body(&body)
    }

    /// Descarta el body conservando los headers (respuestas a HEAD)
    pub fn strip_body(&mut self) {
        self.body.clear();
    }

    /// Convierte la respuesta a bytes listos para enviar por el socket
    ///
    /// Genera el formato completo HTTP/1.0:
    /// - Status line: `HTTP/1.0 200 OK\r\n`
    /// - Headers: `Header-Name: Value\r\n`
    /// - Línea vacía: `\r\n`
    /// - Body: contenido binario
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::new();

        // 1. Status line
        let status_line = format!("HTTP/1.0 {}\r\n", self.status);
        result.extend_from_slice(status_line.as_bytes());

        // 2. Headers
        for (name, value) in &self.headers {
            let header_line = format!("{}: {}\r\n", name, value);
            result.extend_from_slice(header_line.as_bytes());
        }

        // 3. Línea vacía que separa headers del body
        result.extend_from_slice(b"\r\n");

        // 4. Body (si existe)
        result.extend_from_slice(&self.body);

        result
    }

    /// Obtiene el código de estado de la respuesta
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Obtiene una referencia a los headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Obtiene un header por nombre exacto
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    /// Obtiene una referencia al body
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body como texto (para tests y logs)
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
