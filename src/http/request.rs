//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Este módulo implementa un parser HTTP/1.0 desde cero.
//!
//! ## Formato de un Request HTTP/1.0
//!
//! ```text
//! POST /comment HTTP/1.0\r\n
//! Cookie: sessionId=k3j2h1\r\n
//! Content-Type: application/x-www-form-urlencoded\r\n
//! Content-Length: 13\r\n
//! \r\n
//! comment=hola
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD /path?query HTTP/1.0`
//! 2. **Headers**: Pares `Name: Value` (uno por línea)
//! 3. **Empty Line**: `\r\n` que separa headers del body
//! 4. **Body**: bytes crudos (formularios, JSON o multipart)

use percent_encoding::percent_decode_str;
use std::collections::HashMap;

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Obtener un recurso
    GET,

    /// HEAD - Como GET pero solo retorna headers
    HEAD,

    /// POST - Enviar datos a un recurso
    POST,
}

impl Method {
    /// Parsea un método HTTP desde un string
    fn from_str(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            "POST" => Ok(Method::POST),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
        }
    }
}

/// Representa un request HTTP/1.0 parseado
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP (GET, HEAD, POST)
    method: Method,

    /// Path de la petición, ya decodificado (ej: "/search")
    path: String,

    /// Query parameters decodificados (ej: {"q": "<img src=x>"})
    query_params: HashMap<String, String>,

    /// Headers HTTP con el nombre en minúsculas
    headers: HashMap<String, String>,

    /// Cookies del header `Cookie`
    cookies: HashMap<String, String>,

    /// Versión HTTP ("HTTP/1.0" o "HTTP/1.1")
    version: String,

    /// Body crudo del request
    body: Vec<u8>,
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Request incompleto o truncado
    #[error("Incomplete HTTP request")]
    IncompleteRequest,

    /// Formato inválido de la request line
    #[error("Invalid request line format")]
    InvalidRequestLine,

    /// Método HTTP no soportado
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// Versión HTTP incorrecta
    #[error("Invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    /// Header malformado
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Request vacío
    #[error("Empty request")]
    EmptyRequest,
}

/// Busca el fin de los headers (`\r\n\r\n`)
///
/// Retorna la posición del primer byte del separador, o `None` si todavía
/// no se recibió completo.
pub fn find_head_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Decodifica un componente `application/x-www-form-urlencoded`
///
/// Primero `+` → espacio y luego `%XX`, así `%2B` sigue siendo `+`.
///
/// # Ejemplo
/// ```
/// use markup_mayhem::http::request::decode_component;
///
/// assert_eq!(decode_component("%3Cimg+src%3Dx%3E"), "<img src=x>");
/// assert_eq!(decode_component("1%2B1"), "1+1");
/// ```
pub fn decode_component(s: &str) -> String {
    let spaced = s.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Parsea una query string (o un body urlencoded) en un HashMap
///
/// Ejemplo: "q=hola&csp_success=1"
/// Retorna: {"q": "hola", "csp_success": "1"}
pub fn parse_query_string(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for param in query.split('&') {
        if param.is_empty() {
            continue;
        }

        match param.split_once('=') {
            Some((key, value)) => {
                params.insert(decode_component(key), decode_component(value));
            }
            None => {
                // Parámetro sin valor (ej: "?debug")
                params.insert(decode_component(param), String::new());
            }
        }
    }

    params
}

impl Request {
    /// Parsea un request HTTP/1.0 desde bytes
    ///
    /// El buffer debe contener el request completo: headers y body.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use markup_mayhem::http::Request;
    ///
    /// let raw = b"GET /search?q=hola%20mundo HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/search");
    /// assert_eq!(request.query_param("q"), Some("hola mundo"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        // Separar head y body a nivel de bytes: el body puede ser binario
        let (head_bytes, body) = match find_head_end(buffer) {
            Some(pos) => (&buffer[..pos], buffer[pos + 4..].to_vec()),
            None => (buffer, Vec::new()),
        };

        let head = std::str::from_utf8(head_bytes).map_err(|_| ParseError::InvalidRequestLine)?;

        if head.trim().is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        let mut lines = head.split("\r\n");
        let request_line = lines.next().ok_or(ParseError::IncompleteRequest)?;

        // 1. Request line
        let (method, path, query_params, version) = Self::parse_request_line(request_line)?;

        // 2. Headers
        let headers = Self::parse_headers(lines)?;

        // 3. Cookies
        let cookies = headers
            .get("cookie")
            .map(|raw| Self::parse_cookies(raw))
            .unwrap_or_default();

        Ok(Request {
            method,
            path,
            query_params,
            headers,
            cookies,
            version,
            body,
        })
    }

    /// Parsea la request line
    ///
    /// Formato: `GET /path?query HTTP/1.0`
    fn parse_request_line(line: &str) -> Result<(Method, String, HashMap<String, String>, String), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        // Debe tener exactamente 3 partes: METHOD PATH VERSION
        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::from_str(parts[0])?;

        let (path, query_params) = match parts[1].split_once('?') {
            Some((path, query)) => (path, parse_query_string(query)),
            None => (parts[1], HashMap::new()),
        };
        let path = percent_decode_str(path).decode_utf8_lossy().into_owned();

        let version = parts[2].to_string();
        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(version));
        }

        Ok((method, path, query_params, version))
    }

    /// Parsea los headers HTTP
    ///
    /// Los nombres se guardan en minúsculas para buscar sin importar el caso.
    fn parse_headers<'a>(lines: impl Iterator<Item = &'a str>) -> Result<HashMap<String, String>, ParseError> {
        let mut headers = HashMap::new();

        for line in lines {
            if line.trim().is_empty() {
                break;
            }

            match line.split_once(':') {
                Some((name, value)) => {
                    headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
                }
                None => return Err(ParseError::InvalidHeader(line.to_string())),
            }
        }

        Ok(headers)
    }

    /// Parsea el header `Cookie: a=1; b=2`
    fn parse_cookies(raw: &str) -> HashMap<String, String> {
        raw.split(';')
            .filter_map(|pair| pair.split_once('='))
            .map(|(name, value)| {
                let value = value.trim().trim_matches('"');
                (
                    name.trim().to_string(),
                    percent_decode_str(value).decode_utf8_lossy().into_owned(),
                )
            })
            .collect()
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> Method {
        self.method
    }

    /// Obtiene el path del request
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Obtiene todos los query parameters
    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    /// Obtiene un query parameter específico
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(|s| s.as_str())
    }

    /// Obtiene todos los headers (nombres en minúsculas)
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Obtiene un header específico, sin importar mayúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
    }

    /// Obtiene una cookie por nombre
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|s| s.as_str())
    }

    /// Valor de `Content-Length`, si es un número válido
    pub fn content_length(&self) -> Option<usize> {
        self.header("Content-Length").and_then(|v| v.parse().ok())
    }

    /// Tipo de contenido sin parámetros (ej: "multipart/form-data")
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim())
    }

    /// Obtiene la versión HTTP
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Obtiene el body del request
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Obtiene el body del request como String
    pub fn body_string(&self) -> Option<String> {
        String::from_utf8(self.body.clone()).ok()
    }

    /// Campos de un body `application/x-www-form-urlencoded`
    pub fn form_params(&self) -> HashMap<String, String> {
        parse_query_string(&String::from_utf8_lossy(&self.body))
    }
}
