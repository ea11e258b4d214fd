//! # Parsing de multipart/form-data
//! src/http/multipart.rs
//!
//! Parser mínimo para los formularios `enctype="multipart/form-data"`
//! (RFC 7578). Solo lo necesario para la subida de avatares.
//!
//! ```text
//! --XyZ\r\n
//! Content-Disposition: form-data; name="avatar"; filename="a.svg"\r\n
//! Content-Type: image/svg+xml\r\n
//! \r\n
//! <svg onload=alert(1)>\r\n
//! --XyZ--\r\n
//! ```

use crate::http::Request;
use regex::Regex;
use std::sync::LazyLock;

/// Parámetros `name`/`filename` de `Content-Disposition`, con o sin comillas
static DISPOSITION_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(name|filename)\s*=\s*(?:"([^"]*)"|([^;\s]+))"#)
        .expect("regex de Content-Disposition válida")
});

/// Errores al interpretar un body multipart
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MultipartError {
    /// El request no declara `multipart/form-data`
    #[error("request is not multipart/form-data")]
    NotMultipart,

    /// Falta el parámetro `boundary` en `Content-Type`
    #[error("missing multipart boundary")]
    MissingBoundary,

    /// Estructura inválida
    #[error("malformed multipart body: {0}")]
    Malformed(String),
}

/// Una parte del formulario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Nombre del campo (`name="avatar"`)
    pub name: String,

    /// Nombre de archivo, solo para campos de tipo archivo
    pub filename: Option<String>,

    /// Tipo MIME declarado por el cliente
    pub content_type: Option<String>,

    /// Contenido crudo
    pub data: Vec<u8>,
}

impl Part {
    /// Indica si la parte es un archivo
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }
}

/// Extrae el boundary de un header `Content-Type`
///
/// # Ejemplo
/// ```
/// use markup_mayhem::http::multipart::boundary;
///
/// let b = boundary("multipart/form-data; boundary=\"----abc\"").unwrap();
/// assert_eq!(b, "----abc");
/// ```
pub fn boundary(content_type: &str) -> Result<String, MultipartError> {
    let mut params = content_type.split(';');
    let mime = params.next().unwrap_or_default().trim();
    if !mime.eq_ignore_ascii_case("multipart/form-data") {
        return Err(MultipartError::NotMultipart);
    }

    params
        .filter_map(|p| p.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|b| !b.is_empty())
        .ok_or(MultipartError::MissingBoundary)
}

/// Parsea el body multipart de un request
pub fn from_request(request: &Request) -> Result<Vec<Part>, MultipartError> {
    let content_type = request.header("Content-Type").ok_or(MultipartError::NotMultipart)?;
    let boundary = boundary(content_type)?;
    parse(request.body(), &boundary)
}

/// Parsea un body multipart dado su boundary
pub fn parse(body: &[u8], boundary: &str) -> Result<Vec<Part>, MultipartError> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let mut separator = b"\r\n".to_vec();
    separator.extend_from_slice(&delimiter);

    let mut pos = find(body, &delimiter, 0)
        .ok_or_else(|| MultipartError::Malformed("no opening delimiter".to_string()))?
        + delimiter.len();

    let mut parts = Vec::new();

    loop {
        // "--" después del delimitador marca el final
        if body[pos..].starts_with(b"--") {
            break;
        }
        if !body[pos..].starts_with(b"\r\n") {
            return Err(MultipartError::Malformed("expected CRLF after delimiter".to_string()));
        }
        pos += 2;

        let head_end = find(body, b"\r\n\r\n", pos)
            .ok_or_else(|| MultipartError::Malformed("unterminated part headers".to_string()))?;
        let head = String::from_utf8_lossy(&body[pos..head_end]);
        let data_start = head_end + 4;

        let data_end = find(body, &separator, data_start)
            .ok_or_else(|| MultipartError::Malformed("missing closing delimiter".to_string()))?;

        parts.push(parse_part(&head, body[data_start..data_end].to_vec())?);

        pos = data_end + separator.len();
    }

    Ok(parts)
}

/// Arma una parte a partir de sus headers y su contenido
fn parse_part(head: &str, data: Vec<u8>) -> Result<Part, MultipartError> {
    let mut name = None;
    let mut filename = None;
    let mut content_type = None;

    for line in head.split("\r\n") {
        let Some((header, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        if header.trim().eq_ignore_ascii_case("content-disposition") {
            for caps in DISPOSITION_PARAM.captures_iter(value) {
                let param = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                if caps[1].eq_ignore_ascii_case("name") {
                    name = Some(param);
                } else {
                    filename = Some(param);
                }
            }
        } else if header.trim().eq_ignore_ascii_case("content-type") {
            content_type = Some(value.to_string());
        }
    }

    let name = name.ok_or_else(|| MultipartError::Malformed("part without name".to_string()))?;

    Ok(Part {
        name,
        filename,
        content_type,
        data,
    })
}

/// Busca `needle` en `haystack` a partir de `from`
fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn avatar_body(content_type: &str, content: &str) -> Vec<u8> {
        format!(
            "--XyZ\r\n\
             Content-Disposition: form-data; name=\"avatar\"; filename=\"a.svg\"\r\n\
             Content-Type: {}\r\n\
             \r\n\
             {}\r\n\
             --XyZ--\r\n",
            content_type, content
        )
        .into_bytes()
    }

    #[test]
    fn test_boundary_plain_and_quoted() {
        assert_eq!(boundary("multipart/form-data; boundary=XyZ").unwrap(), "XyZ");
        assert_eq!(boundary("multipart/form-data; boundary=\"a b\"").unwrap(), "a b");
    }

    #[test]
    fn test_boundary_errors() {
        assert_eq!(boundary("application/json"), Err(MultipartError::NotMultipart));
        assert_eq!(boundary("multipart/form-data"), Err(MultipartError::MissingBoundary));
    }

    #[test]
    fn test_parse_single_file() {
        let body = avatar_body("image/svg+xml", "<svg onload=alert(1)>");
        let parts = parse(&body, "XyZ").unwrap();

        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "avatar");
        assert_eq!(parts[0].filename.as_deref(), Some("a.svg"));
        assert_eq!(parts[0].content_type.as_deref(), Some("image/svg+xml"));
        assert_eq!(parts[0].data, b"<svg onload=alert(1)>");
        assert!(parts[0].is_file());
    }

    #[test]
    fn test_parse_field_and_file() {
        let body = b"--B\r\n\
            Content-Disposition: form-data; name=title\r\n\
            \r\n\
            hola\r\n\
            --B\r\n\
            Content-Disposition: form-data; name=\"avatar\"; filename=\"x.png\"\r\n\
            Content-Type: image/png\r\n\
            \r\n\
            \x89PNG\r\n\
            --B--\r\n";
        let parts = parse(body, "B").unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name, "title");
        assert!(!parts[0].is_file());
        assert_eq!(parts[0].data, b"hola");
        assert_eq!(parts[1].data, b"\x89PNG");
    }

    #[test]
    fn test_data_may_contain_crlf() {
        let body = avatar_body("image/svg+xml", "<svg>\r\n<script>x</script>\r\n</svg>");
        let parts = parse(&body, "XyZ").unwrap();

        assert_eq!(parts[0].data, b"<svg>\r\n<script>x</script>\r\n</svg>");
    }

    #[test]
    fn test_parse_missing_closing_delimiter() {
        let body = b"--XyZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\ndata";
        let result = parse(body, "XyZ");

        assert!(matches!(result, Err(MultipartError::Malformed(_))));
    }

    #[test]
    fn test_from_request() {
        let mut raw = b"POST /upload HTTP/1.0\r\nContent-Type: multipart/form-data; boundary=XyZ\r\n\r\n".to_vec();
        raw.extend_from_slice(&avatar_body("image/svg+xml", "<svg/>"));
        let request = Request::parse(&raw).unwrap();

        let parts = from_request(&request).unwrap();
        assert_eq!(parts[0].data, b"<svg/>");
    }
}
