//! # Archivos Estáticos
//! src/assets.rs
//!
//! Sirve archivos del directorio público para GET/HEAD que no coinciden con
//! ninguna ruta. Solo se aceptan paths relativos simples: cualquier `..`,
//! raíz o prefijo hace que el archivo se considere inexistente.

use crate::http::{Response, StatusCode};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Tipo MIME según la extensión del archivo
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// Resuelve `request_path` dentro de `public_dir`
///
/// Retorna `None` si el path intenta salir del directorio.
pub fn resolve(public_dir: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));

    let mut components = relative.components().peekable();
    components.peek()?;
    if !components.all(|c| matches!(c, Component::Normal(_))) {
        debug!(path = %request_path, "rejected static path");
        return None;
    }

    Some(public_dir.join(relative))
}

/// Sirve un archivo estático, si existe
pub fn serve(public_dir: &Path, request_path: &str) -> Option<Response> {
    let path = resolve(public_dir, request_path)?;
    if !path.is_file() {
        return None;
    }

    match fs::read(&path) {
        Ok(bytes) => {
            debug!(path = %path.display(), bytes = bytes.len(), "static file");
            Some(
                Response::new(StatusCode::Ok)
                    .with_header("Content-Type", content_type_for(&path))
                    .with_body_bytes(bytes),
            )
        }
        Err(e) => {
            warn!(path = %path.display(), "failed to read static file: {}", e);
            None
        }
    }
}
