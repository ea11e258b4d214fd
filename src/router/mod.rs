//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Este módulo implementa el router que mapea método + path a handlers.
//!
//! ## Arquitectura
//!
//! ```text
//! Request → Router → Handler → Response
//!             │
//!             └─ sin ruta → archivo estático → 404
//! ```
//!
//! Las rutas registradas tienen prioridad sobre los archivos del directorio
//! público. Un `HEAD` se atiende con el handler del `GET` correspondiente.

use crate::app::AppState;
use crate::assets;
use crate::challenge::handlers;
use crate::http::{Method, Request, Response, StatusCode};

/// Política de seguridad enviada en todas las respuestas
///
/// Permite `unsafe-eval` y scripts de cdnjs: ambos son vectores del reto.
pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
script-src 'self' https://cdnjs.cloudflare.com 'unsafe-eval'; \
style-src 'self' 'unsafe-inline'; \
img-src 'self' data:; \
connect-src 'self'; \
frame-src 'none'; \
object-src 'none'";

/// Tipo de función handler
///
/// Un handler recibe el Request y el estado compartido y retorna una Response
pub type Handler = fn(&Request, &AppState) -> Response;

/// Router que mapea (método, path) a handlers
pub struct Router {
    routes: Vec<(Method, String, Handler)>,
}

impl Router {
    /// Crea un nuevo router vacío
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Router con todos los endpoints del reto
    pub fn challenge() -> Self {
        let mut router = Self::new();
        router.register(Method::GET, "/", handlers::index);
        router.register(Method::GET, "/search", handlers::search);
        router.register(Method::POST, "/comment", handlers::comment);
        router.register(Method::POST, "/csp-bypass", handlers::csp_bypass);
        router.register(Method::POST, "/upload", handlers::upload);
        router.register(Method::GET, "/jsonp", handlers::jsonp);
        router
    }

    /// Registra una ruta con su handler
    pub fn register(&mut self, method: Method, path: &str, handler: Handler) {
        self.routes.push((method, path.to_string(), handler));
    }

    /// Encuentra y ejecuta el handler apropiado para un request
    ///
    /// Sin ruta, los GET/HEAD buscan un archivo estático; si tampoco hay
    /// archivo se responde 404 Not Found.
    pub fn route(&self, request: &Request, state: &AppState) -> Response {
        let mut response = match self.find(request.method(), request.path()) {
            Some(handler) => handler(request, state),
            None => self.fallback(request, state),
        };

        self.add_common_headers(&mut response);
        response
    }

    /// Busca el handler de (método, path)
    fn find(&self, method: Method, path: &str) -> Option<Handler> {
        let method = match method {
            Method::HEAD => Method::GET,
            other => other,
        };

        self.routes
            .iter()
            .find(|(m, p, _)| *m == method && p == path)
            .map(|(_, _, handler)| *handler)
    }

    fn fallback(&self, request: &Request, state: &AppState) -> Response {
        let method = request.method();
        if matches!(method, Method::GET | Method::HEAD) {
            if let Some(response) = assets::serve(&state.settings.public_dir, request.path()) {
                return response;
            }
        }

        Response::error(
            StatusCode::NotFound,
            &format!("Cannot {} {}", method.as_str(), request.path()),
        )
    }

    /// Agrega headers comunes a todas las respuestas
    pub fn add_common_headers(&self, response: &mut Response) {
        response.add_header("Content-Security-Policy", CONTENT_SECURITY_POLICY);
        response.add_header("Server", "MarkupMayhem/1.0");
        response.add_header("Connection", "close");
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::challenge()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Settings;
    use crate::scheduler::ManualClock;
    use std::fs;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_state() -> (AppState, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("robots.txt"), "User-agent: *\n").unwrap();
        let settings = Settings {
            grant_delay: Duration::from_secs(15),
            public_dir: dir.path().to_path_buf(),
            upload_dir: dir.path().join("uploads"),
            keep_uploads: false,
        };
        let state = AppState::new(settings, Arc::new(ManualClock::new())).unwrap();
        (state, dir)
    }

    fn ok_handler(_req: &Request, _state: &AppState) -> Response {
        Response::html("ok")
    }

    fn route(router: &Router, raw: &[u8]) -> Response {
        let (state, _dir) = test_state();
        router.route(&Request::parse(raw).unwrap(), &state)
    }

    #[test]
    fn test_router_creation() {
        let router = Router::new();
        assert_eq!(router.routes.len(), 0);
        assert_eq!(Router::challenge().routes.len(), 6);
    }

    #[test]
    fn test_route_found() {
        let mut router = Router::new();
        router.register(Method::GET, "/test", ok_handler);

        let response = route(&router, b"GET /test HTTP/1.0\r\n\r\n");
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.body_text(), "ok");
    }

    #[test]
    fn test_head_uses_get_handler() {
        let mut router = Router::new();
        router.register(Method::GET, "/test", ok_handler);

        let response = route(&router, b"HEAD /test HTTP/1.0\r\n\r\n");
        assert_eq!(response.status(), StatusCode::Ok);
    }

    #[test]
    fn test_wrong_method_not_found() {
        let router = Router::challenge();

        let response = route(&router, b"GET /comment HTTP/1.0\r\n\r\n");
        assert_eq!(response.status(), StatusCode::NotFound);
        assert!(response.body_text().contains("Cannot GET /comment"));
    }

    #[test]
    fn test_route_not_found_is_escaped() {
        let router = Router::new();

        let response = route(&router, b"POST /%3Cx%3E HTTP/1.0\r\nContent-Length: 0\r\n\r\n");
        assert_eq!(response.status(), StatusCode::NotFound);
        assert!(response.body_text().contains("Cannot POST /&lt;x&gt;"));
    }

    #[test]
    fn test_static_fallback() {
        let router = Router::challenge();

        let response = route(&router, b"GET /robots.txt HTTP/1.0\r\n\r\n");
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.body_text(), "User-agent: *\n");
    }

    #[test]
    fn test_static_fallback_only_for_get() {
        let router = Router::challenge();

        let response = route(&router, b"POST /robots.txt HTTP/1.0\r\nContent-Length: 0\r\n\r\n");
        assert_eq!(response.status(), StatusCode::NotFound);
    }

    #[test]
    fn test_common_headers_on_every_response() {
        let router = Router::challenge();

        for raw in [&b"GET /jsonp HTTP/1.0\r\n\r\n"[..], &b"GET /missing HTTP/1.0\r\n\r\n"[..]] {
            let response = route(&router, raw);
            assert_eq!(
                response.header("Content-Security-Policy"),
                Some(CONTENT_SECURITY_POLICY)
            );
            assert_eq!(response.header("Connection"), Some("close"));
        }
    }
}
