//! # Handlers del Reto
//! src/challenge/handlers.rs
//!
//! Un handler por endpoint. Todos resuelven la sesión con
//! `get_or_create`: una cookie ausente o desconocida produce una sesión
//! nueva y un `Set-Cookie` en la respuesta, nunca un error.

use crate::app::{AppState, Settings};
use crate::challenge::flags::FlagPart;
use crate::challenge::page::PageView;
use crate::challenge::triggers;
use crate::http::multipart::{self, Part};
use crate::http::{Request, Response, StatusCode};
use crate::session::SESSION_COOKIE;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::fs;
use std::io::{self, Write};
use tracing::{debug, error, info, warn};

/// Caracteres que `encodeURIComponent` deja sin codificar
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Campo del avatar en el formulario multipart
const AVATAR_FIELD: &str = "avatar";

/// Body JSON de `/comment`
#[derive(Debug, Default, Deserialize)]
struct CommentForm {
    #[serde(default)]
    comment: String,
}

/// Sesión resuelta para un request
struct Visitor {
    id: String,
    created: bool,
}

impl Visitor {
    fn resolve(request: &Request, state: &AppState) -> Self {
        let (id, created) = state.store.get_or_create(request.cookie(SESSION_COOKIE));
        Self { id, created }
    }

    /// Agrega el `Set-Cookie` si la sesión es nueva
    fn attach(&self, response: Response) -> Response {
        if self.created {
            response.with_cookie(SESSION_COOKIE, &self.id)
        } else {
            response
        }
    }
}

/// GET / - página principal
///
/// Siempre envía la cookie de sesión, sea nueva o no.
pub fn index(request: &Request, state: &AppState) -> Response {
    let visitor = Visitor::resolve(request, state);
    let session = state.store.snapshot(&visitor.id).unwrap_or_default();

    let view = PageView {
        search: request.query_param("q"),
        comments: session.comments(),
        solved: session.solved(),
        csp_success: request.query_param("csp_success").is_some_and(|v| !v.is_empty()),
    };

    let response = match state.renderer.render(&view) {
        Ok(html) => Response::html(&html),
        Err(e) => {
            error!("failed to render page: {}", e);
            Response::error(StatusCode::InternalServerError, "Internal Server Error")
        }
    };

    response.with_cookie(SESSION_COOKIE, &visitor.id)
}

/// GET /search - reto 0
pub fn search(request: &Request, state: &AppState) -> Response {
    let visitor = Visitor::resolve(request, state);
    let query = request.query_param("q").unwrap_or("");

    if triggers::is_reflected_xss(query) && state.store.mark_solved(&visitor.id, FlagPart::ReflectedSearch) {
        info!(session = %visitor.id, "reflected XSS solved");
    }

    let location = format!("/?q={}", utf8_percent_encode(query, URI_COMPONENT));
    visitor.attach(Response::redirect(&location))
}

/// POST /comment - retos 1 y 3 (diferidos)
pub fn comment(request: &Request, state: &AppState) -> Response {
    let visitor = Visitor::resolve(request, state);
    let comment = comment_field(request);

    if triggers::steals_cookie(&comment) {
        state.schedule_grant(&visitor.id, FlagPart::StoredCookie);
    }
    if triggers::bypasses_policy(&comment) {
        state.schedule_grant(&visitor.id, FlagPart::CspBypass);
    }

    state.store.push_comment(&visitor.id, comment);
    visitor.attach(Response::redirect("/"))
}

/// POST /csp-bypass - reto 3 (inmediato)
pub fn csp_bypass(request: &Request, state: &AppState) -> Response {
    let visitor = Visitor::resolve(request, state);

    let response = if state.store.mark_solved(&visitor.id, FlagPart::CspBypass) {
        info!(session = %visitor.id, "CSP bypass solved");
        // Un comentario pudo haber dejado este mismo otorgamiento en espera
        if state.store.cancel_pending(&visitor.id, FlagPart::CspBypass) {
            debug!(session = %visitor.id, "pending CSP grant cancelled");
        }
        Response::redirect("/?csp_success=1")
    } else {
        Response::redirect("/")
    };

    visitor.attach(response)
}

/// POST /upload - reto 2
pub fn upload(request: &Request, state: &AppState) -> Response {
    let visitor = Visitor::resolve(request, state);

    let parts = match multipart::from_request(request) {
        Ok(parts) => parts,
        Err(e) => {
            debug!("upload without avatar: {}", e);
            return visitor.attach(Response::redirect("/"));
        }
    };

    let Some(avatar) = parts.into_iter().find(|p| p.name == AVATAR_FIELD && p.is_file()) else {
        debug!("upload without avatar field");
        return visitor.attach(Response::redirect("/"));
    };

    match store_upload(&state.settings, &avatar) {
        Ok(content) => {
            if triggers::is_svg_payload(avatar.content_type.as_deref(), &content)
                && state.store.mark_solved(&visitor.id, FlagPart::SvgUpload)
            {
                info!(session = %visitor.id, "SVG upload solved");
            }
        }
        Err(e) => warn!("failed to store upload: {}", e),
    }

    visitor.attach(Response::redirect("/"))
}

/// GET /jsonp - script con el callback elegido por el cliente
///
/// El nombre no se valida: cualquier texto termina dentro del script.
pub fn jsonp(request: &Request, _state: &AppState) -> Response {
    let callback = request
        .query_param("callback")
        .filter(|c| !c.is_empty())
        .unwrap_or("callback");
    let payload = serde_json::json!({ "data": "test" });

    Response::javascript(&format!("{}({})", callback, payload))
}

/// Lee el campo `comment` del body (formulario o JSON)
fn comment_field(request: &Request) -> String {
    match request.content_type() {
        Some("application/json") => serde_json::from_slice::<CommentForm>(request.body())
            .map(|form| form.comment)
            .unwrap_or_else(|e| {
                debug!("invalid JSON comment: {}", e);
                String::new()
            }),
        _ => request.form_params().remove("comment").unwrap_or_default(),
    }
}

/// Escribe el avatar en el directorio de uploads y lo relee como texto
///
/// El archivo temporal se borra al salir salvo con `keep_uploads`.
fn store_upload(settings: &Settings, avatar: &Part) -> io::Result<String> {
    fs::create_dir_all(&settings.upload_dir)?;

    let mut file = tempfile::Builder::new()
        .prefix("avatar-")
        .tempfile_in(&settings.upload_dir)?;
    file.write_all(&avatar.data)?;
    file.flush()?;

    let content = fs::read(file.path())?;
    debug!(path = %file.path().display(), bytes = content.len(), "avatar stored");

    if settings.keep_uploads {
        let (_, path) = file.keep()?;
        debug!(path = %path.display(), "avatar kept");
    }

    Ok(String::from_utf8_lossy(&content).into_owned())
}
