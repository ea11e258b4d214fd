//! Tests de integración para el servidor del reto
//! tests/integration_test.rs
//!
//! Levantan el servidor real en un puerto efímero (una sola instancia para
//! todos los tests) con un retraso de otorgamiento corto. Cada test usa su
//! propia sesión, así que pueden correr en paralelo.

use markup_mayhem::challenge::flags::{FINAL_HINT, HINTS};
use markup_mayhem::config::Config;
use markup_mayhem::server::Server;
use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

const GRANT_DELAY_MS: u64 = 150;

/// Levanta el servidor una sola vez y retorna su dirección
fn server_addr() -> SocketAddr {
    static ADDR: OnceLock<SocketAddr> = OnceLock::new();

    *ADDR.get_or_init(|| {
        let dir = Box::leak(Box::new(tempfile::tempdir().unwrap()));
        let public = dir.path().join("public");
        fs::create_dir_all(&public).unwrap();
        fs::write(public.join("robots.txt"), "User-agent: *\nDisallow:\n").unwrap();

        let mut config = Config::default();
        config.port = 0;
        config.grant_delay_ms = GRANT_DELAY_MS;
        config.public_dir = public.display().to_string();
        config.upload_dir = dir.path().join("uploads").display().to_string();

        let server = Server::bind(config).expect("bind");
        let addr = server.local_addr().unwrap();
        thread::spawn(move || server.run());
        addr
    })
}

/// Respuesta HTTP ya separada
struct Reply {
    status_line: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Reply {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Id de sesión del `Set-Cookie`, si vino
    fn session_id(&self) -> Option<String> {
        let cookie = self.header("Set-Cookie")?;
        let pair = cookie.split(';').next()?;
        pair.strip_prefix("sessionId=").map(|id| id.to_string())
    }
}

/// Helper: envía bytes crudos y parsea la respuesta
fn send_raw(raw: &[u8]) -> Reply {
    let mut stream = TcpStream::connect(server_addr()).expect("connect");
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.write_all(raw).unwrap();
    stream.flush().unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).unwrap();
    let text = String::from_utf8_lossy(&buf).into_owned();

    let (head, body) = text.split_once("\r\n\r\n").unwrap_or((&text, ""));
    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap_or_default().to_string();
    let headers = lines
        .filter_map(|line| line.split_once(": "))
        .map(|(n, v)| (n.to_string(), v.to_string()))
        .collect();

    Reply {
        status_line,
        headers,
        body: body.to_string(),
    }
}

fn get(target: &str, session: Option<&str>) -> Reply {
    let cookie = session
        .map(|id| format!("Cookie: sessionId={}\r\n", id))
        .unwrap_or_default();
    send_raw(format!("GET {} HTTP/1.0\r\n{}\r\n", target, cookie).as_bytes())
}

fn post(target: &str, session: &str, content_type: &str, body: &[u8]) -> Reply {
    let mut raw = format!(
        "POST {} HTTP/1.0\r\nCookie: sessionId={}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
        target,
        session,
        content_type,
        body.len()
    )
    .into_bytes();
    raw.extend_from_slice(body);
    send_raw(&raw)
}

fn post_form(target: &str, session: &str, body: &str) -> Reply {
    post(target, session, "application/x-www-form-urlencoded", body.as_bytes())
}

/// Abre una sesión nueva visitando la página principal
fn new_session() -> String {
    get("/", None).session_id().expect("session cookie")
}

fn page(session: &str) -> String {
    get("/", Some(session)).body
}

/// Espera hasta que la página muestre `needle`
fn wait_for(session: &str, needle: &str) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if page(session).contains(needle) {
            return true;
        }
        thread::sleep(Duration::from_millis(25));
    }
    false
}

#[test]
fn test_index_sets_session_and_policy() {
    let reply = get("/", None);

    assert!(reply.status_line.contains("200 OK"), "got: {}", reply.status_line);
    let cookie = reply.header("Set-Cookie").unwrap();
    assert!(cookie.ends_with("; Path=/; HttpOnly"));
    assert!(reply
        .header("Content-Security-Policy")
        .unwrap()
        .contains("script-src 'self' https://cdnjs.cloudflare.com 'unsafe-eval'"));
    assert!(reply.header("X-Request-Id").is_some());
    assert!(reply.body.contains(HINTS[0]));
    assert!(!reply.body.contains("Current progress"));
}

#[test]
fn test_reflected_search_flow() {
    let session = new_session();

    let reply = get("/search?q=%3Cimg%20src%3Dx%20onerror%3Dalert(1)%3E", Some(&session));
    assert!(reply.status_line.contains("302 Found"));
    assert_eq!(
        reply.header("Location"),
        Some("/?q=%3Cimg%20src%3Dx%20onerror%3Dalert(1)%3E")
    );

    let body = get(reply.header("Location").unwrap(), Some(&session)).body;
    assert!(body.contains("You searched for: &lt;img src=x onerror=alert(1)&gt;"));
    assert!(body.contains("Current progress: mmuctf{d0m_x5s_"));
}

#[test]
fn test_stored_comment_granted_after_delay() {
    let session = new_session();

    let reply = post_form("/comment", &session, "comment=%3Cscript%3Efetch(document.cookie)%3C%2Fscript%3E");
    assert!(reply.status_line.contains("302 Found"));
    assert_eq!(reply.header("Location"), Some("/"));

    // El comentario se refleja con `<` y `>` escapados
    let body = page(&session);
    assert!(body.contains("&lt;script&gt;fetch(document.cookie)&lt;/script&gt;"));
    assert!(!body.contains("st0r3d_x5s_"));

    assert!(wait_for(&session, "Current progress: st0r3d_x5s_"));
}

#[test]
fn test_csp_bypass_once() {
    let session = new_session();

    let first = post("/csp-bypass", &session, "text/plain", b"");
    let second = post("/csp-bypass", &session, "text/plain", b"");

    assert_eq!(first.header("Location"), Some("/?csp_success=1"));
    assert_eq!(second.header("Location"), Some("/"));

    let body = get("/?csp_success=1", Some(&session)).body;
    assert!(body.contains("CSP bypass detected!"));
    assert!(body.contains("Current progress: c5p_byp45s!*!}"));
}

#[test]
fn test_svg_upload_flow() {
    let session = new_session();
    let body = "--b0undary\r\n\
                Content-Disposition: form-data; name=\"avatar\"; filename=\"x.svg\"\r\n\
                Content-Type: image/svg+xml\r\n\r\n\
                <svg xmlns=\"http://www.w3.org/2000/svg\" onload=\"alert(1)\"></svg>\r\n\
                --b0undary--\r\n";

    let reply = post("/upload", &session, "multipart/form-data; boundary=b0undary", body.as_bytes());
    assert_eq!(reply.header("Location"), Some("/"));

    assert!(page(&session).contains("Current progress: s>g_x5s_"));
}

#[test]
fn test_full_flag() {
    let session = new_session();

    get("/search?q=%3Cimg+onerror%3D1%3E", Some(&session));
    post_form("/comment", &session, "comment=document.cookie");
    assert!(wait_for(&session, "st0r3d_x5s_"));

    let svg = "--zz\r\n\
               Content-Disposition: form-data; name=\"avatar\"; filename=\"a.svg\"\r\n\
               Content-Type: image/svg+xml\r\n\r\n\
               <svg><script>alert(1)</script></svg>\r\n\
               --zz--\r\n";
    post("/upload", &session, "multipart/form-data; boundary=zz", svg.as_bytes());
    post("/csp-bypass", &session, "text/plain", b"");

    let body = page(&session);
    assert!(body.contains("mmuctf{d0m_x5s_st0r3d_x5s_s>g_x5s_c5p_byp45s!*!}"));
    assert!(body.contains(FINAL_HINT));
}

#[test]
fn test_sessions_are_isolated() {
    let solver = new_session();
    let other = new_session();

    post("/csp-bypass", &solver, "text/plain", b"");

    assert!(page(&solver).contains("Current progress"));
    assert!(!page(&other).contains("Current progress"));
}

#[test]
fn test_unknown_cookie_gets_fresh_session() {
    let reply = post_form("/comment", "forged-id", "comment=hola");

    assert!(reply.status_line.contains("302 Found"));
    let id = reply.session_id().expect("new session cookie");
    assert_ne!(id, "forged-id");
    assert!(page(&id).contains("hola"));
}

#[test]
fn test_jsonp_callback() {
    let reply = get("/jsonp?callback=alert", None);

    assert!(reply.status_line.contains("200 OK"));
    assert_eq!(
        reply.header("Content-Type"),
        Some("application/javascript; charset=utf-8")
    );
    assert_eq!(reply.body, r#"alert({"data":"test"})"#);
}

#[test]
fn test_static_file_and_not_found() {
    let robots = get("/robots.txt", None);
    assert!(robots.status_line.contains("200 OK"));
    assert!(robots.body.starts_with("User-agent: *"));

    let missing = get("/nope", None);
    assert!(missing.status_line.contains("404 Not Found"));
    assert!(missing.body.contains("Cannot GET /nope"));

    let traversal = get("/../Cargo.toml", None);
    assert!(traversal.status_line.contains("404 Not Found"));
}

#[test]
fn test_malformed_request() {
    let reply = send_raw(b"BREW /pot HTTP/1.0\r\n\r\n");
    assert!(reply.status_line.contains("400 Bad Request"));
}
