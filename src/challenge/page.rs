//! # Renderizado de la Página del Reto
//! src/challenge/page.rs
//!
//! La página se genera con una plantilla `minijinja` (`templates/index.html`)
//! con el auto-escape desactivado. Los valores que vienen del usuario pasan
//! por el filtro `angle_escape`, que solo reemplaza `<` y `>`: comillas y `&`
//! quedan intactos. Ese escape incompleto es parte del reto.

use crate::challenge::flags::{self, FlagPart};
use minijinja::{context, AutoEscape, Environment};

const PAGE_TEMPLATE: &str = "index.html";
const PAGE_SOURCE: &str = include_str!("../../templates/index.html");

/// Escape incompleto: solo `<` y `>`
///
/// # Ejemplo
/// ```
/// use markup_mayhem::challenge::page::angle_escape;
///
/// assert_eq!(angle_escape("<b title=\"a&b\">"), "&lt;b title=\"a&b\"&gt;");
/// ```
pub fn angle_escape(value: &str) -> String {
    value.replace('<', "&lt;").replace('>', "&gt;")
}

/// Datos de entrada de una vista de la página
#[derive(Debug, Clone, Copy)]
pub struct PageView<'a> {
    /// Parámetro `q` de la URL
    pub search: Option<&'a str>,

    /// Comentarios de la sesión
    pub comments: &'a [String],

    /// Partes resueltas, en orden de resolución
    pub solved: &'a [FlagPart],

    /// Parámetro `csp_success` presente y no vacío
    pub csp_success: bool,
}

/// Renderizador de la página principal
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    /// Compila la plantilla de la página
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.add_filter("angle_escape", |value: String| angle_escape(&value));
        env.add_template(PAGE_TEMPLATE, PAGE_SOURCE)?;
        Ok(Self { env })
    }

    /// Renderiza la página para una sesión
    pub fn render(&self, view: &PageView<'_>) -> Result<String, minijinja::Error> {
        let level = view.solved.len();
        let template = self.env.get_template(PAGE_TEMPLATE)?;

        template.render(context! {
            search => view.search,
            comments => view.comments,
            csp_success => view.csp_success,
            level => level,
            progress => flags::progress(view.solved),
            hint => flags::hint_for(level),
        })
    }
}
