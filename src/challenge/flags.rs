//! # Partes del Flag y Pistas
//! src/challenge/flags.rs
//!
//! El flag completo se arma concatenando las cuatro partes. Cada parte se
//! desbloquea resolviendo un reto distinto.

/// Fragmentos del flag, en orden de índice
pub const FLAG_PARTS: [&str; 4] = [
    "mmuctf{d0m_x5s_",
    "st0r3d_x5s_",
    "s>g_x5s_",
    "c5p_byp45s!*!}",
];

/// Pistas, elegidas por cantidad de retos resueltos
pub const HINTS: [&str; 4] = [
    "Some elements have attributes that can run code when certain events occur",
    "The administrator has a routine inspection pattern!!!",
    "Vector graphics can be more than just pretty pictures...",
    "Our content policy trusts a popular CDN - maybe their libraries know some interesting tricks?",
];

/// Mensaje final cuando ya no quedan pistas
pub const FINAL_HINT: &str = "Congratulations!";

/// Reto asociado a cada parte del flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagPart {
    /// XSS reflejado en `/search`
    ReflectedSearch = 0,

    /// XSS almacenado que roba cookies
    StoredCookie = 1,

    /// SVG con script subido como avatar
    SvgUpload = 2,

    /// Bypass de la Content-Security-Policy
    CspBypass = 3,
}

impl FlagPart {
    pub const ALL: [FlagPart; 4] = [
        FlagPart::ReflectedSearch,
        FlagPart::StoredCookie,
        FlagPart::SvgUpload,
        FlagPart::CspBypass,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Fragmento del flag de este reto
    pub fn fragment(self) -> &'static str {
        FLAG_PARTS[self.index()]
    }
}

/// Pista para el nivel actual (cantidad de partes resueltas)
///
/// # Ejemplo
/// ```
/// use markup_mayhem::challenge::flags::{hint_for, FINAL_HINT, HINTS};
///
/// assert_eq!(hint_for(0), HINTS[0]);
/// assert_eq!(hint_for(4), FINAL_HINT);
/// ```
pub fn hint_for(level: usize) -> &'static str {
    HINTS.get(level).copied().unwrap_or(FINAL_HINT)
}

/// Concatena los fragmentos en el orden en que se resolvieron
///
/// No se reordena por índice: resolver la parte 2 antes que la 0 muestra
/// `s>g_x5s_mmuctf{d0m_x5s_`.
pub fn progress(solved: &[FlagPart]) -> String {
    solved.iter().map(|part| part.fragment()).collect()
}
