//! # Reto "Markup Mayhem"
//! src/challenge/mod.rs
//!
//! - `flags`: partes del flag y pistas
//! - `triggers`: detectores de payloads
//! - `page`: página principal
//! - `handlers`: endpoints

pub mod flags;
pub mod handlers;
pub mod page;
pub mod triggers;

pub use flags::FlagPart;
pub use page::{PageRenderer, PageView};
