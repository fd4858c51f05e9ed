//! Rendus: modèles de vue sérialisables consommés par la page
//!
//! - `map`: marqueurs Leaflet, popups, ajustement de la vue
//! - `charts`: configurations Chart.js
//! - `table`: lignes du tableau

pub mod charts;
pub mod map;
pub mod table;

pub use charts::Charts;
pub use map::{MapView, MarkerSpec};
pub use table::TableRow;

/// Échappe un texte pour l'insérer dans du HTML (contenu ou attribut)
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            c => result.push(c),
        }
    }
    result
}
