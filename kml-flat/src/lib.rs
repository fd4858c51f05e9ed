//! # kml-flat
//!
//! Extraction à plat des Placemarks d'un export KML (Google My Maps).
//!
//! ## Features
//!
//! - Recherche SIMD des balises avec `memchr`, validation UTF-8 avec `simdutf8`
//! - Encodage lu depuis le BOM ou le prologue XML (`encoding_rs`)
//! - Un point par Placemark (`geo::Point`), premier tuple de `<coordinates>`
//! - Pas de LineString/Polygon ni de dossiers imbriqués
//!
//! ## Usage
//!
//! ```rust,ignore
//! let result = kml_flat::parse(kml_text.as_bytes())?;
//! for placemark in &result.placemarks {
//!     println!("{} @ {},{}", placemark.display_name(), placemark.lng(), placemark.lat());
//! }
//! ```

pub mod error;
pub mod parser;
pub mod types;

pub use error::KmlError;
pub use types::{ParseResult, Placemark};

use std::path::Path;

use tracing::debug;

/// Parse un document KML et retourne ses Placemarks ponctuels.
///
/// # Errors
///
/// Retourne `KmlError::UnclosedElement` si un `<Placemark>` n'est jamais fermé.
/// Les Placemarks sans coordonnées exploitables sont ignorés et listés dans
/// `ParseResult::errors`.
pub fn parse(data: &[u8]) -> Result<ParseResult, KmlError> {
    let decoded = parser::prolog::decode(data);
    let mut scan = parser::placemark::scan(&decoded.text)?;

    let mut errors = Vec::with_capacity(scan.errors.len() + 1);
    if let Some(e) = decoded.error {
        errors.push(e);
    }
    errors.append(&mut scan.errors);

    debug!(
        encoding = decoded.encoding.name(),
        placemarks = scan.placemarks.len(),
        skipped = scan.skipped,
        "KML parsé"
    );

    Ok(ParseResult {
        placemarks: scan.placemarks,
        skipped: scan.skipped,
        encoding: decoded.encoding.name(),
        errors,
    })
}

/// Lit puis parse un fichier KML
pub fn parse_file(path: &Path) -> Result<ParseResult, KmlError> {
    let data = std::fs::read(path)?;
    parse(&data)
}
