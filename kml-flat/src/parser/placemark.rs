//! Parcours des blocs `<Placemark>` et lecture des coordonnées

use geo::Point;
use memchr::memmem;
use tracing::debug;

use super::element::{find_open_tag, first_text};
use crate::types::Placemark;
use crate::KmlError;

/// Résultat brut du parcours
#[derive(Debug, Default)]
pub struct Scan {
    pub placemarks: Vec<Placemark>,
    pub skipped: usize,
    pub errors: Vec<KmlError>,
}

/// Parcourt tous les Placemarks du document (extraction à plat, sans dossiers)
pub fn scan(text: &str) -> Result<Scan, KmlError> {
    let bytes = text.as_bytes();
    let close_finder = memmem::Finder::new(b"</Placemark>");
    let mut scan = Scan::default();
    let mut cursor = 0;
    let mut index = 0;

    while let Some((start, body_start, self_closing)) = find_open_tag(text, "Placemark", cursor) {
        if self_closing {
            scan.skipped += 1;
            scan.errors.push(KmlError::MissingCoordinates { index });
            cursor = body_start;
            index += 1;
            continue;
        }

        let Some(rel) = close_finder.find(&bytes[body_start..]) else {
            return Err(KmlError::UnclosedElement {
                element: "Placemark".to_string(),
                offset: start,
            });
        };
        let body_end = body_start + rel;
        let block = &text[body_start..body_end];

        match read_placemark(block, index) {
            Ok(placemark) => scan.placemarks.push(placemark),
            Err(e) => {
                debug!(index, error = %e, "Placemark ignoré");
                scan.skipped += 1;
                scan.errors.push(e);
            }
        }

        cursor = body_end + "</Placemark>".len();
        index += 1;
    }

    Ok(scan)
}

/// Construit un Placemark depuis le contenu de son bloc
fn read_placemark(block: &str, index: usize) -> Result<Placemark, KmlError> {
    let raw = first_text(block, "coordinates")
        .filter(|c| !c.is_empty())
        .ok_or(KmlError::MissingCoordinates { index })?;

    let (lng, lat, altitude) =
        parse_coordinates(&raw).ok_or_else(|| KmlError::invalid_coordinates(index, raw.as_str()))?;

    Ok(Placemark {
        index,
        name: first_text(block, "name"),
        description: first_text(block, "description"),
        point: Point::new(lng, lat),
        altitude,
    })
}

/// Lit le premier tuple `lng,lat[,alt]` d'un texte `<coordinates>`.
///
/// Les espaces autour des virgules sont tolérés; l'altitude illisible est ignorée.
pub fn parse_coordinates(raw: &str) -> Option<(f64, f64, Option<f64>)> {
    let tuple = first_tuple(raw)?;
    let mut parts = tuple.split(',');

    let lng: f64 = fast_float::parse(parts.next()?.trim()).ok()?;
    let lat: f64 = fast_float::parse(parts.next()?.trim()).ok()?;
    if !lng.is_finite() || !lat.is_finite() {
        return None;
    }

    let altitude = parts
        .next()
        .and_then(|a| fast_float::parse::<f64, _>(a.trim()).ok())
        .filter(|a| a.is_finite());

    Some((lng, lat, altitude))
}

/// Regroupe les jetons du premier tuple ("10.5, 20.3" compte pour un seul tuple)
fn first_tuple(raw: &str) -> Option<String> {
    let mut tokens = raw.split_ascii_whitespace().peekable();
    let mut tuple = tokens.next()?.to_string();

    while let Some(next) = tokens.peek() {
        if tuple.ends_with(',') || next.starts_with(',') {
            tuple.push_str(next);
            tokens.next();
        } else {
            break;
        }
    }

    Some(tuple)
}
