//! Types de données pour le crate kml-flat

use geo::Point;

use crate::KmlError;

/// Résultat du parsing d'un document KML
#[derive(Debug)]
pub struct ParseResult {
    /// Placemarks ponctuels, dans l'ordre du document
    pub placemarks: Vec<Placemark>,

    /// Nombre de Placemarks ignorés (sans coordonnées exploitables)
    pub skipped: usize,

    /// Encodage utilisé pour décoder le document
    pub encoding: &'static str,

    /// Erreurs non fatales rencontrées pendant le parsing
    pub errors: Vec<KmlError>,
}

impl ParseResult {
    /// Nombre total de Placemarks rencontrés (gardés + ignorés)
    pub fn total(&self) -> usize {
        self.placemarks.len() + self.skipped
    }
}

/// Un Placemark réduit à un point
#[derive(Debug, Clone, PartialEq)]
pub struct Placemark {
    /// Position du Placemark dans le document (ignorés compris)
    pub index: usize,

    /// Contenu de `<name>`
    pub name: Option<String>,

    /// Contenu de `<description>`
    pub description: Option<String>,

    /// Premier tuple de `<coordinates>` (x = longitude, y = latitude)
    pub point: Point,

    /// Altitude si présente dans le tuple
    pub altitude: Option<f64>,
}

impl Placemark {
    /// Nom affichable: `<name>` ou "Feature N"
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Feature {}", self.index),
        }
    }

    pub fn lng(&self) -> f64 {
        self.point.x()
    }

    pub fn lat(&self) -> f64 {
        self.point.y()
    }
}
