//! Types d'erreurs pour le crate kml-flat

use thiserror::Error;

/// Erreurs pouvant survenir lors du parsing KML
#[derive(Debug, Error)]
pub enum KmlError {
    /// Erreur d'I/O lors de la lecture du fichier
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Contenu non décodable dans l'encodage annoncé
    #[error("Invalid {encoding} content: {reason}")]
    InvalidEncoding { encoding: String, reason: String },

    /// Élément ouvert mais jamais fermé
    #[error("Unclosed <{element}> starting at byte {offset}")]
    UnclosedElement { element: String, offset: usize },

    /// Coordonnées illisibles
    #[error("Invalid coordinates in Placemark #{index}: {raw:?}")]
    InvalidCoordinates { index: usize, raw: String },

    /// Placemark sans coordonnées
    #[error("Placemark #{index} has no coordinates")]
    MissingCoordinates { index: usize },
}

impl KmlError {
    /// Crée une erreur de coordonnées avec la valeur brute
    pub fn invalid_coordinates(index: usize, raw: impl Into<String>) -> Self {
        Self::InvalidCoordinates {
            index,
            raw: raw.into(),
        }
    }

    /// Vrai si l'erreur empêche toute exploitation du document
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Io(_) | Self::UnclosedElement { .. })
    }
}
