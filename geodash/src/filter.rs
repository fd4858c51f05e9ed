//! Moteur de filtres
//!
//! `filter` est une fonction pure de (store, état des filtres): aucun état
//! caché entre deux appels, l'ordre d'insertion est conservé.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::schema::{Record, SourceKind};
use crate::store::FeatureStore;

/// Valeur sentinelle qui désactive un filtre
pub const ALL: &str = "all";

/// Filtre de source saisi par l'utilisateur: vide ou `all` le désactive
pub fn parse_source(value: &str) -> Result<Option<SourceKind>, String> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(ALL) {
        return Ok(None);
    }
    value.parse().map(Some)
}

/// Tranche de public
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeBucket {
    #[default]
    All,
    Large,
    Medium,
    Small,
}

impl SizeBucket {
    /// Libellé stocké dans la propriété `size`
    pub fn label(&self) -> &'static str {
        match self {
            SizeBucket::All => ALL,
            SizeBucket::Large => "Grande (20k+)",
            SizeBucket::Medium => "Médio (5k-20k)",
            SizeBucket::Small => "Pequeno (<5k)",
        }
    }

    /// Tranche d'un public connu
    pub fn classify(attendance: f64) -> SizeBucket {
        if attendance >= 20_000.0 {
            SizeBucket::Large
        } else if attendance >= 5_000.0 {
            SizeBucket::Medium
        } else {
            SizeBucket::Small
        }
    }
}

impl FromStr for SizeBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(SizeBucket::All),
            "grande" | "large" => Ok(SizeBucket::Large),
            "medio" | "médio" | "medium" => Ok(SizeBucket::Medium),
            "pequeno" | "small" => Ok(SizeBucket::Small),
            _ => Err(format!(
                "Invalid size: {}. Use: all, grande, medio, pequeno",
                s
            )),
        }
    }
}

/// Valeurs courantes des filtres
///
/// Une valeur vide ou "all" rend le filtre inactif.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub continent: Option<String>,
    pub size: SizeBucket,
    pub search: String,
    pub source: Option<SourceKind>,
    /// Aires de spécialisation (sélection multiple)
    pub areas: Vec<String>,
}

impl FilterState {
    pub fn set_continent(&mut self, continent: impl Into<String>) {
        let continent = continent.into();
        self.continent = is_active(&continent).then_some(continent);
    }

    pub fn set_size(&mut self, size: SizeBucket) {
        self.size = size;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn set_source(&mut self, source: Option<SourceKind>) {
        self.source = source;
    }

    pub fn set_areas<I, S>(&mut self, areas: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.areas = areas.into_iter().map(Into::into).collect();
    }

    /// Remet tous les filtres à "all"
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Vrai si aucun filtre n'est actif
    pub fn is_inactive(&self) -> bool {
        self.continent.as_deref().map_or(true, |c| !is_active(c))
            && self.size == SizeBucket::All
            && self.search.trim().is_empty()
            && self.source.is_none()
            && !areas_active(&self.areas)
    }

    /// Évalue tous les prédicats actifs (ET logique)
    pub fn matches(&self, record: &Record) -> bool {
        let props = &record.props;

        if let Some(continent) = self.continent.as_deref().filter(|c| is_active(c)) {
            if props.continent.as_deref() != Some(continent) {
                return false;
            }
        }

        if self.size != SizeBucket::All && props.size.as_deref() != Some(self.size.label()) {
            return false;
        }

        // Un terme blanc désactive la recherche; sinon il est cherché tel quel
        if !self.search.trim().is_empty()
            && !searchable_text(record).contains(&self.search.to_lowercase())
        {
            return false;
        }

        if let Some(source) = self.source {
            if props.source_type != Some(source) {
                return false;
            }
        }

        if areas_active(&self.areas) {
            let Some(area) = props.area.as_deref() else {
                return false;
            };
            if !self.areas.iter().any(|a| a == area) {
                return false;
            }
        }

        true
    }
}

fn is_active(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != ALL
}

fn areas_active(areas: &[String]) -> bool {
    !areas.is_empty() && !areas.iter().any(|a| a == ALL)
}

/// Texte de recherche: nom, pays, continent et genres, en minuscules
fn searchable_text(record: &Record) -> String {
    let props = &record.props;
    [
        Some(props.name.as_str()),
        props.country.as_deref(),
        props.continent.as_deref(),
        props.genres.as_deref(),
    ]
    .iter()
    .map(|part| part.unwrap_or(""))
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

/// Applique les filtres au store, dans l'ordre d'insertion
pub fn filter<'a>(store: &'a FeatureStore, state: &FilterState) -> Vec<&'a Record> {
    store
        .records()
        .iter()
        .filter(|record| state.matches(record))
        .collect()
}
