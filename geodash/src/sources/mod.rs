//! Sources de données (adapters)
//!
//! Chaque adapter expose un chargement asynchrone qui retourne une
//! FeatureCollection. Un échec de sous-source (dataset, couche) est enregistré
//! dans le [`LoadReport`] et la sous-source est ignorée; seul l'échec complet
//! d'un adapter remonte en erreur.

pub mod colab;
pub mod fetch;
pub mod geojson_url;
pub mod integrated;
pub mod mymaps;
pub mod sample;

use std::sync::Arc;

use bytes::Bytes;
use futures::future::BoxFuture;
use geojson::{FeatureCollection, GeoJson, JsonObject, JsonValue};
use serde::Serialize;
use thiserror::Error;

use crate::config::Config;
use crate::report::LoadReport;

pub use colab::ColabSource;
pub use fetch::{HttpFetcher, StaticFetcher};
pub use geojson_url::GeoJsonSource;
pub use integrated::IntegratedLoader;
pub use mymaps::MyMapsSource;

/// Aire attribuée quand aucune règle ne s'applique
pub const DEFAULT_AREA: &str = "geral";

/// Erreurs de chargement
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("Invalid KML: {0}")]
    Kml(#[from] kml_flat::KmlError),

    #[error("Expected a FeatureCollection, got {0}")]
    NotFeatureCollection(&'static str),

    #[error("No data loaded from {0}")]
    NoData(String),
}

/// Récupération brute d'une URL
pub trait Fetch: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bytes, SourceError>>;
}

/// Stratégie de chargement du dashboard
pub trait DataLoader: Send + Sync {
    fn load<'a>(
        &'a self,
        report: &'a mut LoadReport,
    ) -> BoxFuture<'a, Result<FeatureCollection, SourceError>>;
}

/// Résultat d'un adapter capable de se replier sur un embed
#[derive(Debug, Clone)]
pub enum SourceData {
    Features(FeatureCollection),
    Embed(EmbedDescriptor),
}

/// Carte My Maps à intégrer en iframe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedDescriptor {
    pub url: String,
    pub iframe: String,
    pub edit_url: String,
    pub viewer_url: String,
}

impl EmbedDescriptor {
    pub fn for_map(map_id: &str, language: &str) -> Self {
        let url = format!(
            "https://www.google.com/maps/d/embed?mid={}&hl={}",
            map_id, language
        );
        let iframe = format!(
            r#"<iframe src="{}" width="100%" height="500" style="border:0;" allowfullscreen="" loading="lazy"></iframe>"#,
            crate::render::escape_html(&url)
        );
        Self {
            iframe,
            edit_url: format!("https://www.google.com/maps/d/edit?mid={}", map_id),
            viewer_url: format!("https://www.google.com/maps/d/u/0/viewer?mid={}", map_id),
            url,
        }
    }
}

/// Parse un document GeoJSON qui doit être une FeatureCollection
pub fn parse_collection(bytes: &[u8]) -> Result<FeatureCollection, SourceError> {
    let value: JsonValue = serde_json::from_slice(bytes)?;
    match GeoJson::from_json_value(value)? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        GeoJson::Feature(_) => Err(SourceError::NotFeatureCollection("Feature")),
        GeoJson::Geometry(_) => Err(SourceError::NotFeatureCollection("Geometry")),
    }
}

/// Ajoute des propriétés à chaque feature (en créant l'objet si absent)
pub(crate) fn tag_features(collection: &mut FeatureCollection, tags: &[(&str, &str)]) {
    for feature in &mut collection.features {
        let properties = feature.properties.get_or_insert_with(JsonObject::new);
        for (key, value) in tags {
            properties.insert(key.to_string(), JsonValue::String(value.to_string()));
        }
    }
}

/// Loader correspondant à la configuration
///
/// `dashboard.data_url` renseigné: GeoJSON unique. Sinon: Colab + My Maps.
pub fn loader_from_config(config: &Config, fetcher: Arc<dyn Fetch>) -> Box<dyn DataLoader> {
    match &config.dashboard.data_url {
        Some(url) => Box::new(GeoJsonSource::new(url.clone(), fetcher)),
        None => Box::new(IntegratedLoader::new(
            ColabSource::new(&config.colab, config.areas.clone(), fetcher.clone()),
            MyMapsSource::new(&config.my_maps, fetcher),
        )),
    }
}
