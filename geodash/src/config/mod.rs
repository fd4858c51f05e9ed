//! Configuration du dashboard

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Configuration principale
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub dashboard: DashboardConfig,
    pub colab: ColabConfig,
    pub my_maps: MyMapsConfig,

    /// Aires de spécialisation (ordre significatif pour la détection par mot-clé)
    #[serde(default)]
    pub areas: Vec<AreaConfig>,

    /// Couleurs de légende par continent
    #[serde(default)]
    pub continent_colors: Vec<LegendEntry>,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Paramètres du dashboard lui-même
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardConfig {
    /// GeoJSON unique (mode sans intégrations Colab / My Maps)
    ///
    /// Un chemin relatif est résolu depuis le répertoire courant; le preset
    /// `offline` pointe sur `data/festivais_mundiais.geojson` livré avec la crate.
    #[serde(default)]
    pub data_url: Option<String>,

    /// Regrouper les marqueurs proches (désactive l'ajustement automatique de la vue)
    #[serde(default = "default_true")]
    pub enable_clustering: bool,

    pub map: MapConfig,
}

/// Paramètres de la carte Leaflet
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MapConfig {
    /// URL XYZ des tuiles raster
    pub tile_url: String,
    pub attribution: String,
    pub max_zoom: u8,

    /// Vue initiale [lat, lng]
    pub center: [f64; 2],
    pub zoom: u8,

    /// Zoom appliqué par l'action "zoom sur le marqueur"
    #[serde(default = "default_focus_zoom")]
    pub focus_zoom: u8,

    /// Marge (px) lors de l'ajustement aux bornes
    pub fit_padding: [u32; 2],

    #[serde(default = "default_disable_clustering_at_zoom")]
    pub disable_clustering_at_zoom: u8,
}

/// Source Colab: GeoJSON exportés sur des Gists
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColabConfig {
    #[serde(default)]
    pub notebook_url: String,
    pub datasets: Vec<NamedUrl>,
}

/// Source Google My Maps: couches exportées en KML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MyMapsConfig {
    #[serde(default)]
    pub map_id: String,

    #[serde(default = "default_language")]
    pub language: String,

    pub layers: Vec<NamedUrl>,

    /// Couche My Maps -> aire de spécialisation
    #[serde(default)]
    pub layer_areas: HashMap<String, String>,
}

impl MyMapsConfig {
    /// Aire associée à une couche ("geral" si inconnue)
    pub fn area_for_layer(&self, layer: &str) -> &str {
        self.layer_areas
            .get(&layer.to_lowercase())
            .map_or(crate::sources::DEFAULT_AREA, String::as_str)
    }
}

/// Un jeu de données nommé
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NamedUrl {
    pub name: String,
    pub url: String,
}

/// Aire de spécialisation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AreaConfig {
    pub id: String,
    pub label: String,
    pub color: String,

    /// Mots-clés recherchés dans le nom du dataset
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Entrée de légende
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LegendEntry {
    pub name: String,
    pub color: String,
}

/// Client HTTP
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Aucun timeout par défaut: une requête bloquée retarde l'initialisation
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Serveur HTTP (commande `serve`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Répertoire de la page statique servie à la racine
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_focus_zoom() -> u8 {
    12
}

fn default_disable_clustering_at_zoom() -> u8 {
    15
}

fn default_language() -> String {
    "pt-BR".to_string()
}

fn default_user_agent() -> String {
    format!("geodash/{}", env!("CARGO_PKG_VERSION"))
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "default" => Self::load_embedded(include_str!("presets/default.json")),
            "offline" => Self::load_embedded(include_str!("presets/offline.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: default, offline", preset),
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Nom de preset ou chemin vers un fichier JSON
    pub fn resolve(spec: &str) -> Result<Self> {
        let path = Path::new(spec);
        let mut config = if path.extension().map_or(false, |ext| ext == "json") || path.exists()
        {
            Self::load(path)?
        } else {
            Self::from_preset(spec)?
        };
        config.apply_env();
        Ok(config)
    }

    /// Surcharges par variables d'environnement (.env chargé au démarrage)
    pub fn apply_env(&mut self) {
        if let Ok(map_id) = std::env::var("GEODASH_MAP_ID") {
            self.my_maps.map_id = map_id;
        }
        if let Ok(url) = std::env::var("GEODASH_DATA_URL") {
            self.dashboard.data_url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(port) = std::env::var("GEODASH_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            self.server.port = port;
        }
    }
}
