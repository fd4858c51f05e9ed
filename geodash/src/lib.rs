//! # geodash
//!
//! Dashboard de portfolio géospatial: features Colab (GeoJSON) et couches
//! Google My Maps (KML) fusionnées, filtrées et agrégées.
//!
//! ## Features
//!
//! - Adapters de sources interchangeables (`DataLoader`)
//! - Fusion avec marquage de la source
//! - Filtres combinés (continent, taille, recherche, source, aires)
//! - Agrégations pour les graphiques et statistiques
//! - Vues sérialisables (carte, graphiques, tableau) servies par une API HTTP
//!
//! ## Usage CLI
//!
//! ```bash
//! # Servir le dashboard
//! geodash serve --config default --port 8080
//!
//! # Exporter les features fusionnées
//! geodash export --config default --output ./merged.geojson
//!
//! # Convertir un export KML My Maps
//! geodash kml --input ./camada.kml --output ./camada.geojson
//! ```

pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod export;
pub mod filter;
pub mod merge;
pub mod render;
pub mod report;
pub mod schema;
#[cfg(feature = "server")]
pub mod server;
pub mod sources;
pub mod store;

pub use config::Config;
pub use dashboard::{Action, ActionOutcome, Dashboard, DashboardView};
pub use filter::{FilterState, SizeBucket};
pub use report::{LoadReport, LoadStatus};
pub use schema::{Record, SourceKind};
pub use sources::{loader_from_config, DataLoader, Fetch, HttpFetcher, SourceError};
pub use store::FeatureStore;
