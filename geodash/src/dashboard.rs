//! Contrôleur du dashboard
//!
//! Le dashboard reçoit sa stratégie de chargement ([`DataLoader`]) et les
//! actions de la page ([`Action`]) explicitement; aucune instance globale.

use std::time::Instant;

use geojson::JsonObject;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::aggregate::DashboardStats;
use crate::config::{Config, LegendEntry};
use crate::filter::{self, FilterState, SizeBucket};
use crate::render::map::{Bounds, Focus};
use crate::render::{table, Charts, MapView, TableRow};
use crate::report::{LoadReport, Notice};
use crate::schema::{Record, SourceKind};
use crate::sources::{sample, DataLoader, EmbedDescriptor};
use crate::store::FeatureStore;

/// Notification affichée quand aucune donnée réelle n'a pu être chargée
pub const FALLBACK_NOTICE: &str = "Failed to load data. Showing sample data.";

/// Action émise par un bouton de popup ou du tableau
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Action {
    ZoomTo { lat: f64, lng: f64 },
    FitBounds,
    ZoomIn,
    ZoomOut,
    Highlight { id: String },
    ShowDetails { id: String },
}

/// Effet d'une action, renvoyé à la page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ActionOutcome {
    Focus(Focus),
    FitBounds { bounds: Option<Bounds> },
    Zoom { zoom: u8 },
    Highlight { id: String, name: String },
    Details {
        id: String,
        name: String,
        properties: JsonObject,
    },
    NotFound { id: String },
}

/// Position courante de la carte
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Viewport {
    /// [lat, lng]
    pub center: [f64; 2],
    pub zoom: u8,
    pub open_popup: Option<String>,
    pub highlighted: Option<String>,
}

/// Option du filtre par aire de spécialisation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaOption {
    pub id: String,
    pub label: String,
    pub color: String,
}

/// Panneau « Fontes de Dados »: liens vers le notebook et la carte My Maps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSources {
    pub notebook_url: String,
    pub map_viewer_url: String,
    pub map_edit_url: String,
}

/// Tout ce que la page affiche
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub filters: FilterState,
    pub map: MapView,
    pub charts: Charts,
    pub table: Vec<TableRow>,
    pub stats: DashboardStats,
    pub continents: Vec<String>,
    pub legend: Vec<LegendEntry>,
    pub areas: Vec<AreaOption>,
    pub sources: DataSources,
    pub viewport: Viewport,
    pub notices: Vec<Notice>,
    pub embed: Option<EmbedDescriptor>,
}

pub struct Dashboard {
    config: Config,
    store: FeatureStore,
    filters: FilterState,
    viewport: Viewport,
    notices: Vec<Notice>,
    embed: Option<EmbedDescriptor>,
}

impl Dashboard {
    pub fn new(config: Config) -> Self {
        let viewport = Viewport {
            center: config.dashboard.map.center,
            zoom: config.dashboard.map.zoom,
            open_popup: None,
            highlighted: None,
        };
        Self {
            config,
            store: FeatureStore::new(),
            filters: FilterState::default(),
            viewport,
            notices: Vec::new(),
            embed: None,
        }
    }

    /// Charge les données via la stratégie donnée
    ///
    /// Ne peut pas échouer: sans donnée réelle, le jeu d'exemple est chargé et
    /// une notification est ajoutée. Un second appel recharge simplement.
    pub async fn init(&mut self, loader: &dyn DataLoader) -> LoadReport {
        let start = Instant::now();
        let mut report = LoadReport::new();

        let fallback = match loader.load(&mut report).await {
            Ok(collection) => {
                self.store.replace(collection);
                false
            }
            Err(e) => {
                error!(error = %e, "Chargement impossible, données d'exemple");
                report.add_notice(Notice::error(FALLBACK_NOTICE));
                self.store.replace(sample::dashboard_fallback());
                true
            }
        };

        if let Some(embed) = &report.embed {
            debug!(url = %embed.url, "Carte My Maps en mode embed");
            report.add_notice(Notice::info("My Maps layers unavailable, showing the embedded map."));
        }

        self.embed = report.embed.clone();
        self.notices = report.notices.clone();
        self.viewport.open_popup = None;
        self.viewport.highlighted = None;

        report.set_duration(start.elapsed());
        report.finalize(self.store.len(), fallback);
        info!(summary = %report.summary(), "Dashboard initialisé");
        report
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &FeatureStore {
        &self.store
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_continent(&mut self, continent: &str) {
        self.filters.set_continent(continent);
    }

    pub fn set_size(&mut self, size: SizeBucket) {
        self.filters.set_size(size);
    }

    pub fn set_search(&mut self, search: &str) {
        self.filters.set_search(search);
    }

    pub fn set_source(&mut self, source: Option<SourceKind>) {
        self.filters.set_source(source);
    }

    pub fn set_areas(&mut self, areas: &[String]) {
        self.filters.set_areas(areas.iter().cloned());
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    /// Features passant les filtres courants
    pub fn filtered(&self) -> Vec<&Record> {
        filter::filter(&self.store, &self.filters)
    }

    /// Vue des filtres courants
    pub fn view(&self) -> DashboardView {
        self.view_for(&self.filters)
    }

    /// Vue recalculée entièrement pour un état de filtres donné
    pub fn view_for(&self, filters: &FilterState) -> DashboardView {
        let records = filter::filter(&self.store, filters);
        debug!(
            filtered = records.len(),
            total = self.store.len(),
            "Vue recalculée"
        );

        DashboardView {
            filters: filters.clone(),
            map: MapView::render(&records, &self.config.dashboard),
            charts: Charts::render(&records),
            table: table::rows(&records),
            stats: DashboardStats::compute(&records),
            continents: self.continent_options(),
            legend: self.legend(),
            areas: self.area_options(),
            sources: self.data_sources(),
            viewport: self.viewport.clone(),
            notices: self.notices.clone(),
            embed: self.embed.clone(),
        }
    }

    /// Continents proposés dans le filtre
    pub fn continent_options(&self) -> Vec<String> {
        self.store.continents()
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        self.config.continent_colors.clone()
    }

    /// Aires proposées dans le filtre, dans l'ordre de la configuration
    pub fn area_options(&self) -> Vec<AreaOption> {
        self.config
            .areas
            .iter()
            .map(|area| AreaOption {
                id: area.id.clone(),
                label: area.label.clone(),
                color: area.color.clone(),
            })
            .collect()
    }

    pub fn data_sources(&self) -> DataSources {
        let my_maps = &self.config.my_maps;
        let embed = EmbedDescriptor::for_map(&my_maps.map_id, &my_maps.language);
        DataSources {
            notebook_url: self.config.colab.notebook_url.clone(),
            map_viewer_url: embed.viewer_url,
            map_edit_url: embed.edit_url,
        }
    }

    /// Exécute une action de la page
    pub fn dispatch(&mut self, action: Action) -> ActionOutcome {
        debug!(?action, "Action");
        let map = &self.config.dashboard.map;

        match action {
            Action::ZoomTo { lat, lng } => {
                let open_popup = self
                    .filtered()
                    .into_iter()
                    .find(|r| r.position.is_some_and(|p| p.lat == lat && p.lng == lng))
                    .map(|r| r.id.clone());

                self.viewport.center = [lat, lng];
                self.viewport.zoom = map.focus_zoom;
                self.viewport.open_popup = open_popup.clone();

                ActionOutcome::Focus(Focus {
                    lat,
                    lng,
                    zoom: map.focus_zoom,
                    open_popup,
                })
            }
            Action::FitBounds => {
                let padding = map.fit_padding;
                let bounds = MapView::render(&self.filtered(), &self.config.dashboard)
                    .bounds(padding);
                ActionOutcome::FitBounds { bounds }
            }
            Action::ZoomIn => {
                self.viewport.zoom = self.viewport.zoom.saturating_add(1).min(map.max_zoom);
                ActionOutcome::Zoom {
                    zoom: self.viewport.zoom,
                }
            }
            Action::ZoomOut => {
                self.viewport.zoom = self.viewport.zoom.saturating_sub(1);
                ActionOutcome::Zoom {
                    zoom: self.viewport.zoom,
                }
            }
            Action::Highlight { id } => match self.store.get(&id) {
                Some(record) => {
                    info!(id = %id, name = %record.props.name, "Feature mise en avant");
                    let name = record.props.name.clone();
                    self.viewport.highlighted = Some(id.clone());
                    ActionOutcome::Highlight { id, name }
                }
                None => not_found(id),
            },
            Action::ShowDetails { id } => match self.store.get(&id) {
                Some(record) => ActionOutcome::Details {
                    name: record.props.name.clone(),
                    properties: record.feature.properties.clone().unwrap_or_default(),
                    id,
                },
                None => not_found(id),
            },
        }
    }
}

fn not_found(id: String) -> ActionOutcome {
    warn!(id = %id, "Feature inconnue");
    ActionOutcome::NotFound { id }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{GeoJsonSource, StaticFetcher};
    use std::sync::Arc;

    const DATA: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"name":"Boom Festival","continent":"Europa","country":"Portugal",
         "attendance_numeric":40000,"attendance":"40.000"},"geometry":{"type":"Point","coordinates":[-7.24,39.92]}},
        {"type":"Feature","properties":{"name":"Universo Paralello","continent":"América do Sul",
         "attendance_numeric":15000},"geometry":{"type":"Point","coordinates":[-39.05,-13.86]}}
    ]}"#;

    fn offline_config() -> Config {
        Config::from_preset("offline").unwrap()
    }

    async fn loaded() -> Dashboard {
        let fetcher = StaticFetcher::new().with("data.geojson", DATA);
        let loader = GeoJsonSource::new("data.geojson", Arc::new(fetcher));
        let mut dashboard = Dashboard::new(offline_config());
        dashboard.init(&loader).await;
        dashboard
    }

    #[tokio::test]
    async fn test_init_success() {
        let fetcher = StaticFetcher::new().with("data.geojson", DATA);
        let loader = GeoJsonSource::new("data.geojson", Arc::new(fetcher));
        let mut dashboard = Dashboard::new(offline_config());

        let report = dashboard.init(&loader).await;
        assert_eq!(report.status, crate::report::LoadStatus::Success);
        assert_eq!(dashboard.store().len(), 2);
        assert!(dashboard.view().notices.is_empty());
    }

    #[tokio::test]
    async fn test_init_total_failure_uses_fallback() {
        let loader = GeoJsonSource::new("missing.geojson", Arc::new(StaticFetcher::new()));
        let mut dashboard = Dashboard::new(offline_config());

        let report = dashboard.init(&loader).await;
        assert_eq!(report.status, crate::report::LoadStatus::Fallback);
        assert_eq!(dashboard.store().len(), 3);

        let view = dashboard.view();
        assert_eq!(view.notices, vec![Notice::error(FALLBACK_NOTICE)]);
        assert_eq!(view.table.len(), 3);
    }

    #[tokio::test]
    async fn test_view_lists_areas_and_sources() {
        let view = loaded().await.view();

        let ids: Vec<&str> = view.areas.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["cartografia", "sensoriamento", "webgis"]);
        assert_eq!(
            view.areas[0],
            AreaOption {
                id: "cartografia".to_string(),
                label: "Cartografia Digital".to_string(),
                color: "#2E7D32".to_string(),
            }
        );
        assert_eq!(view.areas[2].label, "Web GIS");

        assert_eq!(
            view.sources.notebook_url,
            "https://colab.research.google.com/drive/1pKJIoHXHiKybXH3pjODGg6IkornrvJua"
        );
        assert_eq!(
            view.sources.map_viewer_url,
            "https://www.google.com/maps/d/u/0/viewer?mid=1adej1ZKSiAOyUe4Uu9jPBV6P6DalfQk"
        );
        assert_eq!(
            view.sources.map_edit_url,
            "https://www.google.com/maps/d/edit?mid=1adej1ZKSiAOyUe4Uu9jPBV6P6DalfQk"
        );

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["areas"][1]["color"], "#1565C0");
        assert!(json["sources"]["notebook_url"].is_string());
    }

    #[tokio::test]
    async fn test_double_init_reloads() {
        let mut dashboard = loaded().await;
        let fetcher = StaticFetcher::new().with("data.geojson", DATA);
        let loader = GeoJsonSource::new("data.geojson", Arc::new(fetcher));
        dashboard.init(&loader).await;
        assert_eq!(dashboard.store().len(), 2);
    }

    #[tokio::test]
    async fn test_filters_drive_every_renderer() {
        let mut dashboard = loaded().await;
        dashboard.set_continent("Europa");

        let view = dashboard.view();
        assert_eq!(view.stats.total, 1);
        assert_eq!(view.table.len(), 1);
        assert_eq!(view.map.markers.len(), 1);
        assert_eq!(view.charts.distribution.values(), &[1.0]);
        // Continents proposés: tout le store, pas seulement la vue
        assert_eq!(view.continents, vec!["Europa", "América do Sul"]);

        dashboard.clear_filters();
        assert_eq!(dashboard.view().stats.total, 2);
    }

    #[tokio::test]
    async fn test_view_for_is_pure() {
        let dashboard = loaded().await;
        let mut state = FilterState::default();
        state.set_search("paralello");

        let first = dashboard.view_for(&state);
        let second = dashboard.view_for(&state);
        assert_eq!(first.table, second.table);
        assert_eq!(first.stats, second.stats);
        // L'état courant du dashboard n'est pas touché
        assert_eq!(dashboard.filters(), &FilterState::default());
    }

    #[tokio::test]
    async fn test_zoom_to_opens_popup() {
        let mut dashboard = loaded().await;
        let boom_id = dashboard.store().records()[0].id.clone();

        let outcome = dashboard.dispatch(Action::ZoomTo {
            lat: 39.92,
            lng: -7.24,
        });
        assert_eq!(
            outcome,
            ActionOutcome::Focus(Focus {
                lat: 39.92,
                lng: -7.24,
                zoom: 12,
                open_popup: Some(boom_id),
            })
        );
        assert_eq!(dashboard.viewport().zoom, 12);

        let ActionOutcome::Focus(elsewhere) = dashboard.dispatch(Action::ZoomTo { lat: 0.0, lng: 0.0 })
        else {
            panic!("expected focus");
        };
        assert_eq!(elsewhere.open_popup, None);
    }

    #[tokio::test]
    async fn test_zoom_in_out_bounds() {
        let mut dashboard = loaded().await;
        assert_eq!(dashboard.dispatch(Action::ZoomOut), ActionOutcome::Zoom { zoom: 1 });
        dashboard.dispatch(Action::ZoomOut);
        assert_eq!(dashboard.dispatch(Action::ZoomOut), ActionOutcome::Zoom { zoom: 0 });

        for _ in 0..30 {
            dashboard.dispatch(Action::ZoomIn);
        }
        assert_eq!(dashboard.viewport().zoom, 19);
    }

    #[tokio::test]
    async fn test_fit_bounds_action() {
        let mut dashboard = loaded().await;
        let ActionOutcome::FitBounds { bounds } = dashboard.dispatch(Action::FitBounds) else {
            panic!("expected bounds");
        };
        let bounds = bounds.unwrap();
        assert_eq!(bounds.south_west, [-13.86, -39.05]);
        assert_eq!(bounds.padding, [50, 50]);

        dashboard.set_search("nothing matches");
        assert_eq!(
            dashboard.dispatch(Action::FitBounds),
            ActionOutcome::FitBounds { bounds: None }
        );
    }

    #[tokio::test]
    async fn test_highlight_and_details() {
        let mut dashboard = loaded().await;
        let id = dashboard.store().records()[1].id.clone();

        match dashboard.dispatch(Action::Highlight { id: id.clone() }) {
            ActionOutcome::Highlight { name, .. } => assert_eq!(name, "Universo Paralello"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(dashboard.viewport().highlighted.as_deref(), Some(id.as_str()));

        match dashboard.dispatch(Action::ShowDetails { id }) {
            ActionOutcome::Details { properties, .. } => {
                assert_eq!(properties["attendance_numeric"], 15000);
            }
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(
            dashboard.dispatch(Action::ShowDetails { id: "nope".to_string() }),
            ActionOutcome::NotFound { id: "nope".to_string() }
        );
    }

    #[test]
    fn test_action_json() {
        let action: Action =
            serde_json::from_str(r#"{"action":"zoom-to","lat":1.5,"lng":2.5}"#).unwrap();
        assert_eq!(action, Action::ZoomTo { lat: 1.5, lng: 2.5 });
        let action: Action =
            serde_json::from_str(r#"{"action":"show-details","id":"abc"}"#).unwrap();
        assert_eq!(action, Action::ShowDetails { id: "abc".to_string() });
    }
}
