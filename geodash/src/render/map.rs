//! Carte: marqueurs, popups et ajustement de la vue

use geo::{BoundingRect, MultiPoint, Point};
use serde::Serialize;

use super::escape_html;
use crate::config::{DashboardConfig, MapConfig};
use crate::schema::Record;

/// Couleur de remplissage par défaut des marqueurs
pub const DEFAULT_FILL: &str = "#2E7D32";

/// Rayon du marqueur selon le public
///
/// <1000 -> 8, [1000, 5000) -> 10, [5000, 20000) -> 14, >=20000 -> 20, inconnu -> 8
pub fn marker_radius(attendance: Option<f64>) -> u32 {
    match attendance {
        Some(a) if a >= 20_000.0 => 20,
        Some(a) if a >= 5_000.0 => 14,
        Some(a) if a >= 1_000.0 => 10,
        _ => 8,
    }
}

/// Options `L.circleMarker`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
    pub radius: u32,
    pub fill_color: String,
    pub color: &'static str,
    pub weight: u32,
    pub opacity: f64,
    pub fill_opacity: f64,
}

impl MarkerStyle {
    pub fn for_record(record: &Record) -> Self {
        Self {
            radius: marker_radius(record.props.attendance),
            fill_color: record
                .props
                .color
                .clone()
                .unwrap_or_else(|| DEFAULT_FILL.to_string()),
            color: "#ffffff",
            weight: 2,
            opacity: 1.0,
            fill_opacity: 0.7,
        }
    }
}

/// Options `bindTooltip`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub text: String,
    pub direction: &'static str,
    pub offset: [i32; 2],
    pub opacity: f64,
}

/// Un marqueur à poser sur la carte
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerSpec {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub style: MarkerStyle,
    pub tooltip: Tooltip,
    pub popup_html: String,
}

impl MarkerSpec {
    /// `None` pour une feature sans point
    pub fn from_record(record: &Record) -> Option<Self> {
        let position = record.position?;
        Some(Self {
            id: record.id.clone(),
            lat: position.lat,
            lng: position.lng,
            style: MarkerStyle::for_record(record),
            tooltip: Tooltip {
                text: record.props.name.clone(),
                direction: "top",
                offset: [0, -10],
                opacity: 0.9,
            },
            popup_html: popup_html(record),
        })
    }
}

/// Contenu HTML de la popup
///
/// Les boutons portent l'action et sa cible en attributs `data-*`; la page
/// les renvoie telles quelles au dashboard.
pub fn popup_html(record: &Record) -> String {
    let props = &record.props;
    let mut html = String::with_capacity(512);

    html.push_str(r#"<div class="popup-content">"#);
    html.push_str(&format!("<h3>{}</h3>", escape_html(&props.name)));
    html.push_str(r#"<div class="popup-details">"#);

    let rows = [
        ("País", props.country.as_deref()),
        ("Continente", props.continent.as_deref()),
        ("Público", props.attendance_label.as_deref()),
        ("Categoria", props.size.as_deref()),
        ("Estilos", props.genres.as_deref()),
        ("Tipo", props.category.as_deref()),
        ("Descrição", props.description.as_deref()),
    ];
    for (label, value) in rows {
        if let Some(value) = value {
            html.push_str(&format!(
                "<p><strong>{}:</strong> {}</p>",
                label,
                escape_html(value)
            ));
        }
    }
    html.push_str("</div>");

    html.push_str(r#"<div class="popup-actions">"#);
    if let Some(p) = record.position {
        html.push_str(&format!(
            r#"<button class="popup-btn" data-action="zoom-to" data-lat="{}" data-lng="{}"><i class="fas fa-search-plus"></i> Zoom</button>"#,
            p.lat, p.lng
        ));
    }
    html.push_str(&format!(
        r#"<button class="popup-btn" data-action="highlight" data-feature-id="{}"><i class="fas fa-star"></i> Destacar</button>"#,
        escape_html(&record.id)
    ));
    html.push_str("</div></div>");

    html
}

/// Fond de carte XYZ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileLayer {
    pub url: String,
    pub attribution: String,
    pub max_zoom: u8,
}

impl From<&MapConfig> for TileLayer {
    fn from(config: &MapConfig) -> Self {
        Self {
            url: config.tile_url.clone(),
            attribution: config.attribution.clone(),
            max_zoom: config.max_zoom,
        }
    }
}

/// Options `L.markerClusterGroup`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOptions {
    pub show_coverage_on_hover: bool,
    pub zoom_to_bounds_on_click: bool,
    pub spiderfy_on_max_zoom: bool,
    pub disable_clustering_at_zoom: u8,
}

/// Emprise `[[sud, ouest], [nord, est]]` en lat/lng, avec marge en pixels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bounds {
    pub south_west: [f64; 2],
    pub north_east: [f64; 2],
    pub padding: [u32; 2],
}

/// Emprise des points donnés; `None` si aucun
pub fn bounds_of(positions: &[Point], padding: [u32; 2]) -> Option<Bounds> {
    let rect = MultiPoint::new(positions.to_vec()).bounding_rect()?;
    Some(Bounds {
        south_west: [rect.min().y, rect.min().x],
        north_east: [rect.max().y, rect.max().x],
        padding,
    })
}

/// Vue recentrée sur un point (action "zoom")
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Focus {
    pub lat: f64,
    pub lng: f64,
    pub zoom: u8,
    /// Marqueur dont la popup est ouverte
    pub open_popup: Option<String>,
}

/// Modèle complet de la carte
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub tiles: TileLayer,
    pub center: [f64; 2],
    pub zoom: u8,
    pub clustered: bool,
    pub cluster: Option<ClusterOptions>,
    pub markers: Vec<MarkerSpec>,
    /// Ajustement automatique (jamais en mode cluster)
    pub fit_bounds: Option<Bounds>,
}

impl MapView {
    /// Remplace tous les marqueurs par ceux des features filtrées
    pub fn render(records: &[&Record], config: &DashboardConfig) -> Self {
        let map = &config.map;
        let markers: Vec<MarkerSpec> = records
            .iter()
            .filter_map(|r| MarkerSpec::from_record(r))
            .collect();

        let clustered = config.enable_clustering;
        let fit_bounds = if clustered {
            None
        } else {
            bounds_of(&marker_points(&markers), map.fit_padding)
        };

        Self {
            tiles: TileLayer::from(map),
            center: map.center,
            zoom: map.zoom,
            clustered,
            cluster: clustered.then(|| ClusterOptions {
                show_coverage_on_hover: false,
                zoom_to_bounds_on_click: true,
                spiderfy_on_max_zoom: true,
                disable_clustering_at_zoom: map.disable_clustering_at_zoom,
            }),
            markers,
            fit_bounds,
        }
    }

    /// Emprise de tous les marqueurs affichés (bouton "ajuster")
    pub fn bounds(&self, padding: [u32; 2]) -> Option<Bounds> {
        bounds_of(&marker_points(&self.markers), padding)
    }
}

fn marker_points(markers: &[MarkerSpec]) -> Vec<Point> {
    markers.iter().map(|m| Point::new(m.lng, m.lat)).collect()
}
