//! Schéma canonique des features
//!
//! Les sources (Colab, My Maps, GeoJSON brut) n'emploient pas les mêmes noms
//! de propriétés. Les alias sont résolus ici, une seule fois à l'ingestion;
//! filtres, agrégations et rendus ne lisent que [`Props`].
//!
//! | canonique | alias lus (le premier présent gagne) |
//! |---|---|
//! | `name` | `name`, `title` |
//! | `category` | `category`, `type` |
//! | `attendance` | `attendance_numeric`, nombres extraits de `attendance` |
//! | `date` | `date` |
//! | `timestamp` | `timestamp` |
//! | `source_type` | `source_type` |
//!
//! Les autres champs (`area`, `region`, `continent`, `country`, `genres`,
//! `size`, `color`, `description`, `value`) sont lus sous leur propre nom.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use geojson::{Feature, JsonObject, JsonValue};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::filter::SizeBucket;

/// Origine d'une feature après fusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "colab")]
    Colab,
    #[serde(rename = "my_maps")]
    MyMaps,
    #[serde(rename = "geojson")]
    GeoJson,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::Colab, SourceKind::MyMaps, SourceKind::GeoJson];

    /// Valeur de la propriété `source_type`
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Colab => "colab",
            SourceKind::MyMaps => "my_maps",
            SourceKind::GeoJson => "geojson",
        }
    }

    /// Classe d'icône Font Awesome de la propriété `icon`
    pub fn icon(&self) -> &'static str {
        match self {
            SourceKind::Colab => "fas fa-code",
            SourceKind::MyMaps => "fas fa-map-marker-alt",
            SourceKind::GeoJson => "fas fa-globe",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "colab" => Ok(SourceKind::Colab),
            "my_maps" | "mymaps" | "my-maps" => Ok(SourceKind::MyMaps),
            "geojson" => Ok(SourceKind::GeoJson),
            _ => Err(format!(
                "Invalid source: {}. Use: colab, my_maps, geojson",
                s
            )),
        }
    }
}

/// Propriétés canoniques d'une feature
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Props {
    pub name: String,
    pub category: Option<String>,
    pub area: Option<String>,
    pub region: Option<String>,
    pub continent: Option<String>,
    pub country: Option<String>,
    pub genres: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub value: Option<f64>,
    pub attendance: Option<f64>,
    /// Texte d'origine du public ("20.000 - 30.000")
    pub attendance_label: Option<String>,
    pub date: Option<NaiveDate>,
    pub timestamp: Option<NaiveDateTime>,
    pub source_type: Option<SourceKind>,
}

impl Props {
    /// Résout les alias d'un objet de propriétés GeoJSON
    pub fn from_properties(properties: &JsonObject) -> Self {
        let attendance_label = str_prop(properties, "attendance");
        let attendance = num_prop(properties, "attendance_numeric")
            .or_else(|| attendance_label.as_deref().and_then(extract_attendance));

        let size = str_prop(properties, "size")
            .or_else(|| attendance.map(|a| SizeBucket::classify(a).label().to_string()));

        Self {
            name: first_str(properties, &["name", "title"]).unwrap_or_default(),
            category: first_str(properties, &["category", "type"]),
            area: str_prop(properties, "area"),
            region: str_prop(properties, "region"),
            continent: str_prop(properties, "continent"),
            country: str_prop(properties, "country"),
            genres: str_prop(properties, "genres"),
            size,
            color: str_prop(properties, "color"),
            description: str_prop(properties, "description"),
            value: num_prop(properties, "value"),
            attendance,
            attendance_label,
            date: str_prop(properties, "date").and_then(|d| parse_date(&d)),
            timestamp: properties.get("timestamp").and_then(parse_timestamp),
            source_type: str_prop(properties, "source_type").and_then(|s| s.parse().ok()),
        }
    }
}

/// Position [lng, lat] d'une feature ponctuelle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

/// Feature stockée: GeoJSON d'origine + propriétés canoniques
#[derive(Debug, Clone)]
pub struct Record {
    /// Identifiant stable (hash blake3 tronqué)
    pub id: String,
    pub feature: Feature,
    pub props: Props,
    /// `None` pour les géométries non ponctuelles
    pub position: Option<LngLat>,
}

impl Record {
    /// Construit un enregistrement; `index` est la position d'insertion
    pub fn from_feature(feature: Feature, index: usize) -> Self {
        let props = feature
            .properties
            .as_ref()
            .map(Props::from_properties)
            .unwrap_or_default();
        let position = point_position(&feature);
        let id = record_id(&props, position, index);

        Self {
            id,
            feature,
            props,
            position,
        }
    }
}

/// Coordonnées d'une géométrie Point
pub fn point_position(feature: &Feature) -> Option<LngLat> {
    match feature.geometry.as_ref().map(|g| &g.value) {
        Some(geojson::Value::Point(coords)) if coords.len() >= 2 => Some(LngLat {
            lng: coords[0],
            lat: coords[1],
        }),
        _ => None,
    }
}

fn record_id(props: &Props, position: Option<LngLat>, index: usize) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(props.source_type.map_or("", |s| s.as_str()).as_bytes());
    hasher.update(b"\0");
    hasher.update(props.name.as_bytes());
    if let Some(p) = position {
        hasher.update(&p.lng.to_le_bytes());
        hasher.update(&p.lat.to_le_bytes());
    }
    hasher.update(&(index as u64).to_le_bytes());
    hex::encode(&hasher.finalize().as_bytes()[..8])
}

/// Lecture texte tolérante (nombres et booléens convertis)
pub fn str_prop(properties: &JsonObject, key: &str) -> Option<String> {
    match properties.get(key)? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn first_str(properties: &JsonObject, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| str_prop(properties, key))
}

/// Lecture numérique tolérante ("85" accepté)
pub fn num_prop(properties: &JsonObject, key: &str) -> Option<f64> {
    let value = match properties.get(key)? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

fn attendance_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d+(?:[.,]\d+)*)\s*(k|mil)?\b").expect("valid attendance regex")
    })
}

/// Extrait le public d'un texte libre: "20.000 - 30.000" -> 25000, "15k" -> 15000.
///
/// Deux nombres ou plus: moyenne des deux premiers.
pub fn extract_attendance(text: &str) -> Option<f64> {
    let numbers: Vec<f64> = attendance_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            let value = parse_grouped_number(caps.get(1)?.as_str())?;
            let factor = if caps.get(2).is_some() { 1000.0 } else { 1.0 };
            Some(value * factor)
        })
        .take(2)
        .collect();

    match numbers.as_slice() {
        [] => None,
        [single] => Some(*single),
        [a, b, ..] => Some((a + b) / 2.0),
    }
}

/// "50.000" / "50,000" -> 50000, "2.5" / "2,5" -> 2.5
fn parse_grouped_number(raw: &str) -> Option<f64> {
    let groups: Vec<&str> = raw.split(['.', ',']).collect();
    if groups.len() > 1 && groups[1..].iter().all(|g| g.len() == 3) {
        return groups.concat().parse().ok();
    }
    raw.replace(',', ".").parse().ok()
}

/// Dates acceptées: `YYYY-MM-DD`, `YYYY-MM`, RFC 3339, `YYYY-MM-DDTHH:MM:SS`
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d") {
        return Some(date);
    }
    parse_datetime_str(s).map(|dt| dt.date())
}

/// Horodatage: chaîne datée avec heure, ou nombre de millisecondes epoch.
///
/// L'heure retenue est celle écrite (fuseau de la chaîne), pas l'heure locale
/// de la machine. Une date sans heure ne donne pas d'horodatage.
pub fn parse_timestamp(value: &JsonValue) -> Option<NaiveDateTime> {
    match value {
        JsonValue::String(s) => parse_datetime_str(s.trim()),
        JsonValue::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
        }
        _ => None,
    }
}

fn parse_datetime_str(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}
