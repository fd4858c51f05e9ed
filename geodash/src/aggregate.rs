//! Agrégations des graphiques et statistiques
//!
//! Tout est recalculé depuis la vue filtrée à chaque appel.

use std::collections::BTreeMap;

use chrono::Timelike;
use serde::Serialize;

use crate::schema::Record;

/// Catégorie des features sans `category`
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Région des features sans `region`
pub const UNSPECIFIED_REGION: &str = "Unspecified";

/// Nombre de features par catégorie, dans l'ordre de première apparition
pub fn category_distribution(records: &[&Record]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for record in records {
        let category = record
            .props
            .category
            .as_deref()
            .unwrap_or(UNKNOWN_CATEGORY);
        match counts.iter_mut().find(|(c, _)| c == category) {
            Some((_, n)) => *n += 1,
            None => counts.push((category.to_string(), 1)),
        }
    }
    counts
}

/// Nombre de features par mois (`YYYY-MM`), ordre chronologique
pub fn timeline(records: &[&Record]) -> BTreeMap<String, usize> {
    let mut months = BTreeMap::new();
    for date in records.iter().filter_map(|r| r.props.date) {
        *months.entry(date.format("%Y-%m").to_string()).or_insert(0) += 1;
    }
    months
}

/// Moyenne de `value` par région
///
/// Une région n'existe que si au moins une feature y contribue une valeur.
pub fn regional_average(records: &[&Record]) -> Vec<(String, f64)> {
    let mut sums: Vec<(String, f64, usize)> = Vec::new();
    for record in records {
        let Some(value) = record.props.value else {
            continue;
        };
        let region = record
            .props
            .region
            .as_deref()
            .unwrap_or(UNSPECIFIED_REGION);
        match sums.iter_mut().find(|(r, _, _)| r == region) {
            Some((_, sum, count)) => {
                *sum += value;
                *count += 1;
            }
            None => sums.push((region.to_string(), value, 1)),
        }
    }

    sums.into_iter()
        .map(|(region, sum, count)| (region, sum / count as f64))
        .collect()
}

/// Tranche horaire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DayPeriod {
    /// [6, 12)
    Morning,
    /// [12, 18)
    Afternoon,
    /// [18, 24)
    Evening,
    /// [0, 6)
    Night,
}

impl DayPeriod {
    pub const ALL: [DayPeriod; 4] = [
        DayPeriod::Morning,
        DayPeriod::Afternoon,
        DayPeriod::Evening,
        DayPeriod::Night,
    ];

    pub fn from_hour(hour: u32) -> DayPeriod {
        match hour {
            6..=11 => DayPeriod::Morning,
            12..=17 => DayPeriod::Afternoon,
            18..=23 => DayPeriod::Evening,
            _ => DayPeriod::Night,
        }
    }

    /// Libellé affiché sur le radar
    pub fn label(&self) -> &'static str {
        match self {
            DayPeriod::Morning => "Morning",
            DayPeriod::Afternoon => "Afternoon",
            DayPeriod::Evening => "Evening",
            DayPeriod::Night => "Night",
        }
    }
}

/// Répartition par tranche horaire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimeOfDay {
    pub morning: usize,
    pub afternoon: usize,
    pub evening: usize,
    pub night: usize,
}

impl TimeOfDay {
    pub fn get(&self, period: DayPeriod) -> usize {
        match period {
            DayPeriod::Morning => self.morning,
            DayPeriod::Afternoon => self.afternoon,
            DayPeriod::Evening => self.evening,
            DayPeriod::Night => self.night,
        }
    }

    /// Comptes dans l'ordre de `DayPeriod::ALL`
    pub fn counts(&self) -> [usize; 4] {
        DayPeriod::ALL.map(|p| self.get(p))
    }

    pub fn total(&self) -> usize {
        self.morning + self.afternoon + self.evening + self.night
    }

    fn add(&mut self, period: DayPeriod) {
        match period {
            DayPeriod::Morning => self.morning += 1,
            DayPeriod::Afternoon => self.afternoon += 1,
            DayPeriod::Evening => self.evening += 1,
            DayPeriod::Night => self.night += 1,
        }
    }
}

/// Features sans horodatage exclues
pub fn time_of_day(records: &[&Record]) -> TimeOfDay {
    let mut density = TimeOfDay::default();
    for timestamp in records.iter().filter_map(|r| r.props.timestamp) {
        density.add(DayPeriod::from_hour(timestamp.hour()));
    }
    density
}

/// Continent le plus représenté
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopContinent {
    pub name: String,
    pub count: usize,
}

/// Feature au plus grand public
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Largest {
    pub id: String,
    pub name: String,
    pub attendance: Option<String>,
}

/// Compteurs du panneau de statistiques
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    /// Continents distincts renseignés
    pub continents: usize,
    /// Public moyen arrondi; un public inconnu compte pour 0
    pub avg_attendance: u64,
    pub top_continent: Option<TopContinent>,
    pub largest: Option<Largest>,
}

impl DashboardStats {
    pub fn compute(records: &[&Record]) -> Self {
        let total = records.len();
        if total == 0 {
            return Self::default();
        }

        let mut continent_counts: Vec<(&str, usize)> = Vec::new();
        for continent in records.iter().filter_map(|r| r.props.continent.as_deref()) {
            match continent_counts.iter_mut().find(|(c, _)| *c == continent) {
                Some((_, n)) => *n += 1,
                None => continent_counts.push((continent, 1)),
            }
        }

        // Égalité: le premier rencontré l'emporte
        let top_continent = continent_counts
            .iter()
            .fold(None::<(&str, usize)>, |best, &(name, count)| match best {
                Some((_, n)) if n >= count => best,
                _ => Some((name, count)),
            })
            .map(|(name, count)| TopContinent {
                name: name.to_string(),
                count,
            });

        let attendance_sum: f64 = records.iter().filter_map(|r| r.props.attendance).sum();
        let avg_attendance = (attendance_sum / total as f64).round().max(0.0) as u64;

        let attendance = |r: &Record| r.props.attendance.unwrap_or(0.0);
        let largest = records
            .iter()
            .copied()
            .reduce(|max, r| if attendance(r) > attendance(max) { r } else { max })
            .map(|r| Largest {
                id: r.id.clone(),
                name: r.props.name.clone(),
                attendance: r.props.attendance_label.clone(),
            });

        Self {
            total,
            continents: continent_counts.len(),
            avg_attendance,
            top_continent,
            largest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::Feature;
    use serde_json::{json, Value};

    fn record(properties: Value, index: usize) -> Record {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "properties": properties,
            "geometry": { "type": "Point", "coordinates": [0, 0] }
        }))
        .unwrap();
        Record::from_feature(feature, index)
    }

    fn records(props: Vec<Value>) -> Vec<Record> {
        props
            .into_iter()
            .enumerate()
            .map(|(i, p)| record(p, i))
            .collect()
    }

    fn refs(records: &[Record]) -> Vec<&Record> {
        records.iter().collect()
    }

    #[test]
    fn test_category_distribution_sums_to_total() {
        let records = records(vec![
            json!({ "type": "cartografia" }),
            json!({ "category": "webgis" }),
            json!({ "type": "cartografia" }),
            json!({}),
        ]);
        let distribution = category_distribution(&refs(&records));
        assert_eq!(
            distribution,
            vec![
                ("cartografia".to_string(), 2),
                ("webgis".to_string(), 1),
                ("unknown".to_string(), 1)
            ]
        );
        let sum: usize = distribution.iter().map(|(_, n)| n).sum();
        assert_eq!(sum, records.len());
    }

    #[test]
    fn test_timeline_sorted_by_month() {
        let records = records(vec![
            json!({ "date": "2024-03-10" }),
            json!({ "date": "2023-12-01" }),
            json!({ "date": "2024-03-28" }),
            json!({ "name": "sem data" }),
        ]);
        let months: Vec<(String, usize)> = timeline(&refs(&records)).into_iter().collect();
        assert_eq!(
            months,
            vec![("2023-12".to_string(), 1), ("2024-03".to_string(), 2)]
        );
    }

    #[test]
    fn test_regional_average_single_value_is_exact() {
        let records = records(vec![json!({ "region": "Norte", "value": 85.37 })]);
        assert_eq!(
            regional_average(&refs(&records)),
            vec![("Norte".to_string(), 85.37)]
        );
    }

    #[test]
    fn test_regional_average_skips_missing_values() {
        let records = records(vec![
            json!({ "region": "Sul", "value": 10 }),
            json!({ "region": "Sul", "value": 20 }),
            json!({ "region": "Sul" }),
            json!({ "region": "Leste" }),
            json!({ "value": 4 }),
        ]);
        let averages = regional_average(&refs(&records));
        assert_eq!(
            averages,
            vec![
                ("Sul".to_string(), 15.0),
                (UNSPECIFIED_REGION.to_string(), 4.0)
            ]
        );
    }

    #[test]
    fn test_time_of_day_boundaries() {
        assert_eq!(DayPeriod::from_hour(6), DayPeriod::Morning);
        assert_eq!(DayPeriod::from_hour(11), DayPeriod::Morning);
        assert_eq!(DayPeriod::from_hour(12), DayPeriod::Afternoon);
        assert_eq!(DayPeriod::from_hour(18), DayPeriod::Evening);
        assert_eq!(DayPeriod::from_hour(23), DayPeriod::Evening);
        assert_eq!(DayPeriod::from_hour(0), DayPeriod::Night);
        assert_eq!(DayPeriod::from_hour(5), DayPeriod::Night);
    }

    #[test]
    fn test_time_of_day_counts() {
        let records = records(vec![
            json!({ "timestamp": "2024-01-01T06:00:00" }),
            json!({ "timestamp": "2024-01-01T11:59:00" }),
            json!({ "timestamp": "2024-01-01T12:00:00" }),
            json!({ "timestamp": "2024-01-01T00:00:00" }),
            json!({ "name": "sem horário" }),
        ]);
        let density = time_of_day(&refs(&records));
        assert_eq!(density.counts(), [2, 1, 0, 1]);
        assert!(density.total() <= records.len());
    }

    #[test]
    fn test_stats() {
        let records = records(vec![
            json!({ "name": "A", "continent": "Europa", "attendance_numeric": 40000,
                    "attendance": "40.000" }),
            json!({ "name": "B", "continent": "Ásia", "attendance_numeric": 5000 }),
            json!({ "name": "C", "continent": "Europa" }),
        ]);
        let stats = DashboardStats::compute(&refs(&records));
        assert_eq!(stats.total, 3);
        assert_eq!(stats.continents, 2);
        // (40000 + 5000 + 0) / 3
        assert_eq!(stats.avg_attendance, 15000);
        assert_eq!(
            stats.top_continent,
            Some(TopContinent {
                name: "Europa".to_string(),
                count: 2
            })
        );
        let largest = stats.largest.unwrap();
        assert_eq!(largest.name, "A");
        assert_eq!(largest.attendance.as_deref(), Some("40.000"));
    }

    #[test]
    fn test_stats_empty() {
        assert_eq!(DashboardStats::compute(&[]), DashboardStats::default());
    }

    #[test]
    fn test_top_continent_tie_keeps_first() {
        let records = records(vec![
            json!({ "continent": "Ásia" }),
            json!({ "continent": "Europa" }),
        ]);
        let stats = DashboardStats::compute(&refs(&records));
        assert_eq!(stats.top_continent.unwrap().name, "Ásia");
    }
}
