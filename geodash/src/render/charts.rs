//! Configurations Chart.js des quatre graphiques

use serde::Serialize;
use serde_json::{json, Value};

use crate::aggregate::{self, DayPeriod};
use crate::schema::Record;

/// Palette verte du graphique de distribution
pub const PALETTE: [&str; 8] = [
    "#2E7D32", "#4CAF50", "#81C784", "#A5D6A7", "#C8E6C9", "#1B5E20", "#388E3C", "#66BB6A",
];

/// Configuration `new Chart(ctx, config)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: ChartData,
    pub options: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub data: Vec<f64>,
    /// Couleurs, bordures, remplissage
    #[serde(flatten)]
    pub style: Value,
}

impl ChartConfig {
    /// Valeurs du premier dataset
    pub fn values(&self) -> &[f64] {
        self.data
            .datasets
            .first()
            .map(|d| d.data.as_slice())
            .unwrap_or(&[])
    }
}

/// Les quatre graphiques, recalculés ensemble
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Charts {
    pub distribution: ChartConfig,
    pub timeline: ChartConfig,
    pub region: ChartConfig,
    pub density: ChartConfig,
}

impl Charts {
    pub fn render(records: &[&Record]) -> Self {
        Self {
            distribution: distribution_chart(records),
            timeline: timeline_chart(records),
            region: region_chart(records),
            density: density_chart(records),
        }
    }
}

/// Camembert: features par catégorie
pub fn distribution_chart(records: &[&Record]) -> ChartConfig {
    let (labels, data): (Vec<String>, Vec<f64>) = aggregate::category_distribution(records)
        .into_iter()
        .map(|(category, count)| (category, count as f64))
        .unzip();

    ChartConfig {
        kind: "pie",
        data: ChartData {
            labels,
            datasets: vec![Dataset {
                label: None,
                data,
                style: json!({ "backgroundColor": PALETTE, "borderWidth": 1 }),
            }],
        },
        options: json!({
            "responsive": true,
            "maintainAspectRatio": false,
            "plugins": { "legend": { "position": "right" } }
        }),
    }
}

/// Courbe: occurrences par mois
pub fn timeline_chart(records: &[&Record]) -> ChartConfig {
    let (labels, data): (Vec<String>, Vec<f64>) = aggregate::timeline(records)
        .into_iter()
        .map(|(month, count)| (month, count as f64))
        .unzip();

    ChartConfig {
        kind: "line",
        data: ChartData {
            labels,
            datasets: vec![Dataset {
                label: Some("Occurrences per month".to_string()),
                data,
                style: json!({
                    "borderColor": "#2E7D32",
                    "backgroundColor": "rgba(46, 125, 50, 0.1)",
                    "fill": true,
                    "tension": 0.4
                }),
            }],
        },
        options: json!({
            "responsive": true,
            "maintainAspectRatio": false,
            "scales": {
                "y": { "beginAtZero": true, "title": { "display": true, "text": "Count" } },
                "x": { "title": { "display": true, "text": "Period" } }
            }
        }),
    }
}

/// Barres: valeur moyenne par région
pub fn region_chart(records: &[&Record]) -> ChartConfig {
    let (labels, data): (Vec<String>, Vec<f64>) =
        aggregate::regional_average(records).into_iter().unzip();

    ChartConfig {
        kind: "bar",
        data: ChartData {
            labels,
            datasets: vec![Dataset {
                label: Some("Average value".to_string()),
                data,
                style: json!({
                    "backgroundColor": "#4CAF50",
                    "borderColor": "#2E7D32",
                    "borderWidth": 1
                }),
            }],
        },
        options: json!({
            "responsive": true,
            "maintainAspectRatio": false,
            "scales": {
                "y": { "beginAtZero": true, "title": { "display": true, "text": "Value" } }
            }
        }),
    }
}

/// Radar: densité par tranche horaire
pub fn density_chart(records: &[&Record]) -> ChartConfig {
    let density = aggregate::time_of_day(records);

    ChartConfig {
        kind: "radar",
        data: ChartData {
            labels: DayPeriod::ALL.iter().map(|p| p.label().to_string()).collect(),
            datasets: vec![Dataset {
                label: Some("Density per period".to_string()),
                data: density.counts().iter().map(|&n| n as f64).collect(),
                style: json!({
                    "backgroundColor": "rgba(76, 175, 80, 0.2)",
                    "borderColor": "#4CAF50",
                    "borderWidth": 2,
                    "pointBackgroundColor": "#2E7D32"
                }),
            }],
        },
        options: json!({
            "responsive": true,
            "maintainAspectRatio": false,
            "scales": { "r": { "beginAtZero": true, "ticks": { "stepSize": 5 } } }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::Feature;

    fn record(properties: Value, index: usize) -> Record {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature", "properties": properties, "geometry": null
        }))
        .unwrap();
        Record::from_feature(feature, index)
    }

    #[test]
    fn test_charts_from_records() {
        let records = [
            record(json!({ "type": "webgis", "date": "2024-03-10", "region": "Sul", "value": 80,
                           "timestamp": "2024-03-10T09:00:00" }), 0),
            record(json!({ "type": "webgis", "date": "2024-01-15", "region": "Sul", "value": 90 }), 1),
            record(json!({ "type": "cartografia" }), 2),
        ];
        let refs: Vec<&Record> = records.iter().collect();
        let charts = Charts::render(&refs);

        assert_eq!(charts.distribution.kind, "pie");
        assert_eq!(charts.distribution.data.labels, vec!["webgis", "cartografia"]);
        assert_eq!(charts.distribution.values(), &[2.0, 1.0]);

        assert_eq!(charts.timeline.data.labels, vec!["2024-01", "2024-03"]);
        assert_eq!(charts.region.values(), &[85.0]);

        assert_eq!(
            charts.density.data.labels,
            vec!["Morning", "Afternoon", "Evening", "Night"]
        );
        assert_eq!(charts.density.values(), &[1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_chart_serialization_is_chartjs_shaped() {
        let json = serde_json::to_value(distribution_chart(&[])).unwrap();
        assert_eq!(json["type"], "pie");
        assert_eq!(json["data"]["datasets"][0]["backgroundColor"][0], "#2E7D32");
        assert!(json["data"]["datasets"][0].get("label").is_none());
        assert_eq!(json["options"]["plugins"]["legend"]["position"], "right");
    }
}
