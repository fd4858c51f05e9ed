//! Jeux de données d'exemple (repli quand rien ne charge)

use geojson::FeatureCollection;
use serde_json::{json, Value};

fn collection(features: Value) -> FeatureCollection {
    let value = json!({ "type": "FeatureCollection", "features": features });
    // JSON littéral ci-dessous, toujours valide
    serde_json::from_value(value).unwrap_or_else(|_| FeatureCollection {
        bbox: None,
        features: Vec::new(),
        foreign_members: None,
    })
}

/// Repli de l'adapter Colab: une analyse NDVI
pub fn colab_sample() -> FeatureCollection {
    collection(json!([
        {
            "type": "Feature",
            "properties": {
                "name": "Exemplo do Colab - Análise NDVI",
                "value": 85,
                "type": "sensoriamento",
                "date": "2024-01-15",
                "description": "Índice de vegetação - Amazônia",
                "source": "colab"
            },
            "geometry": { "type": "Point", "coordinates": [-55.0, -10.0] }
        }
    ]))
}

/// Repli du dashboard quand aucune source n'a chargé
pub fn dashboard_fallback() -> FeatureCollection {
    collection(json!([
        {
            "type": "Feature",
            "properties": {
                "name": "Análise NDVI - Amazônia",
                "value": 85,
                "type": "sensoriamento",
                "area": "sensoriamento",
                "source": "colab",
                "date": "2024-01-15",
                "description": "Análise de vegetação usando Sentinel-2"
            },
            "geometry": { "type": "Point", "coordinates": [-55.0, -10.0] }
        },
        {
            "type": "Feature",
            "properties": {
                "name": "Mapa de Uso do Solo - SP",
                "value": 92,
                "type": "cartografia",
                "area": "cartografia",
                "source": "colab",
                "date": "2024-02-20",
                "description": "Classificação supervisionada Landsat-8"
            },
            "geometry": { "type": "Point", "coordinates": [-46.5, -23.5] }
        },
        {
            "type": "Feature",
            "properties": {
                "name": "Dashboard Web GIS",
                "value": 88,
                "type": "webgis",
                "area": "webgis",
                "source": "my_maps",
                "date": "2024-03-10",
                "description": "Mapa interativo com Leaflet.js"
            },
            "geometry": { "type": "Point", "coordinates": [-47.5, -15.5] }
        }
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_are_not_empty() {
        assert_eq!(colab_sample().features.len(), 1);

        let fallback = dashboard_fallback();
        assert_eq!(fallback.features.len(), 3);
        let areas: Vec<&str> = fallback
            .features
            .iter()
            .filter_map(|f| f.properties.as_ref()?.get("area")?.as_str())
            .collect();
        assert_eq!(areas, vec!["sensoriamento", "cartografia", "webgis"]);
    }
}
