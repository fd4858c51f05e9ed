//! Fusion des collections de plusieurs sources
//!
//! Concaténation simple: pas de déduplication, une feature présente dans deux
//! sources apparaît deux fois.

use geojson::{FeatureCollection, JsonObject, JsonValue};
use tracing::debug;

use crate::schema::SourceKind;

/// Concatène les collections et marque chaque feature avec `source_type` et `icon`
pub fn merge<I>(inputs: I) -> FeatureCollection
where
    I: IntoIterator<Item = (SourceKind, FeatureCollection)>,
{
    let mut features = Vec::new();

    for (kind, collection) in inputs {
        let count = collection.features.len();
        features.extend(collection.features.into_iter().map(|mut feature| {
            tag(feature.properties.get_or_insert_with(JsonObject::new), kind);
            feature
        }));
        debug!(source = %kind, features = count, "Source fusionnée");
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn tag(properties: &mut JsonObject, kind: SourceKind) {
    properties.insert(
        "source_type".to_string(),
        JsonValue::String(kind.as_str().to_string()),
    );
    properties.insert(
        "icon".to_string(),
        JsonValue::String(kind.icon().to_string()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn points(names: &[&str]) -> FeatureCollection {
        let features: Vec<JsonValue> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                json!({
                    "type": "Feature",
                    "properties": { "name": name, "value": i },
                    "geometry": { "type": "Point", "coordinates": [i as f64, 0.0] }
                })
            })
            .collect();
        serde_json::from_value(json!({ "type": "FeatureCollection", "features": features }))
            .unwrap()
    }

    #[test]
    fn test_merge_three_and_two() {
        let merged = merge([
            (SourceKind::Colab, points(&["a", "b", "c"])),
            (SourceKind::MyMaps, points(&["d", "e"])),
        ]);

        assert_eq!(merged.features.len(), 5);
        for (i, feature) in merged.features.iter().enumerate() {
            let props = feature.properties.as_ref().unwrap();
            let expected = if i < 3 { "colab" } else { "my_maps" };
            assert_eq!(props["source_type"], expected);
            // Clés d'origine conservées
            assert!(props.contains_key("name"));
            assert!(props.contains_key("value"));
        }
        assert_eq!(
            merged.features[4].properties.as_ref().unwrap()["icon"],
            "fas fa-map-marker-alt"
        );
    }

    #[test]
    fn test_merge_does_not_deduplicate() {
        let merged = merge([
            (SourceKind::Colab, points(&["a"])),
            (SourceKind::Colab, points(&["a"])),
        ]);
        assert_eq!(merged.features.len(), 2);
    }

    #[test]
    fn test_merge_creates_missing_properties() {
        let bare: FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [{ "type": "Feature", "properties": null, "geometry": null }]
        }))
        .unwrap();
        let merged = merge([(SourceKind::GeoJson, bare)]);
        let props = merged.features[0].properties.as_ref().unwrap();
        assert_eq!(props["source_type"], "geojson");
        assert_eq!(props["icon"], "fas fa-globe");
    }

    #[test]
    fn test_merge_empty() {
        let merged = merge(Vec::<(SourceKind, FeatureCollection)>::new());
        assert!(merged.features.is_empty());
    }
}
