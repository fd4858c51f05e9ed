//! Export GeoJSON en streaming
//!
//! Les features sont écrites une à une; la collection n'est jamais
//! reconstruite en mémoire.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::schema::Record;

/// Exporte des enregistrements dans un fichier GeoJSON
pub fn export_to_geojson(records: &[&Record], output_path: &Path) -> Result<usize> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create directory: {}", parent.display()))?;
    }

    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    let count = write_collection(&mut writer, records)?;
    writer.flush()?;

    Ok(count)
}

/// Écrit une FeatureCollection dans un flux
pub fn write_collection<W: Write>(writer: &mut W, records: &[&Record]) -> Result<usize> {
    write!(writer, r#"{{"type":"FeatureCollection","features":["#)?;

    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(writer, record)?;
    }

    write!(writer, "]}}")?;
    Ok(records.len())
}

/// Feature d'origine avec l'identifiant du store en `id`
#[derive(Serialize)]
struct ExportedFeature<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: &'a str,
    geometry: &'a Option<geojson::Geometry>,
    properties: &'a Option<geojson::JsonObject>,
}

fn write_feature<W: Write>(writer: &mut W, record: &Record) -> Result<()> {
    let feature = ExportedFeature {
        kind: "Feature",
        id: &record.id,
        geometry: &record.feature.geometry,
        properties: &record.feature.properties,
    };
    serde_json::to_writer(&mut *writer, &feature)
        .context(format!("Failed to serialize feature {}", record.id))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::{Feature, FeatureCollection, GeoJson};
    use serde_json::json;
    use std::io::Cursor;

    fn record(name: &str, index: usize) -> Record {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "properties": { "name": name, "source_type": "colab", "icon": "fas fa-code" },
            "geometry": { "type": "Point", "coordinates": [-46.5, -23.5] }
        }))
        .unwrap();
        Record::from_feature(feature, index)
    }

    #[test]
    fn test_write_collection_is_valid_geojson() {
        let a = record("Uso do \"Solo\"", 0);
        let b = record("NDVI\nAmazônia", 1);

        let mut buffer = Cursor::new(Vec::new());
        let count = write_collection(&mut buffer, &[&a, &b]).unwrap();
        assert_eq!(count, 2);

        let text = String::from_utf8(buffer.into_inner()).unwrap();
        let parsed: GeoJson = text.parse().unwrap();
        let GeoJson::FeatureCollection(FeatureCollection { features, .. }) = parsed else {
            panic!("expected a FeatureCollection");
        };
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].properties.as_ref().unwrap()["name"], "Uso do \"Solo\"");
        assert!(text.contains(&format!(r#""id":"{}""#, a.id)));
    }

    #[test]
    fn test_write_empty_collection() {
        let mut buffer = Cursor::new(Vec::new());
        write_collection(&mut buffer, &[]).unwrap();
        assert_eq!(
            String::from_utf8(buffer.into_inner()).unwrap(),
            r#"{"type":"FeatureCollection","features":[]}"#
        );
    }

    #[test]
    fn test_export_to_geojson() {
        let a = record("A", 0);
        let output_path = std::env::temp_dir()
            .join("geodash_export_test")
            .join("merged.geojson");

        let count = export_to_geojson(&[&a], &output_path).unwrap();
        assert_eq!(count, 1);

        let content = std::fs::read_to_string(&output_path).unwrap();
        assert!(content.contains(r#""source_type":"colab""#));

        std::fs::remove_file(output_path).ok();
    }
}
