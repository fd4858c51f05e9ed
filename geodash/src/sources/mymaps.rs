//! Adapter Google My Maps: couches exportées en KML
//!
//! Chaque Placemark devient une feature Point. Si aucune couche ne fournit de
//! feature, l'adapter renvoie la carte à intégrer en iframe.

use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use kml_flat::{ParseResult, Placemark};
use tracing::{debug, info, warn};

use super::{
    tag_features, DataLoader, EmbedDescriptor, Fetch, SourceData, SourceError,
};
use crate::config::{MyMapsConfig, NamedUrl};
use crate::report::LoadReport;
use crate::schema::SourceKind;

pub struct MyMapsSource {
    config: MyMapsConfig,
    fetcher: Arc<dyn Fetch>,
}

impl MyMapsSource {
    pub fn new(config: &MyMapsConfig, fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            config: config.clone(),
            fetcher,
        }
    }

    pub fn embed(&self) -> EmbedDescriptor {
        EmbedDescriptor::for_map(&self.config.map_id, &self.config.language)
    }

    async fn fetch_layer(&self, layer: &NamedUrl) -> Result<ParseResult, SourceError> {
        let bytes = self.fetcher.fetch(&layer.url).await?;
        Ok(kml_flat::parse(&bytes)?)
    }

    /// Charge toutes les couches; repli sur l'embed si aucune feature
    pub async fn load_data(&self, report: &mut LoadReport) -> Result<SourceData, SourceError> {
        let results = join_all(self.config.layers.iter().map(|l| self.fetch_layer(l))).await;

        let mut features = Vec::new();
        for (layer, result) in self.config.layers.iter().zip(results) {
            match result {
                Ok(parsed) => {
                    for e in &parsed.errors {
                        debug!(layer = %layer.name, error = %e, "Placemark ignoré");
                        report.record_warning(&layer.name, e.to_string());
                    }

                    let mut collection = placemarks_to_collection(&parsed.placemarks);
                    tag_features(
                        &mut collection,
                        &[
                            ("layer", layer.name.as_str()),
                            ("source", SourceKind::MyMaps.as_str()),
                            ("area", self.config.area_for_layer(&layer.name)),
                        ],
                    );
                    report.record_success(
                        SourceKind::MyMaps,
                        &layer.name,
                        &layer.url,
                        collection.features.len(),
                    );
                    features.extend(collection.features);
                }
                Err(e) => {
                    warn!(layer = %layer.name, error = %e, "Couche KML ignorée");
                    report.record_failure(SourceKind::MyMaps, &layer.name, &layer.url, &e.to_string());
                }
            }
        }

        if features.is_empty() {
            let embed = self.embed();
            info!(url = %embed.url, "Aucune feature My Maps, mode embed");
            report.record_warning(
                SourceKind::MyMaps.as_str(),
                "No KML feature loaded, falling back to embedded map",
            );
            return Ok(SourceData::Embed(embed));
        }

        info!(features = features.len(), "My Maps chargé");
        Ok(SourceData::Features(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }))
    }
}

impl DataLoader for MyMapsSource {
    fn load<'a>(
        &'a self,
        report: &'a mut LoadReport,
    ) -> BoxFuture<'a, Result<FeatureCollection, SourceError>> {
        async move {
            match self.load_data(report).await? {
                SourceData::Features(collection) => Ok(collection),
                SourceData::Embed(embed) => {
                    report.set_embed(embed);
                    Ok(FeatureCollection {
                        bbox: None,
                        features: Vec::new(),
                        foreign_members: None,
                    })
                }
            }
        }
        .boxed()
    }
}

/// Placemark -> feature Point `{name, description, type: "point"}`
pub fn placemark_to_feature(placemark: &Placemark) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("name".to_string(), JsonValue::String(placemark.display_name()));
    properties.insert(
        "description".to_string(),
        JsonValue::String(placemark.description.clone().unwrap_or_default()),
    );
    properties.insert("type".to_string(), JsonValue::String("point".to_string()));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::from(&placemark.point))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn placemarks_to_collection(placemarks: &[Placemark]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: placemarks.iter().map(placemark_to_feature).collect(),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::sources::StaticFetcher;

    const LAYER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2"><Document>
  <Placemark><name>Curso QGIS</name><Point><coordinates>-46.63,-23.55,0</coordinates></Point></Placemark>
  <Placemark><Point><coordinates>-43.2,-22.9</coordinates></Point></Placemark>
  <Placemark><name>Sem ponto</name></Placemark>
</Document></kml>"#;

    fn config() -> MyMapsConfig {
        Config::from_preset("default").unwrap().my_maps
    }

    #[test]
    fn test_placemark_to_feature() {
        let parsed = kml_flat::parse(LAYER.as_bytes()).unwrap();
        let feature = placemark_to_feature(&parsed.placemarks[0]);

        let props = feature.properties.as_ref().unwrap();
        assert_eq!(props["name"], "Curso QGIS");
        assert_eq!(props["type"], "point");
        assert_eq!(props["description"], "");
        match feature.geometry.map(|g| g.value) {
            Some(geojson::Value::Point(coords)) => assert_eq!(coords, vec![-46.63, -23.55]),
            other => panic!("expected Point, got {:?}", other),
        }

        let unnamed = placemark_to_feature(&parsed.placemarks[1]);
        assert_eq!(unnamed.properties.unwrap()["name"], "Feature 1");
    }

    #[tokio::test]
    async fn test_load_layers_with_tags() {
        let config = config();
        let fetcher = StaticFetcher::new().with(config.layers[0].url.clone(), LAYER);
        let source = MyMapsSource::new(&config, Arc::new(fetcher));
        let mut report = LoadReport::new();

        let data = source.load_data(&mut report).await.unwrap();
        let SourceData::Features(collection) = data else {
            panic!("expected features");
        };
        assert_eq!(collection.features.len(), 2);

        let props = collection.features[0].properties.as_ref().unwrap();
        assert_eq!(props["layer"], "geoprocessamento");
        assert_eq!(props["source"], "my_maps");
        assert_eq!(props["area"], "cartografia");

        assert_eq!(report.sources_ok(), 1);
        assert_eq!(report.sources_failed(), 2);
        // Placemark sans coordonnées
        assert_eq!(report.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_no_feature_falls_back_to_embed() {
        let source = MyMapsSource::new(&config(), Arc::new(StaticFetcher::new()));
        let mut report = LoadReport::new();

        match source.load_data(&mut report).await.unwrap() {
            SourceData::Embed(embed) => {
                assert!(embed.url.contains("mid=1adej1ZKSiAOyUe4Uu9jPBV6P6DalfQk"));
            }
            SourceData::Features(_) => panic!("expected embed"),
        }
    }

    #[tokio::test]
    async fn test_data_loader_records_embed() {
        let source = MyMapsSource::new(&config(), Arc::new(StaticFetcher::new()));
        let mut report = LoadReport::new();

        let collection = source.load(&mut report).await.unwrap();
        assert!(collection.features.is_empty());
        assert!(report.embed.is_some());
    }
}
