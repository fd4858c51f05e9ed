//! Chargement intégré: Colab + My Maps, fusionnés

use futures::future::BoxFuture;
use futures::FutureExt;
use geojson::FeatureCollection;
use tracing::{info, warn};

use super::{ColabSource, DataLoader, MyMapsSource, SourceData, SourceError};
use crate::merge::merge;
use crate::report::LoadReport;
use crate::schema::SourceKind;

pub struct IntegratedLoader {
    colab: ColabSource,
    my_maps: MyMapsSource,
}

impl IntegratedLoader {
    pub fn new(colab: ColabSource, my_maps: MyMapsSource) -> Self {
        Self { colab, my_maps }
    }
}

impl DataLoader for IntegratedLoader {
    fn load<'a>(
        &'a self,
        report: &'a mut LoadReport,
    ) -> BoxFuture<'a, Result<FeatureCollection, SourceError>> {
        async move {
            // Un rapport par adapter: les deux chargements tournent en même temps
            let mut colab_report = LoadReport::new();
            let mut my_maps_report = LoadReport::new();
            let (colab, my_maps) = futures::join!(
                self.colab.load(&mut colab_report),
                self.my_maps.load_data(&mut my_maps_report)
            );
            // Exemple Colab et embed My Maps ne sont pas des données réelles
            let loaded = colab_report.sources_ok() + my_maps_report.sources_ok();
            report.absorb(colab_report);
            report.absorb(my_maps_report);

            let mut inputs = Vec::with_capacity(2);
            let mut failures = 0;

            match colab {
                Ok(collection) => inputs.push((SourceKind::Colab, collection)),
                Err(e) => {
                    failures += 1;
                    warn!(error = %e, "Source Colab indisponible");
                    report.record_warning(SourceKind::Colab.as_str(), e.to_string());
                }
            }

            match my_maps {
                Ok(SourceData::Features(collection)) => {
                    inputs.push((SourceKind::MyMaps, collection))
                }
                Ok(SourceData::Embed(embed)) => report.set_embed(embed),
                Err(e) => {
                    failures += 1;
                    warn!(error = %e, "Source My Maps indisponible");
                    report.record_warning(SourceKind::MyMaps.as_str(), e.to_string());
                }
            }

            if failures == 2 || loaded == 0 {
                return Err(SourceError::NoData("colab + my_maps".to_string()));
            }

            let merged = merge(inputs);
            info!(
                total = merged.features.len(),
                colab = report.features_from(SourceKind::Colab),
                my_maps = report.features_from(SourceKind::MyMaps),
                "Données intégrées"
            );
            Ok(merged)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::sources::StaticFetcher;
    use std::sync::Arc;

    const GIST: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"name":"A"},"geometry":{"type":"Point","coordinates":[1,1]}},
        {"type":"Feature","properties":{"name":"B"},"geometry":{"type":"Point","coordinates":[2,2]}},
        {"type":"Feature","properties":{"name":"C"},"geometry":{"type":"Point","coordinates":[3,3]}}
    ]}"#;

    const KML: &str = "<kml><Placemark><name>D</name><coordinates>4,4</coordinates></Placemark>\
                       <Placemark><name>E</name><coordinates>5,5</coordinates></Placemark></kml>";

    fn loader(fetcher: StaticFetcher) -> IntegratedLoader {
        let config = Config::from_preset("default").unwrap();
        let fetcher = Arc::new(fetcher);
        IntegratedLoader::new(
            ColabSource::new(&config.colab, config.areas.clone(), fetcher.clone()),
            MyMapsSource::new(&config.my_maps, fetcher),
        )
    }

    #[tokio::test]
    async fn test_merges_both_sources() {
        let config = Config::from_preset("default").unwrap();
        let fetcher = StaticFetcher::new()
            .with(config.colab.datasets[0].url.clone(), GIST)
            .with(config.my_maps.layers[2].url.clone(), KML);
        let mut report = LoadReport::new();

        let merged = loader(fetcher).load(&mut report).await.unwrap();
        assert_eq!(merged.features.len(), 5);

        let kinds: Vec<&str> = merged
            .features
            .iter()
            .map(|f| f.properties.as_ref().unwrap()["source_type"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["colab", "colab", "colab", "my_maps", "my_maps"]);
        assert!(report.embed.is_none());
        assert_eq!(report.sources_ok(), 2);
    }

    #[tokio::test]
    async fn test_nothing_reachable_is_no_data() {
        let mut report = LoadReport::new();

        let result = loader(StaticFetcher::new()).load(&mut report).await;
        assert!(matches!(result, Err(SourceError::NoData(_))));
        // L'embed reste disponible pour la page
        assert!(report.embed.is_some());
        assert_eq!(report.sources_ok(), 0);
        assert_eq!(report.sources_failed(), 6);
    }

    #[tokio::test]
    async fn test_single_real_source_is_enough() {
        let config = Config::from_preset("default").unwrap();
        let fetcher = StaticFetcher::new().with(config.my_maps.layers[0].url.clone(), KML);
        let mut report = LoadReport::new();

        // Colab retombe sur son exemple, My Maps fournit deux features
        let merged = loader(fetcher).load(&mut report).await.unwrap();
        assert_eq!(merged.features.len(), 3);
        assert_eq!(report.sources_ok(), 1);
    }
}
