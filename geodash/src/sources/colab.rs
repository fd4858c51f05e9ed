//! Adapter Google Colab: GeoJSON exportés depuis les notebooks (Gists)

use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use geojson::FeatureCollection;
use tracing::{info, warn};

use super::{parse_collection, sample, tag_features, DataLoader, Fetch, SourceError, DEFAULT_AREA};
use crate::config::{AreaConfig, ColabConfig, NamedUrl};
use crate::report::LoadReport;
use crate::schema::SourceKind;

pub struct ColabSource {
    datasets: Vec<NamedUrl>,
    areas: Vec<AreaConfig>,
    fetcher: Arc<dyn Fetch>,
}

impl ColabSource {
    pub fn new(config: &ColabConfig, areas: Vec<AreaConfig>, fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            datasets: config.datasets.clone(),
            areas,
            fetcher,
        }
    }

    async fn fetch_dataset(&self, dataset: &NamedUrl) -> Result<FeatureCollection, SourceError> {
        let bytes = self.fetcher.fetch(&dataset.url).await?;
        let mut collection = parse_collection(&bytes)?;

        let area = detect_area(&dataset.name, &self.areas);
        tag_features(
            &mut collection,
            &[("source", "colab"), ("dataset", dataset.name.as_str()), ("area", area)],
        );
        Ok(collection)
    }
}

impl DataLoader for ColabSource {
    fn load<'a>(
        &'a self,
        report: &'a mut LoadReport,
    ) -> BoxFuture<'a, Result<FeatureCollection, SourceError>> {
        async move {
            // Tous les datasets en parallèle, sans limite
            let results =
                join_all(self.datasets.iter().map(|dataset| self.fetch_dataset(dataset))).await;

            let mut features = Vec::new();
            let mut loaded = 0;
            for (dataset, result) in self.datasets.iter().zip(results) {
                match result {
                    Ok(collection) => {
                        loaded += 1;
                        report.record_success(
                            SourceKind::Colab,
                            &dataset.name,
                            &dataset.url,
                            collection.features.len(),
                        );
                        features.extend(collection.features);
                    }
                    Err(e) => {
                        warn!(dataset = %dataset.name, error = %e, "Dataset Colab ignoré");
                        report.record_failure(
                            SourceKind::Colab,
                            &dataset.name,
                            &dataset.url,
                            &e.to_string(),
                        );
                    }
                }
            }

            if loaded == 0 && !self.datasets.is_empty() {
                warn!("Aucun dataset Colab chargé, utilisation de l'exemple");
                report.record_warning(
                    SourceKind::Colab.as_str(),
                    "No dataset loaded, using sample data",
                );
                return Ok(sample::colab_sample());
            }

            info!(datasets = loaded, features = features.len(), "Colab chargé");
            Ok(FeatureCollection {
                bbox: None,
                features,
                foreign_members: None,
            })
        }
        .boxed()
    }
}

/// Aire d'un dataset d'après les mots-clés de son nom
///
/// Premier aire (ordre de configuration) dont un mot-clé apparaît dans le nom.
pub fn detect_area<'a>(dataset: &str, areas: &'a [AreaConfig]) -> &'a str {
    let name = dataset.to_lowercase();
    areas
        .iter()
        .find(|area| {
            area.keywords
                .iter()
                .any(|keyword| name.contains(&keyword.to_lowercase()))
        })
        .map_or(DEFAULT_AREA, |area| area.id.as_str())
}
