//! Source GeoJSON unique (`dashboard.data_url`)

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use geojson::FeatureCollection;
use tracing::{info, warn};

use super::{parse_collection, DataLoader, Fetch, SourceError};
use crate::merge::merge;
use crate::report::LoadReport;
use crate::schema::SourceKind;

pub struct GeoJsonSource {
    url: String,
    fetcher: Arc<dyn Fetch>,
}

impl GeoJsonSource {
    pub fn new(url: impl Into<String>, fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            url: url.into(),
            fetcher,
        }
    }

    async fn fetch_collection(&self) -> Result<FeatureCollection, SourceError> {
        let bytes = self.fetcher.fetch(&self.url).await?;
        parse_collection(&bytes)
    }
}

impl DataLoader for GeoJsonSource {
    fn load<'a>(
        &'a self,
        report: &'a mut LoadReport,
    ) -> BoxFuture<'a, Result<FeatureCollection, SourceError>> {
        async move {
            let name = SourceKind::GeoJson.as_str();
            match self.fetch_collection().await {
                Ok(collection) => {
                    info!(url = %self.url, features = collection.features.len(), "GeoJSON chargé");
                    report.record_success(
                        SourceKind::GeoJson,
                        name,
                        &self.url,
                        collection.features.len(),
                    );
                    Ok(merge([(SourceKind::GeoJson, collection)]))
                }
                Err(e) => {
                    warn!(url = %self.url, error = %e, "Impossible de charger le GeoJSON");
                    report.record_failure(SourceKind::GeoJson, name, &self.url, &e.to_string());
                    Err(e)
                }
            }
        }
        .boxed()
    }
}
