//! Store en mémoire des features fusionnées

use geojson::{Feature, FeatureCollection};
use tracing::debug;

use crate::schema::Record;

/// FeatureCollection courante, en ordre d'insertion
#[derive(Debug, Clone, Default)]
pub struct FeatureStore {
    records: Vec<Record>,
}

impl FeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_collection(collection: FeatureCollection) -> Self {
        let mut store = Self::new();
        store.replace(collection);
        store
    }

    /// Remplace tout le contenu (rechargement)
    pub fn replace(&mut self, collection: FeatureCollection) {
        self.records = collection
            .features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| Record::from_feature(feature, index))
            .collect();

        debug!(
            features = self.records.len(),
            without_point = self.records.iter().filter(|r| r.position.is_none()).count(),
            "Store rechargé"
        );
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Reconstruit la FeatureCollection (propriétés d'origine intactes)
    pub fn to_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self
                .records
                .iter()
                .map(|r| r.feature.clone())
                .collect::<Vec<Feature>>(),
            foreign_members: None,
        }
    }

    /// Continents distincts, dans l'ordre de première apparition
    pub fn continents(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for continent in self.records.iter().filter_map(|r| r.props.continent.as_ref()) {
            if !seen.contains(continent) {
                seen.push(continent.clone());
            }
        }
        seen
    }
}
