use std::collections::BTreeMap;

use crate::feature::{Feature, FeatureId};

/// Accumulated annotation features, grouped by source file and
/// deduplicated by id.
///
/// Successive viewport fetches overlap; merging keeps one feature per id
/// with last-fetched-wins on conflict. Features without an id cannot be
/// deduplicated and are dropped at the merge boundary.
///
/// Keyed with `BTreeMap`s for deterministic traversal order.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    by_source: BTreeMap<String, BTreeMap<FeatureId, Feature>>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one fetch's worth of features for a source file.
    ///
    /// Returns the number of features applied (id-less records excluded).
    pub fn merge(&mut self, source: &str, features: Vec<Feature>) -> usize {
        let entry = self.by_source.entry(source.to_string()).or_default();
        let mut applied = 0;
        for feature in features {
            let Some(id) = feature.id.clone() else {
                continue;
            };
            entry.insert(id, feature);
            applied += 1;
        }
        applied
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.by_source.keys().map(|s| s.as_str())
    }

    pub fn features(&self, source: &str) -> impl Iterator<Item = &Feature> {
        self.by_source
            .get(source)
            .into_iter()
            .flat_map(|m| m.values())
    }

    /// All features across sources, in (source, id) order.
    pub fn iter_all(&self) -> impl Iterator<Item = (&str, &Feature)> {
        self.by_source
            .iter()
            .flat_map(|(s, m)| m.values().map(move |f| (s.as_str(), f)))
    }

    pub fn len(&self) -> usize {
        self.by_source.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.values().all(|m| m.is_empty())
    }

    /// Drop all accumulated state (data-source switch).
    pub fn clear(&mut self) {
        self.by_source.clear();
    }
}
