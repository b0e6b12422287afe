use std::collections::BTreeMap;

/// Per-(source file, classification name) visibility toggles.
///
/// Entries are created on first load of a data source and mutated only by
/// explicit user toggles. Unknown pairs default to visible. The map
/// persists across pan/zoom but is reset on a data-source change.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VisibilityMap {
    entries: BTreeMap<(String, String), bool>,
}

impl VisibilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a classification seen in fetched data, defaulting to
    /// visible. Existing toggles are preserved.
    pub fn register(&mut self, source: &str, name: &str) {
        self.entries
            .entry((source.to_string(), name.to_string()))
            .or_insert(true);
    }

    pub fn is_visible(&self, source: &str, name: &str) -> bool {
        self.entries
            .get(&(source.to_string(), name.to_string()))
            .copied()
            .unwrap_or(true)
    }

    pub fn set_visible(&mut self, source: &str, name: &str, visible: bool) {
        self.entries
            .insert((source.to_string(), name.to_string()), visible);
    }

    /// Flip a toggle; returns the new visibility.
    pub fn toggle(&mut self, source: &str, name: &str) -> bool {
        let entry = self
            .entries
            .entry((source.to_string(), name.to_string()))
            .or_insert(true);
        *entry = !*entry;
        *entry
    }

    /// Classifications known for a source, in name order.
    pub fn classifications<'a>(
        &'a self,
        source: &'a str,
    ) -> impl Iterator<Item = (&'a str, bool)> + 'a {
        self.entries
            .iter()
            .filter(move |((s, _), _)| s == source)
            .map(|((_, n), v)| (n.as_str(), *v))
    }

    /// Fresh-session reset (new image selection).
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}
