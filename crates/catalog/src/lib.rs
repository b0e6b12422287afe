use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One deep-zoom image the annotation store can serve, together with the
/// annotation files linked to it.
///
/// `dzi_file` is the catalog key: the same name the viewport session
/// selects and the fetch endpoints take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub dzi_file: String,
    /// Display name; defaults to the file name minus the `.dzi` suffix.
    pub name: String,
    /// Annotation source files linked to this image, in link order.
    #[serde(default)]
    pub annotation_files: Vec<String>,
}

impl ImageEntry {
    pub fn new(dzi_file: impl Into<String>) -> Self {
        let dzi_file = dzi_file.into();
        let name = dzi_file
            .strip_suffix(".dzi")
            .unwrap_or(&dzi_file)
            .to_string();
        Self {
            dzi_file,
            name,
            annotation_files: Vec::new(),
        }
    }
}

/// Serializable catalog state. `BTreeMap` keeps listing order stable.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub entries: BTreeMap<String, ImageEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    NotFound,
    Corrupt(String),
    Io(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::NotFound => write!(f, "image not found in catalog"),
            CatalogError::Corrupt(msg) => write!(f, "catalog state corrupt: {msg}"),
            CatalogError::Io(msg) => write!(f, "catalog storage error: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Storage seam for the image catalog. The in-memory store below backs
/// tests and hosts that refresh from the server on startup; persistent
/// backends implement the same surface.
pub trait CatalogStore {
    fn list(&self) -> Result<Vec<ImageEntry>, CatalogError>;
    fn get(&self, dzi_file: &str) -> Result<Option<ImageEntry>, CatalogError>;
    fn upsert(&mut self, entry: ImageEntry) -> Result<(), CatalogError>;
    fn delete(&mut self, dzi_file: &str) -> Result<bool, CatalogError>;

    /// Record that an annotation file was linked to an image
    /// (the upload flow). Linking the same file twice is a no-op;
    /// linking to an unknown image is `NotFound`.
    fn link_annotation(
        &mut self,
        dzi_file: &str,
        annotation_file: &str,
    ) -> Result<(), CatalogError> {
        let mut entry = self.get(dzi_file)?.ok_or(CatalogError::NotFound)?;
        if !entry
            .annotation_files
            .iter()
            .any(|f| f == annotation_file)
        {
            entry.annotation_files.push(annotation_file.to_string());
        }
        self.upsert(entry)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    snapshot: CatalogSnapshot,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the catalog with a fresh server listing. Existing link
    /// records are kept for images still present.
    pub fn refresh(&mut self, available: impl IntoIterator<Item = String>) {
        let mut entries = BTreeMap::new();
        for dzi_file in available {
            let entry = self
                .snapshot
                .entries
                .remove(&dzi_file)
                .unwrap_or_else(|| ImageEntry::new(dzi_file.clone()));
            entries.insert(dzi_file, entry);
        }
        self.snapshot.entries = entries;
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn list(&self) -> Result<Vec<ImageEntry>, CatalogError> {
        Ok(self.snapshot.entries.values().cloned().collect())
    }

    fn get(&self, dzi_file: &str) -> Result<Option<ImageEntry>, CatalogError> {
        Ok(self.snapshot.entries.get(dzi_file).cloned())
    }

    fn upsert(&mut self, entry: ImageEntry) -> Result<(), CatalogError> {
        self.snapshot.entries.insert(entry.dzi_file.clone(), entry);
        Ok(())
    }

    fn delete(&mut self, dzi_file: &str) -> Result<bool, CatalogError> {
        Ok(self.snapshot.entries.remove(dzi_file).is_some())
    }
}
