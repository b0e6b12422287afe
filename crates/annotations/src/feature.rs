use serde::{Deserialize, Deserializer, Serialize};

/// Feature identity, used for de-duplication across overlapping viewport
/// fetches.
///
/// Exported annotation files carry ids as either JSON strings or integers;
/// both deserialize to the same key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FeatureId(pub String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for FeatureId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => FeatureId(s),
            Raw::Int(n) => FeatureId(n.to_string()),
        })
    }
}

/// GeoJSON-like geometry in image-pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point([f64; 2]),
    MultiPoint(Vec<[f64; 2]>),
    Polygon(Vec<Vec<[f64; 2]>>),
    MultiPolygon(Vec<Vec<Vec<[f64; 2]>>>),
}

impl Geometry {
    /// All representative point coordinates: the point itself for
    /// Point/MultiPoint, every ring vertex for Polygon/MultiPolygon.
    pub fn vertices(&self) -> Vec<[f64; 2]> {
        match self {
            Geometry::Point(p) => vec![*p],
            Geometry::MultiPoint(ps) => ps.clone(),
            Geometry::Polygon(rings) => rings.iter().flatten().copied().collect(),
            Geometry::MultiPolygon(polys) => {
                polys.iter().flatten().flatten().copied().collect()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point(_) => false,
            Geometry::MultiPoint(ps) => ps.is_empty(),
            Geometry::Polygon(rings) => rings.iter().all(|r| r.is_empty()),
            Geometry::MultiPolygon(polys) => {
                polys.iter().all(|p| p.iter().all(|r| r.is_empty()))
            }
        }
    }

    /// Mean of all vertices; `None` for empty geometry.
    pub fn centroid(&self) -> Option<[f64; 2]> {
        let vs = self.vertices();
        if vs.is_empty() {
            return None;
        }
        let n = vs.len() as f64;
        let sum = vs
            .iter()
            .fold([0.0, 0.0], |acc, v| [acc[0] + v[0], acc[1] + v[1]]);
        Some([sum[0] / n, sum[1] / n])
    }
}

/// The annotation's semantic type: display name plus an RGB color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub name: String,
    /// Missing colors are tolerated on the wire; the renderer skips such
    /// features rather than guessing.
    #[serde(default)]
    pub color: Option<[u8; 3]>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default)]
    pub classification: Option<Classification>,
}

/// A single annotation feature. Immutable once fetched.
///
/// Geometry, properties, and id are all optional on the wire: malformed
/// records are survivable input (skipped downstream), never a reason to
/// abort a whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub id: Option<FeatureId>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Properties,
}

impl Feature {
    pub fn classification(&self) -> Option<&Classification> {
        self.properties.classification.as_ref()
    }
}
