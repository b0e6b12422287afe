use std::collections::BTreeMap;

use annotations::feature::Feature;
use tracing::debug;

/// Density clustering parameters. Hand-tuned operating points; treat as
/// configuration, not behavior.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClusterParams {
    /// Neighborhood radius in image pixels.
    pub eps: f64,
    /// Minimum neighborhood size (including the point itself) for a core
    /// point.
    pub min_pts: usize,
    /// Keep every Nth representative point before clustering, to bound
    /// cost at high annotation densities.
    pub sample_stride: usize,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            eps: 50.0,
            min_pts: 3,
            sample_stride: 10,
        }
    }
}

/// Cluster marker sizing: `radius = clamp(point_count * k, r_min, r_max)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerScale {
    pub k: f64,
    pub r_min: f64,
    pub r_max: f64,
}

impl Default for MarkerScale {
    fn default() -> Self {
        Self {
            k: 0.2,
            r_min: 3.0,
            r_max: 30.0,
        }
    }
}

impl MarkerScale {
    pub fn radius(&self, point_count: usize) -> f64 {
        (point_count as f64 * self.k).clamp(self.r_min, self.r_max)
    }
}

/// A density cluster of one classification type.
///
/// Clusters never span types; the weighted blend over a single-type
/// histogram reduces to the type color, carried here directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub classification: String,
    pub color: [u8; 3],
    pub points: Vec<[f64; 2]>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn centroid(&self) -> [f64; 2] {
        let n = self.points.len().max(1) as f64;
        let sum = self
            .points
            .iter()
            .fold([0.0, 0.0], |acc, p| [acc[0] + p[0], acc[1] + p[1]]);
        [sum[0] / n, sum[1] / n]
    }
}

/// Clusters for one annotation source file.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterGroup {
    pub source: String,
    pub clusters: Vec<Cluster>,
}

/// Build density clusters from raw features, per classification type
/// independently.
///
/// Representative points are the raw coordinates for Point/MultiPoint and
/// every ring vertex for Polygon/MultiPolygon, subsampled at
/// `sample_stride`. Points not reachable from any core point (noise) are
/// dropped: the aggregated view trades precision for interactivity.
///
/// This runs once per fetch, when the underlying feature set changes —
/// never per pan/zoom frame.
pub fn cluster_features<'a, I>(features: I, params: &ClusterParams) -> Vec<Cluster>
where
    I: IntoIterator<Item = &'a Feature>,
{
    // Group representative points by classification name; first seen color
    // wins for the type.
    let mut by_type: BTreeMap<String, ([u8; 3], Vec<[f64; 2]>)> = BTreeMap::new();

    for feature in features {
        let Some(class) = feature.classification() else {
            debug!("skipping unclassified feature in aggregation");
            continue;
        };
        let Some(color) = class.color else {
            debug!(name = %class.name, "skipping feature without classification color");
            continue;
        };
        let Some(geometry) = feature.geometry.as_ref() else {
            continue;
        };
        let vertices = geometry.vertices();
        if vertices.is_empty() {
            continue;
        }
        let entry = by_type
            .entry(class.name.clone())
            .or_insert_with(|| (color, Vec::new()));
        entry.1.extend(vertices);
    }

    let stride = params.sample_stride.max(1);
    let mut out = Vec::new();

    for (name, (color, points)) in by_type {
        let sampled: Vec<[f64; 2]> = points.into_iter().step_by(stride).collect();
        for member_indices in dbscan(&sampled, params.eps, params.min_pts) {
            out.push(Cluster {
                classification: name.clone(),
                color,
                points: member_indices.iter().map(|&i| sampled[i]).collect(),
            });
        }
    }

    out
}

/// Plain DBSCAN over 2D points with a brute-force neighborhood scan.
///
/// Returns clusters as index lists in discovery order; noise points are
/// omitted. Input sizes are bounded by the sampling stride upstream.
fn dbscan(points: &[[f64; 2]], eps: f64, min_pts: usize) -> Vec<Vec<usize>> {
    const UNVISITED: usize = usize::MAX;
    const NOISE: usize = usize::MAX - 1;

    let eps2 = eps * eps;
    let neighbors = |i: usize| -> Vec<usize> {
        let p = points[i];
        points
            .iter()
            .enumerate()
            .filter(|(_, q)| {
                let dx = q[0] - p[0];
                let dy = q[1] - p[1];
                dx * dx + dy * dy <= eps2
            })
            .map(|(j, _)| j)
            .collect()
    };

    let mut label = vec![UNVISITED; points.len()];
    let mut clusters: Vec<Vec<usize>> = Vec::new();

    for i in 0..points.len() {
        if label[i] != UNVISITED {
            continue;
        }
        let seed = neighbors(i);
        if seed.len() < min_pts {
            label[i] = NOISE;
            continue;
        }

        let cluster_id = clusters.len();
        clusters.push(Vec::new());
        label[i] = cluster_id;
        clusters[cluster_id].push(i);

        let mut frontier = seed;
        let mut cursor = 0;
        while cursor < frontier.len() {
            let j = frontier[cursor];
            cursor += 1;

            if label[j] == NOISE {
                // Border point reachable from a core point.
                label[j] = cluster_id;
                clusters[cluster_id].push(j);
                continue;
            }
            if label[j] != UNVISITED {
                continue;
            }

            label[j] = cluster_id;
            clusters[cluster_id].push(j);

            let near = neighbors(j);
            if near.len() >= min_pts {
                frontier.extend(near);
            }
        }
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::{cluster_features, Cluster, ClusterParams, MarkerScale};
    use annotations::feature::{Classification, Feature, FeatureId, Geometry, Properties};

    fn point_feature(id: &str, name: &str, p: [f64; 2]) -> Feature {
        Feature {
            id: Some(FeatureId::new(id)),
            geometry: Some(Geometry::Point(p)),
            properties: Properties {
                classification: Some(Classification {
                    name: name.to_string(),
                    color: Some([255, 0, 0]),
                }),
            },
        }
    }

    fn params(eps: f64, min_pts: usize, stride: usize) -> ClusterParams {
        ClusterParams {
            eps,
            min_pts,
            sample_stride: stride,
        }
    }

    #[test]
    fn marker_radius_is_clamped_at_both_ends() {
        let scale = MarkerScale::default();
        assert_eq!(scale.radius(5), 3.0);
        assert_eq!(scale.radius(200), 30.0);
        assert_eq!(scale.radius(100), 20.0);
    }

    #[test]
    fn dense_neighborhood_forms_one_cluster() {
        let features: Vec<Feature> = (0..4)
            .map(|i| point_feature(&i.to_string(), "Tumor", [i as f64, 0.0]))
            .collect();
        let clusters = cluster_features(&features, &params(5.0, 3, 1));
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 4);
    }

    #[test]
    fn separated_blobs_form_separate_clusters() {
        let mut features = Vec::new();
        for i in 0..3 {
            features.push(point_feature(&format!("a{i}"), "Tumor", [i as f64, 0.0]));
            features.push(point_feature(
                &format!("b{i}"),
                "Tumor",
                [1000.0 + i as f64, 0.0],
            ));
        }
        let clusters = cluster_features(&features, &params(5.0, 3, 1));
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn isolated_points_are_noise() {
        let features = vec![point_feature("1", "Tumor", [0.0, 0.0])];
        let clusters = cluster_features(&features, &params(5.0, 3, 1));
        assert!(clusters.is_empty());
    }

    #[test]
    fn clusters_never_span_classification_types() {
        let mut features = Vec::new();
        for i in 0..3 {
            features.push(point_feature(&format!("a{i}"), "Tumor", [i as f64, 0.0]));
            features.push(point_feature(&format!("b{i}"), "Stroma", [i as f64, 0.0]));
        }
        let clusters = cluster_features(&features, &params(5.0, 3, 1));
        assert_eq!(clusters.len(), 2);
        let names: Vec<&str> = clusters.iter().map(|c| c.classification.as_str()).collect();
        assert!(names.contains(&"Tumor") && names.contains(&"Stroma"));
    }

    #[test]
    fn stride_subsamples_representative_points() {
        let features: Vec<Feature> = (0..20)
            .map(|i| point_feature(&i.to_string(), "Tumor", [0.0, 0.0]))
            .collect();
        let clusters = cluster_features(&features, &params(5.0, 1, 10));
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 2);
    }

    #[test]
    fn polygon_ring_vertices_feed_the_clustering() {
        let feature = Feature {
            id: Some(FeatureId::new("p")),
            geometry: Some(Geometry::Polygon(vec![vec![
                [0.0, 0.0],
                [1.0, 0.0],
                [1.0, 1.0],
            ]])),
            properties: Properties {
                classification: Some(Classification {
                    name: "Tumor".to_string(),
                    color: Some([255, 0, 0]),
                }),
            },
        };
        let clusters = cluster_features([&feature], &params(5.0, 3, 1));
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 3);
    }

    #[test]
    fn features_without_color_are_excluded() {
        let mut bad = point_feature("1", "Tumor", [0.0, 0.0]);
        bad.properties.classification.as_mut().unwrap().color = None;
        let clusters = cluster_features([&bad], &params(5.0, 1, 1));
        assert!(clusters.is_empty());
    }

    #[test]
    fn centroid_is_member_mean() {
        let c = Cluster {
            classification: "Tumor".to_string(),
            color: [255, 0, 0],
            points: vec![[0.0, 0.0], [4.0, 2.0]],
        };
        assert_eq!(c.centroid(), [2.0, 1.0]);
    }
}
