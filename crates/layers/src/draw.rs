use annotations::feature::{Feature, Geometry};
use annotations::store::AnnotationStore;
use annotations::visibility::VisibilityMap;
use compute::blend::blend_weighted;
use compute::cluster::{ClusterGroup, MarkerScale};
use streaming::protocol::HexBin;
use tracing::warn;
use viewport::transform::FrameTransform;

use crate::surface::DrawSurface;

/// Fixed marker radius for individual Point/MultiPoint geometry, in
/// screen pixels.
pub const POINT_RADIUS_PX: f64 = 3.0;

/// What the renderer draws this pass.
///
/// Borrowed views over session-owned data; nothing here outlives the
/// frame.
#[derive(Debug)]
pub enum SceneView<'a> {
    /// Nothing fetched yet (or nothing in view). A valid, drawable state.
    Empty,
    /// Server-aggregated hex bins for one source.
    Bins {
        source: &'a str,
        bins: &'a [HexBin],
    },
    /// Client-side density clusters, grouped per source file.
    Clusters {
        groups: &'a [ClusterGroup],
        scale: &'a MarkerScale,
    },
    /// Exact per-feature geometry from the accumulated store.
    Individual { store: &'a AnnotationStore },
}

/// Draw one full frame.
///
/// Clears the entire surface first (full redraw is the correctness
/// baseline), filters by the visibility map, and pushes every coordinate
/// through the per-frame transform immediately before drawing.
pub fn render_pass(
    surface: &mut dyn DrawSurface,
    view: &SceneView<'_>,
    visibility: &VisibilityMap,
    transform: &FrameTransform,
) {
    surface.clear();

    match view {
        SceneView::Empty => {}
        SceneView::Bins { source, bins } => {
            for bin in *bins {
                draw_bin(surface, source, bin, visibility, transform);
            }
        }
        SceneView::Clusters { groups, scale } => {
            for group in *groups {
                for cluster in &group.clusters {
                    if !visibility.is_visible(&group.source, &cluster.classification) {
                        continue;
                    }
                    if cluster.is_empty() {
                        continue;
                    }
                    let center = transform.image_to_screen(cluster.centroid());
                    surface.fill_circle(center, scale.radius(cluster.len()), cluster.color);
                }
            }
        }
        SceneView::Individual { store } => {
            for (source, feature) in store.iter_all() {
                draw_feature(surface, source, feature, visibility, transform);
            }
        }
    }
}

fn draw_bin(
    surface: &mut dyn DrawSurface,
    source: &str,
    bin: &HexBin,
    visibility: &VisibilityMap,
    transform: &FrameTransform,
) {
    if bin.image_coordinates.is_empty() {
        warn!(hex_id = ?bin.hex_id, "skipping hex bin without boundary coordinates");
        return;
    }

    // Hidden classifications drop out of the histogram before blending; a
    // bin with nothing visible left is skipped entirely.
    let visible = bin
        .classifications
        .iter()
        .filter(|(name, _)| visibility.is_visible(source, name))
        .map(|(_, bucket)| (bucket.count, bucket.color))
        .collect::<Vec<_>>();
    if visible.is_empty() {
        return;
    }

    let color = blend_weighted(visible);
    let path: Vec<[f64; 2]> = bin
        .image_coordinates
        .iter()
        .map(|p| transform.image_to_screen(*p))
        .collect();
    surface.fill_ring(&path, color);
}

fn draw_feature(
    surface: &mut dyn DrawSurface,
    source: &str,
    feature: &Feature,
    visibility: &VisibilityMap,
    transform: &FrameTransform,
) {
    let Some(class) = feature.classification() else {
        warn!(id = ?feature.id, "skipping feature without classification");
        return;
    };
    let Some(color) = class.color else {
        warn!(id = ?feature.id, name = %class.name, "skipping feature without color");
        return;
    };
    if !visibility.is_visible(source, &class.name) {
        return;
    }
    let Some(geometry) = feature.geometry.as_ref() else {
        warn!(id = ?feature.id, "skipping feature without geometry");
        return;
    };
    if geometry.is_empty() {
        warn!(id = ?feature.id, "skipping feature with empty coordinates");
        return;
    }

    match geometry {
        Geometry::Point(p) => {
            surface.fill_circle(transform.image_to_screen(*p), POINT_RADIUS_PX, color);
        }
        Geometry::MultiPoint(ps) => {
            for p in ps {
                surface.fill_circle(transform.image_to_screen(*p), POINT_RADIUS_PX, color);
            }
        }
        Geometry::Polygon(rings) => {
            draw_rings(surface, rings, color, transform);
        }
        Geometry::MultiPolygon(polys) => {
            for rings in polys {
                draw_rings(surface, rings, color, transform);
            }
        }
    }
}

// Each ring is an independently closed and filled path.
fn draw_rings(
    surface: &mut dyn DrawSurface,
    rings: &[Vec<[f64; 2]>],
    color: [u8; 3],
    transform: &FrameTransform,
) {
    for ring in rings {
        if ring.is_empty() {
            continue;
        }
        let path: Vec<[f64; 2]> = ring.iter().map(|p| transform.image_to_screen(*p)).collect();
        surface.fill_ring(&path, color);
    }
}

#[cfg(test)]
mod tests {
    use super::{render_pass, SceneView, POINT_RADIUS_PX};
    use crate::surface::{CommandSurface, DrawCommand, DrawSurface};
    use annotations::feature::{Classification, Feature, FeatureId, Geometry, Properties};
    use annotations::store::AnnotationStore;
    use annotations::visibility::VisibilityMap;
    use compute::cluster::{Cluster, ClusterGroup, MarkerScale};
    use std::collections::BTreeMap;
    use streaming::protocol::{ClassificationBucket, HexBin};
    use viewport::transform::ViewerState;

    const SOURCE: &str = "a.geojson";

    fn transform() -> viewport::transform::FrameTransform {
        ViewerState {
            open: true,
            image_width: 1000.0,
            image_height: 1000.0,
            container_width: 1000.0,
            container_height: 1000.0,
            zoom: 1.0,
            center_x: 500.0,
            center_y: 500.0,
        }
        .frame_transform()
        .unwrap()
    }

    fn feature(id: &str, name: &str, geometry: Option<Geometry>) -> Feature {
        Feature {
            id: Some(FeatureId::new(id)),
            geometry,
            properties: Properties {
                classification: Some(Classification {
                    name: name.to_string(),
                    color: Some([255, 0, 0]),
                }),
            },
        }
    }

    fn bin(classes: &[(&str, u64, [u8; 3])]) -> HexBin {
        let mut classifications = BTreeMap::new();
        for (name, count, color) in classes {
            classifications.insert(
                name.to_string(),
                ClassificationBucket {
                    count: *count,
                    color: *color,
                },
            );
        }
        HexBin {
            hex_id: None,
            annotation_count: classes.iter().map(|(_, c, _)| c).sum(),
            image_coordinates: vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]],
            classifications,
        }
    }

    #[test]
    fn every_pass_clears_first() {
        let mut surface = CommandSurface::new();
        surface.fill_circle([1.0, 1.0], 1.0, [0, 0, 0]);
        render_pass(
            &mut surface,
            &SceneView::Empty,
            &VisibilityMap::new(),
            &transform(),
        );
        assert_eq!(surface.commands, vec![DrawCommand::Clear]);
    }

    #[test]
    fn individual_points_render_as_fixed_radius_circles() {
        let mut store = AnnotationStore::new();
        store.merge(
            SOURCE,
            vec![feature("1", "Tumor", Some(Geometry::Point([100.0, 200.0])))],
        );

        let mut surface = CommandSurface::new();
        render_pass(
            &mut surface,
            &SceneView::Individual { store: &store },
            &VisibilityMap::new(),
            &transform(),
        );

        let (center, radius, color) = surface.circles().next().unwrap();
        assert_eq!(*center, [100.0, 200.0]);
        assert_eq!(radius, POINT_RADIUS_PX);
        assert_eq!(*color, [255, 0, 0]);
    }

    #[test]
    fn hidden_classifications_are_not_drawn() {
        let mut store = AnnotationStore::new();
        store.merge(
            SOURCE,
            vec![
                feature("1", "Tumor", Some(Geometry::Point([1.0, 1.0]))),
                feature("2", "Stroma", Some(Geometry::Point([2.0, 2.0]))),
            ],
        );
        let mut visibility = VisibilityMap::new();
        visibility.set_visible(SOURCE, "Tumor", false);

        let mut surface = CommandSurface::new();
        render_pass(
            &mut surface,
            &SceneView::Individual { store: &store },
            &visibility,
            &transform(),
        );

        assert_eq!(surface.circles().count(), 1);
    }

    #[test]
    fn malformed_features_are_skipped_not_fatal() {
        let mut store = AnnotationStore::new();
        store.merge(
            SOURCE,
            vec![
                feature("1", "Tumor", None),
                feature("2", "Tumor", Some(Geometry::MultiPoint(vec![]))),
                {
                    let mut f = feature("3", "Tumor", Some(Geometry::Point([1.0, 1.0])));
                    f.properties.classification.as_mut().unwrap().color = None;
                    f
                },
                feature("4", "Tumor", Some(Geometry::Point([5.0, 5.0]))),
            ],
        );

        let mut surface = CommandSurface::new();
        render_pass(
            &mut surface,
            &SceneView::Individual { store: &store },
            &VisibilityMap::new(),
            &transform(),
        );

        // Only the one well-formed feature survives.
        assert_eq!(surface.circles().count(), 1);
    }

    #[test]
    fn polygon_rings_fill_independently() {
        let mut store = AnnotationStore::new();
        store.merge(
            SOURCE,
            vec![feature(
                "1",
                "Tumor",
                Some(Geometry::Polygon(vec![
                    vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]],
                    vec![[2.0, 2.0], [4.0, 2.0], [4.0, 4.0]],
                ])),
            )],
        );

        let mut surface = CommandSurface::new();
        render_pass(
            &mut surface,
            &SceneView::Individual { store: &store },
            &VisibilityMap::new(),
            &transform(),
        );

        assert_eq!(surface.rings().count(), 2);
    }

    #[test]
    fn bins_blend_their_visible_histogram() {
        let bins = vec![bin(&[("Tumor", 3, [255, 0, 0]), ("Stroma", 1, [0, 0, 0])])];

        let mut surface = CommandSurface::new();
        render_pass(
            &mut surface,
            &SceneView::Bins {
                source: SOURCE,
                bins: &bins,
            },
            &VisibilityMap::new(),
            &transform(),
        );

        let (_, color) = surface.rings().next().unwrap();
        assert_eq!(*color, [191, 0, 0]);
    }

    #[test]
    fn fully_hidden_bin_is_skipped() {
        let bins = vec![bin(&[("Tumor", 3, [255, 0, 0])])];
        let mut visibility = VisibilityMap::new();
        visibility.set_visible(SOURCE, "Tumor", false);

        let mut surface = CommandSurface::new();
        render_pass(
            &mut surface,
            &SceneView::Bins {
                source: SOURCE,
                bins: &bins,
            },
            &visibility,
            &transform(),
        );

        assert_eq!(surface.rings().count(), 0);
    }

    #[test]
    fn partially_hidden_bin_reblends_the_rest() {
        let bins = vec![bin(&[("Tumor", 3, [255, 0, 0]), ("Stroma", 1, [0, 0, 0])])];
        let mut visibility = VisibilityMap::new();
        visibility.set_visible(SOURCE, "Stroma", false);

        let mut surface = CommandSurface::new();
        render_pass(
            &mut surface,
            &SceneView::Bins {
                source: SOURCE,
                bins: &bins,
            },
            &visibility,
            &transform(),
        );

        let (_, color) = surface.rings().next().unwrap();
        assert_eq!(*color, [255, 0, 0]);
    }

    #[test]
    fn clusters_render_with_clamped_radius_at_centroid() {
        let groups = vec![ClusterGroup {
            source: SOURCE.to_string(),
            clusters: vec![Cluster {
                classification: "Tumor".to_string(),
                color: [255, 0, 0],
                points: vec![[0.0, 0.0]; 200],
            }],
        }];
        let scale = MarkerScale::default();

        let mut surface = CommandSurface::new();
        render_pass(
            &mut surface,
            &SceneView::Clusters {
                groups: &groups,
                scale: &scale,
            },
            &VisibilityMap::new(),
            &transform(),
        );

        let (center, radius, _) = surface.circles().next().unwrap();
        assert_eq!(*center, [0.0, 0.0]);
        assert_eq!(radius, 30.0);
    }

    #[test]
    fn coordinates_pass_through_the_frame_transform() {
        let mut state = ViewerState {
            open: true,
            image_width: 1000.0,
            image_height: 1000.0,
            container_width: 500.0,
            container_height: 500.0,
            zoom: 2.0,
            center_x: 500.0,
            center_y: 500.0,
        };
        let t = state.frame_transform().unwrap();

        let mut store = AnnotationStore::new();
        store.merge(
            SOURCE,
            vec![feature("1", "Tumor", Some(Geometry::Point([500.0, 500.0])))],
        );

        let mut surface = CommandSurface::new();
        render_pass(
            &mut surface,
            &SceneView::Individual { store: &store },
            &VisibilityMap::new(),
            &t,
        );
        let (center, _, _) = surface.circles().next().unwrap();
        // Image center lands at container center for the current frame.
        assert_eq!(*center, [250.0, 250.0]);

        // A pan invalidates the old snapshot; the next frame's transform
        // must place the same image point elsewhere.
        state.center_x = 600.0;
        let t2 = state.frame_transform().unwrap();
        let mut surface2 = CommandSurface::new();
        render_pass(
            &mut surface2,
            &SceneView::Individual { store: &store },
            &VisibilityMap::new(),
            &t2,
        );
        let (center2, _, _) = surface2.circles().next().unwrap();
        assert!(center2[0] < center[0]);
    }
}
