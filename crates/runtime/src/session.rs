use annotations::feature::Feature;
use annotations::store::AnnotationStore;
use annotations::visibility::VisibilityMap;
use compute::cluster::{cluster_features, ClusterGroup, ClusterParams, MarkerScale};
use foundation::bounds::ImageRect;
use layers::draw::SceneView;
use streaming::protocol::{HexBin, ScopedAnnotations};
use streaming::request::{FetchKey, RequestToken, TokenIssuer};
use tracing::{debug, warn};
use viewport::policy::{RenderMode, ZoomPolicy};

use crate::frame::FrameCoalescer;

/// Where aggregated-mode data comes from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AggregationSource {
    /// Precomputed bins from the store, at a fixed resolution.
    ServerBins { resolution: u32 },
    /// Raw scoped features, clustered client-side.
    ClientClusters,
}

/// Tunables for one session. All observed operating points, configurable
/// rather than baked in.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub policy: ZoomPolicy,
    pub cluster: ClusterParams,
    pub marker: MarkerScale,
    pub aggregation: AggregationSource,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            policy: ZoomPolicy::default(),
            cluster: ClusterParams::default(),
            marker: MarkerScale::default(),
            aggregation: AggregationSource::ServerBins { resolution: 2 },
        }
    }
}

/// Interaction phase per loaded data source.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Viewport moving; surface blurred, prior drawing about to be
    /// replaced.
    Busy,
    /// Network suspension point.
    Fetching,
    /// Client-side clustering of a fresh fetch.
    Aggregating,
    Rendering,
}

/// What the host must ask the annotation store for.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchRequest {
    Scoped {
        bounds: ImageRect,
        filename: String,
    },
    HexBins {
        dzi_file: String,
        resolution: u32,
    },
}

/// A planned fetch: the request plus the token its completion must carry.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPlan {
    pub token: RequestToken,
    pub request: FetchRequest,
}

/// Completed fetch payload, matching the planned request kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchPayload {
    Scoped(ScopedAnnotations),
    Bins(Vec<HexBin>),
}

/// How a completion was applied to visible state.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Result applied; `empty` distinguishes "no annotations in view"
    /// from data.
    Applied { empty: bool },
    /// Superseded by a newer request; silently discarded.
    Stale,
    /// Transport or store failure; prior rendered state left intact.
    Failed(String),
}

/// Owned state for one rendering session over one selected image.
///
/// Replaces scattered component-local flags with a single object holding
/// the current mode, bounds, dataset, visibility map, and request token.
/// Single-threaded by construction; every mutation that changes what is
/// on screen schedules a coalesced render.
#[derive(Debug)]
pub struct RenderSession {
    config: SessionConfig,
    source: Option<String>,
    phase: Phase,
    mode: RenderMode,
    bounds: Option<ImageRect>,
    store: AnnotationStore,
    bins: Vec<HexBin>,
    clusters: Vec<ClusterGroup>,
    visibility: VisibilityMap,
    tokens: TokenIssuer,
    in_flight: Option<FetchKey>,
    frames: FrameCoalescer,
    last_outcome: Option<FetchOutcome>,
}

impl RenderSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            source: None,
            phase: Phase::Idle,
            mode: RenderMode::Aggregated,
            bounds: None,
            store: AnnotationStore::new(),
            bins: Vec::new(),
            clusters: Vec::new(),
            visibility: VisibilityMap::new(),
            tokens: TokenIssuer::new(),
            in_flight: None,
            frames: FrameCoalescer::new(),
            last_outcome: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn bounds(&self) -> Option<ImageRect> {
        self.bounds
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn visibility(&self) -> &VisibilityMap {
        &self.visibility
    }

    pub fn last_outcome(&self) -> Option<&FetchOutcome> {
        self.last_outcome.as_ref()
    }

    /// Select (or switch) the displayed image. A switch is a fresh
    /// session, not an update: accumulated annotations, visibility
    /// toggles, and in-flight tokens are all dropped.
    pub fn select_source(&mut self, dzi_file: &str) {
        debug!(dzi_file, "selecting data source");
        self.source = Some(dzi_file.to_string());
        self.phase = Phase::Idle;
        self.bounds = None;
        self.store.clear();
        self.bins.clear();
        self.clusters.clear();
        self.visibility.reset();
        self.tokens.invalidate_all();
        self.in_flight = None;
        self.last_outcome = None;
        self.frames.request();
    }

    /// Viewport started moving (pan/zoom/animation). The host blurs the
    /// surface; nothing is fetched until the viewport settles.
    pub fn on_viewport_moving(&mut self) {
        if self.source.is_none() {
            return;
        }
        self.phase = Phase::Busy;
    }

    /// Viewport settled: pick the mode for this zoom and plan a fetch.
    ///
    /// Returns `None` when not ready (no source selected) or when an
    /// identical request is already in flight — crossing the mode
    /// threshold back and forth over the same viewport must not
    /// double-fetch.
    pub fn on_viewport_settled(&mut self, bounds: ImageRect, zoom: f64) -> Option<FetchPlan> {
        let source = self.source.clone()?;

        self.mode = self.config.policy.select_mode(zoom);
        self.bounds = Some(bounds);

        let key = FetchKey::new(&source, &bounds, zoom);
        if self.in_flight.as_ref() == Some(&key) {
            debug!("identical fetch already in flight; not re-issuing");
            return None;
        }

        let token = self.tokens.issue();
        self.in_flight = Some(key);
        self.phase = Phase::Fetching;

        let request = match (self.mode, self.config.aggregation) {
            (RenderMode::Aggregated, AggregationSource::ServerBins { resolution }) => {
                FetchRequest::HexBins {
                    dzi_file: source,
                    resolution,
                }
            }
            (RenderMode::Aggregated, AggregationSource::ClientClusters)
            | (RenderMode::Individual, _) => FetchRequest::Scoped {
                bounds,
                filename: source,
            },
        };

        Some(FetchPlan { token, request })
    }

    /// Apply a fetch completion.
    ///
    /// Stale completions (token superseded or invalidated) are discarded
    /// without touching visible state. Failures keep the prior rendered
    /// state and surface only an outcome for the host to notify on.
    pub fn complete_fetch(
        &mut self,
        token: RequestToken,
        result: Result<FetchPayload, String>,
    ) -> FetchOutcome {
        if !self.tokens.is_current(token) {
            debug!(?token, "discarding stale fetch result");
            return FetchOutcome::Stale;
        }
        self.in_flight = None;

        let payload = match result {
            Ok(payload) => payload,
            Err(message) => {
                warn!(%message, "annotation fetch failed");
                self.phase = Phase::Idle;
                let outcome = FetchOutcome::Failed(message);
                self.last_outcome = Some(outcome.clone());
                return outcome;
            }
        };

        let empty = match payload {
            FetchPayload::Scoped(scoped) => self.apply_scoped(scoped),
            FetchPayload::Bins(bins) => self.apply_bins(bins),
        };

        self.phase = Phase::Rendering;
        self.frames.request();
        let outcome = FetchOutcome::Applied { empty };
        self.last_outcome = Some(outcome.clone());
        outcome
    }

    /// Toggle one classification. Affects only the renderer filter:
    /// Idle → Rendering → Idle, no re-fetch.
    pub fn toggle_classification(&mut self, source: &str, name: &str) -> bool {
        let visible = self.visibility.toggle(source, name);
        if self.phase == Phase::Idle {
            self.phase = Phase::Rendering;
        }
        self.frames.request();
        visible
    }

    /// Merge a whole annotation file loaded outside the pan/zoom loop
    /// (upload flow). Returns the number of features applied.
    pub fn ingest_file(&mut self, source_file: &str, features: Vec<Feature>) -> usize {
        for feature in &features {
            if let Some(class) = feature.classification() {
                self.visibility.register(source_file, &class.name);
            }
        }
        let applied = self.store.merge(source_file, features);
        self.frames.request();
        applied
    }

    /// Ask for a redraw without changing any data (e.g. container
    /// resize). Coalesces with any other trigger in the same frame.
    pub fn request_render(&mut self) {
        self.frames.request();
    }

    /// Frame boundary: returns true at most once per scheduled render.
    /// The host then draws `scene_view()` and calls `finish_render`.
    pub fn begin_frame(&mut self) -> bool {
        if !self.frames.take() {
            return false;
        }
        self.phase = Phase::Rendering;
        true
    }

    pub fn finish_render(&mut self) {
        if self.phase == Phase::Rendering {
            self.phase = Phase::Idle;
        }
    }

    /// The representation to draw this frame, per the current mode.
    pub fn scene_view(&self) -> SceneView<'_> {
        match self.mode {
            RenderMode::Aggregated => {
                if !self.bins.is_empty() {
                    SceneView::Bins {
                        source: self.source.as_deref().unwrap_or(""),
                        bins: &self.bins,
                    }
                } else if !self.clusters.is_empty() {
                    SceneView::Clusters {
                        groups: &self.clusters,
                        scale: &self.config.marker,
                    }
                } else {
                    SceneView::Empty
                }
            }
            RenderMode::Individual => SceneView::Individual { store: &self.store },
        }
    }

    fn apply_scoped(&mut self, scoped: ScopedAnnotations) -> bool {
        let mut applied = 0;
        // Cluster before merging: bins/clusters live for exactly one fetch
        // cycle and are rebuilt from the features of this viewport query.
        self.clusters.clear();
        self.bins.clear();

        if self.mode == RenderMode::Aggregated {
            self.phase = Phase::Aggregating;
            for (source_file, features) in &scoped {
                let clusters = cluster_features(features.iter(), &self.config.cluster);
                if !clusters.is_empty() {
                    self.clusters.push(ClusterGroup {
                        source: source_file.clone(),
                        clusters,
                    });
                }
            }
        }

        for (source_file, features) in scoped {
            for feature in &features {
                if let Some(class) = feature.classification() {
                    self.visibility.register(&source_file, &class.name);
                }
            }
            applied += self.store.merge(&source_file, features);
        }
        applied == 0 && self.clusters.is_empty()
    }

    fn apply_bins(&mut self, bins: Vec<HexBin>) -> bool {
        let source = self.source.clone().unwrap_or_default();
        for bin in &bins {
            for name in bin.classifications.keys() {
                self.visibility.register(&source, name);
            }
        }
        self.clusters.clear();
        self.bins = bins;
        self.bins.is_empty()
    }
}

impl Default for RenderSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
