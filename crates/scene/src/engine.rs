//! Contract between the layer core and a rendering engine's layer tree.
//!
//! The core never owns engine objects; it holds [`LayerHandle`]s and drives
//! the engine through [`MapEngine`]. Paint hooks receive a [`PaintContext`].

use std::collections::BTreeMap;

use foundation::bounds::Extent;
use foundation::handles::{LayerHandle, SourceId};
use foundation::ids::LayerId;

/// Capability of a leaf source, detected from the engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKind {
    /// Issues many overlapping per-tile requests.
    Tiled,
    /// Issues one request per full-image refresh.
    Image,
    /// Holds features in memory; issues no load events.
    Vector,
}

impl SourceKind {
    pub fn is_tiled(self) -> bool {
        matches!(self, SourceKind::Tiled)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SourceRef {
    pub id: SourceId,
    pub kind: SourceKind,
}

/// Everything the engine needs to build or rebuild a leaf source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDesc {
    pub kind: SourceKind,
    pub url: Option<String>,
    pub projection: String,
    pub params: BTreeMap<String, String>,
}

impl SourceDesc {
    pub fn new(kind: SourceKind, projection: impl Into<String>) -> Self {
        Self {
            kind,
            url: None,
            projection: projection.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SourceState {
    #[default]
    Undefined,
    Loading,
    Ready,
    Error,
}

/// Snapshot carried by a source "state changed" notification.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceStatus {
    pub state: SourceState,
    pub feature_count: usize,
    pub extent: Option<Extent>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoadPhase {
    Start,
    End,
    Error,
}

/// Lifecycle notification raised by a leaf source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    Tile(LoadPhase),
    Image(LoadPhase),
    StateChanged(SourceStatus),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClipRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Map and view operations used by the layer core.
///
/// Calls with a handle the engine no longer knows are no-ops.
pub trait MapEngine {
    fn create_layer(&mut self, source: SourceDesc) -> LayerHandle;
    fn create_group(&mut self, children: Vec<LayerHandle>) -> LayerHandle;

    fn add_layer(&mut self, layer: LayerHandle);
    /// Detaches `layer` from the map. Returns `true` if it was attached.
    fn remove_layer(&mut self, layer: LayerHandle) -> bool;

    fn set_layer_id(&mut self, layer: LayerHandle, id: &LayerId);
    fn set_visible(&mut self, layer: LayerHandle, visible: bool);
    /// `opacity` is in `[0, 1]`.
    fn set_opacity(&mut self, layer: LayerHandle, opacity: f64);
    fn set_z_index(&mut self, layer: LayerHandle, z_index: i32);

    fn layer_id(&self, layer: LayerHandle) -> Option<LayerId>;
    fn source(&self, layer: LayerHandle) -> Option<SourceRef>;
    /// Replaces the source parameters of a leaf layer in place.
    fn update_source(&mut self, layer: LayerHandle, source: SourceDesc) -> bool;
    fn source_status(&self, source: SourceId) -> Option<SourceStatus>;
    /// Replaces the data held by a vector source with `features`, given by
    /// their extents, and returns the state-changed notification the source
    /// raises for the host to deliver.
    fn load_features(&mut self, source: SourceId, features: &[Extent]) -> Option<SourceEvent>;

    /// Schedules a full repaint.
    fn render(&mut self);
    fn size(&self) -> Option<ViewportSize>;
    fn fit_view(&mut self, extent: Extent, size: Option<ViewportSize>);
}

/// 2D graphics state available to per-layer paint hooks.
pub trait PaintContext {
    fn canvas_size(&self) -> ViewportSize;
    fn save(&mut self);
    fn restore(&mut self);
    /// Intersects the current clip region with `rect`.
    fn clip_rect(&mut self, rect: ClipRect);
}
