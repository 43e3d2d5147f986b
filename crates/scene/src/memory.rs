use foundation::arena::Arena;
use foundation::bounds::Extent;
use foundation::handles::{LayerHandle, SourceId};
use foundation::ids::LayerId;

use crate::engine::{
    MapEngine, SourceDesc, SourceEvent, SourceRef, SourceState, SourceStatus, ViewportSize,
};

#[derive(Debug, Clone, PartialEq)]
pub enum LayerNodeKind {
    Leaf { source: SourceId },
    Group { children: Vec<LayerHandle> },
}

/// Engine-side state of one layer object.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerNode {
    pub id: Option<LayerId>,
    pub visible: bool,
    pub opacity: f64,
    pub z_index: i32,
    pub kind: LayerNodeKind,
}

impl LayerNode {
    fn new(kind: LayerNodeKind) -> Self {
        Self {
            id: None,
            visible: true,
            opacity: 1.0,
            z_index: 0,
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceNode {
    pub desc: SourceDesc,
    /// Bumped on every in-place source update.
    pub revision: u32,
    pub status: SourceStatus,
}

/// Deterministic in-memory layer tree.
///
/// Layer objects outlive their attachment to the map: `remove_layer` only
/// detaches, mirroring engines where the caller keeps the layer object.
///
/// Ordering contract:
/// - `attached()` yields layers in insertion order.
/// - `draw_order()` is sorted by z-index, ties broken by insertion order.
#[derive(Debug, Default)]
pub struct MemoryMap {
    layers: Arena<LayerNode>,
    sources: Arena<SourceNode>,
    attached: Vec<LayerHandle>,
    size: Option<ViewportSize>,
    render_count: u64,
    fits: Vec<Extent>,
}

impl MemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(width: f64, height: f64) -> Self {
        Self {
            size: Some(ViewportSize::new(width, height)),
            ..Self::default()
        }
    }

    pub fn set_size(&mut self, size: Option<ViewportSize>) {
        self.size = size;
    }

    pub fn attached(&self) -> &[LayerHandle] {
        &self.attached
    }

    pub fn draw_order(&self) -> Vec<LayerHandle> {
        let mut out = self.attached.clone();
        out.sort_by_key(|h| self.layers.get(h.0).map(|n| n.z_index).unwrap_or(0));
        out
    }

    pub fn layer(&self, layer: LayerHandle) -> Option<&LayerNode> {
        self.layers.get(layer.0)
    }

    pub fn source_node(&self, source: SourceId) -> Option<&SourceNode> {
        self.sources.get(source.0)
    }

    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Extents passed to `fit_view`, oldest first.
    pub fn fits(&self) -> &[Extent] {
        &self.fits
    }

    /// Ids of attached layers, in attachment order.
    pub fn attached_ids(&self) -> Vec<Option<LayerId>> {
        self.attached
            .iter()
            .map(|h| self.layers.get(h.0).and_then(|n| n.id.clone()))
            .collect()
    }

    pub fn set_source_state(&mut self, source: SourceId, state: SourceState) -> Option<SourceEvent> {
        let node = self.sources.get_mut(source.0)?;
        node.status.state = state;
        Some(SourceEvent::StateChanged(node.status.clone()))
    }
}

impl MapEngine for MemoryMap {
    fn create_layer(&mut self, source: SourceDesc) -> LayerHandle {
        let source = SourceId(self.sources.insert(SourceNode {
            desc: source,
            revision: 0,
            status: SourceStatus::default(),
        }));
        LayerHandle(self.layers.insert(LayerNode::new(LayerNodeKind::Leaf { source })))
    }

    fn create_group(&mut self, children: Vec<LayerHandle>) -> LayerHandle {
        LayerHandle(
            self.layers
                .insert(LayerNode::new(LayerNodeKind::Group { children })),
        )
    }

    fn add_layer(&mut self, layer: LayerHandle) {
        if self.layers.contains(layer.0) && !self.attached.contains(&layer) {
            self.attached.push(layer);
        }
    }

    fn remove_layer(&mut self, layer: LayerHandle) -> bool {
        let before = self.attached.len();
        self.attached.retain(|h| *h != layer);
        self.attached.len() != before
    }

    fn set_layer_id(&mut self, layer: LayerHandle, id: &LayerId) {
        if let Some(node) = self.layers.get_mut(layer.0) {
            node.id = Some(id.clone());
        }
    }

    fn set_visible(&mut self, layer: LayerHandle, visible: bool) {
        if let Some(node) = self.layers.get_mut(layer.0) {
            node.visible = visible;
        }
    }

    fn set_opacity(&mut self, layer: LayerHandle, opacity: f64) {
        if let Some(node) = self.layers.get_mut(layer.0) {
            node.opacity = opacity;
        }
    }

    fn set_z_index(&mut self, layer: LayerHandle, z_index: i32) {
        if let Some(node) = self.layers.get_mut(layer.0) {
            node.z_index = z_index;
        }
    }

    fn layer_id(&self, layer: LayerHandle) -> Option<LayerId> {
        self.layers.get(layer.0).and_then(|n| n.id.clone())
    }

    fn source(&self, layer: LayerHandle) -> Option<SourceRef> {
        let LayerNodeKind::Leaf { source } = self.layers.get(layer.0)?.kind else {
            return None;
        };
        let node = self.sources.get(source.0)?;
        Some(SourceRef {
            id: source,
            kind: node.desc.kind,
        })
    }

    fn update_source(&mut self, layer: LayerHandle, source: SourceDesc) -> bool {
        let Some(SourceRef { id, .. }) = self.source(layer) else {
            return false;
        };
        let Some(node) = self.sources.get_mut(id.0) else {
            return false;
        };
        node.desc = source;
        node.revision += 1;
        true
    }

    fn source_status(&self, source: SourceId) -> Option<SourceStatus> {
        self.sources.get(source.0).map(|n| n.status.clone())
    }

    fn load_features(&mut self, source: SourceId, features: &[Extent]) -> Option<SourceEvent> {
        let node = self.sources.get_mut(source.0)?;
        let extent = features.iter().copied().reduce(|acc, e| acc.union(&e));
        node.status = SourceStatus {
            state: SourceState::Ready,
            feature_count: features.len(),
            extent,
        };
        Some(SourceEvent::StateChanged(node.status.clone()))
    }

    fn render(&mut self) {
        self.render_count += 1;
    }

    fn size(&self) -> Option<ViewportSize> {
        self.size
    }

    fn fit_view(&mut self, extent: Extent, _size: Option<ViewportSize>) {
        self.fits.push(extent);
    }
}
