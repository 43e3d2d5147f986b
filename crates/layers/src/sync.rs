use std::rc::Rc;

use foundation::handles::{LayerHandle, SourceId};
use foundation::ids::LayerId;
use runtime::event_bus::LoadingSink;
use scene::engine::{MapEngine, PaintContext, SourceEvent, SourceKind};
use tracing::{debug, trace, warn};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::extent_fit::ExtentFit;
use crate::layer::Overlay;
use crate::loading::LoadStateTracker;
use crate::normalize::{EffectiveOptions, normalize};
use crate::options::LayerOptions;
use crate::registry::LayerRegistry;
use crate::swipe::SwipeClip;

#[derive(Debug, Clone, PartialEq, Eq)]
struct MountedLayer {
    handle: LayerHandle,
    id: LayerId,
    layer_type: String,
}

/// Binds one declarative [`LayerOptions`] value to at most one engine layer.
///
/// Lifecycle:
/// - `mount` creates the layer (or leaves it inert for unknown types).
/// - `update` re-applies visibility/opacity/z-index every cycle and hands
///   structural changes to the layer type's update hook.
/// - `unmount` detaches the layer; events arriving afterwards are ignored.
///
/// Everything runs on the host's event loop; nothing here is shared across
/// threads. The tile counter belongs to this instance alone.
#[derive(Debug)]
pub struct LayerSynchronizer {
    registry: Rc<LayerRegistry>,
    config: SyncConfig,
    mounted: Option<MountedLayer>,
    has_mounted: bool,
    previous: Option<LayerOptions>,
    swipe: SwipeClip,
    tracker: LoadStateTracker,
    extent_fit: Option<ExtentFit>,
}

impl LayerSynchronizer {
    pub fn new(registry: Rc<LayerRegistry>, config: SyncConfig) -> Self {
        Self {
            registry,
            config,
            mounted: None,
            has_mounted: false,
            previous: None,
            swipe: SwipeClip::default(),
            tracker: LoadStateTracker::new(),
            extent_fit: None,
        }
    }

    pub fn handle(&self) -> Option<LayerHandle> {
        self.mounted.as_ref().map(|m| m.handle)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// `true` once `mount` has been called, even if the layer stayed inert.
    pub fn has_mounted(&self) -> bool {
        self.has_mounted
    }

    pub fn swipe(&self) -> Option<f64> {
        self.swipe.fraction()
    }

    pub fn tiles_in_flight(&self) -> u32 {
        self.tracker.tiles_in_flight()
    }

    /// Leaf sources currently tracked, with their logical layer ids.
    pub fn tracked_sources(&self) -> Vec<(LayerId, SourceId, SourceKind)> {
        self.tracker
            .attachments()
            .map(|(source, id, kind)| (id.clone(), source, kind))
            .collect()
    }

    pub fn is_waiting_for_extent(&self) -> bool {
        self.extent_fit.is_some_and(|f| f.is_waiting())
    }

    /// Creates the engine layer for `options` and adds it to `map`.
    ///
    /// Returns `None` when the layer stays inert (unknown type, or the type
    /// produced nothing). An instance mounts once: after `unmount` it stays
    /// inert, since its tile counter never resets.
    pub fn mount(
        &mut self,
        options: &LayerOptions,
        map: &mut dyn MapEngine,
    ) -> Option<LayerHandle> {
        if let Some(mounted) = &self.mounted {
            warn!(
                "{}",
                SyncError::AlreadyMounted {
                    layer_id: mounted.id.clone()
                }
            );
            return Some(mounted.handle);
        }
        if self.has_mounted {
            warn!(
                "{}",
                SyncError::Remount {
                    layer_id: LayerId::new(options.id.clone())
                }
            );
            return None;
        }
        self.has_mounted = true;
        self.previous = Some(options.clone());

        let effective = normalize(options, &self.config.default_projection);
        let id = LayerId::new(effective.id.clone());

        let (handle, leaves) = if options.is_group() {
            let (handle, leaves) = self.create_group(&id, &effective, map);
            (Some(handle), leaves)
        } else {
            let handle = self.create_leaf(&id, &effective, map);
            (handle, handle.map(|h| vec![(id.clone(), h)]).unwrap_or_default())
        };
        let handle = handle?;

        map.set_layer_id(handle, &id);
        apply_universal(handle, &effective, map);
        map.add_layer(handle);

        for (leaf_id, leaf) in leaves {
            if let Some(source) = map.source(leaf) {
                self.tracker.attach(leaf_id, source);
            }
        }
        if effective.zoom_to_extent {
            self.extent_fit = map.source(handle).map(|s| {
                let mut fit = ExtentFit::new(s.id);
                // Inline data is loaded before anyone listens for it.
                if let Some(status) = map.source_status(s.id) {
                    fit.on_state_changed(s.id, &status, map);
                }
                fit
            });
        }

        debug!(layer_id = %id, %handle, layer_type = %effective.layer_type, "mounted layer");
        self.mounted = Some(MountedLayer {
            handle,
            id,
            layer_type: effective.layer_type,
        });
        Some(handle)
    }

    fn create_leaf(
        &self,
        id: &LayerId,
        effective: &EffectiveOptions,
        map: &mut dyn MapEngine,
    ) -> Option<LayerHandle> {
        let Some(layer_type) = self.registry.get(&effective.layer_type) else {
            warn!(
                "{}",
                SyncError::UnknownLayerType {
                    layer_id: id.clone(),
                    layer_type: effective.layer_type.clone(),
                }
            );
            return None;
        };
        let handle = layer_type.create(effective, map);
        if handle.is_none() {
            warn!(
                "{}",
                SyncError::CreateFailed {
                    layer_id: id.clone(),
                    layer_type: effective.layer_type.clone(),
                }
            );
        }
        handle
    }

    /// Builds a group and its registered children, in item order.
    ///
    /// Children are normalized against the configured default projection.
    fn create_group(
        &self,
        group_id: &LayerId,
        effective: &EffectiveOptions,
        map: &mut dyn MapEngine,
    ) -> (LayerHandle, Vec<(LayerId, LayerHandle)>) {
        let mut leaves = Vec::with_capacity(effective.items.len());
        for item in &effective.items {
            let Some(layer_type) = self.registry.get(&item.layer_type) else {
                warn!(
                    "{}",
                    SyncError::UnknownGroupChildType {
                        group_id: group_id.clone(),
                        child: item.child_key().to_string(),
                        layer_type: item.layer_type.clone(),
                    }
                );
                continue;
            };
            let child_id = group_id.child(item.child_key());
            let child_options = normalize(item, &self.config.default_projection);
            let Some(child) = layer_type.create(&child_options, map) else {
                warn!(
                    "{}",
                    SyncError::CreateFailed {
                        layer_id: child_id,
                        layer_type: item.layer_type.clone(),
                    }
                );
                continue;
            };
            map.set_layer_id(child, &child_id);
            leaves.push((child_id, child));
        }

        let children = leaves.iter().map(|(_, h)| *h).collect();
        (map.create_group(children), leaves)
    }

    /// Reconciles the mounted layer from `old` to `new`.
    pub fn update(&mut self, new: &LayerOptions, old: &LayerOptions, map: &mut dyn MapEngine) {
        let Some(mounted) = &self.mounted else {
            trace!(layer_id = %new.id, "update on inert layer");
            return;
        };
        let handle = mounted.handle;
        let new_effective = normalize(new, &self.config.default_projection);
        let old_effective = normalize(old, &self.config.default_projection);

        apply_universal(handle, &new_effective, map);
        self.previous = Some(new.clone());

        if new_effective.same_structure(&old_effective) {
            return;
        }
        let Some(layer_type) = self.registry.get(&mounted.layer_type) else {
            debug!(layer_id = %mounted.id, "no layer type to update");
            return;
        };
        if layer_type.update(handle, &new_effective, &old_effective, map) {
            debug!(layer_id = %mounted.id, "applied structural update");
        } else {
            debug!(layer_id = %mounted.id, layer_type = %mounted.layer_type, "layer type has no update hook");
        }
    }

    /// Mounts on the first call, then updates against the options seen on
    /// the previous call.
    pub fn reconcile(&mut self, options: &LayerOptions, map: &mut dyn MapEngine) {
        if !self.has_mounted {
            self.mount(options, map);
            return;
        }
        match self.previous.take() {
            Some(previous) if self.mounted.is_some() => self.update(options, &previous, map),
            previous => self.previous = previous,
        }
    }

    /// Stores the swipe fraction and repaints the map once if it changed.
    pub fn set_swipe(&mut self, fraction: Option<f64>, map: &mut dyn MapEngine) {
        if self.swipe.set_fraction(fraction) && self.mounted.is_some() {
            map.render();
        }
    }

    /// Pre-paint hook for `layer`; ignored for layers this instance does not own.
    pub fn pre_paint(&self, layer: LayerHandle, ctx: &mut dyn PaintContext) {
        if self.handle() == Some(layer) {
            self.swipe.pre_paint(ctx);
        }
    }

    pub fn post_paint(&self, layer: LayerHandle, ctx: &mut dyn PaintContext) {
        if self.handle() == Some(layer) {
            self.swipe.post_paint(ctx);
        }
    }

    /// Delivers a source notification raised by the engine.
    pub fn handle_source_event(
        &mut self,
        source: SourceId,
        event: &SourceEvent,
        map: &mut dyn MapEngine,
        sink: &mut dyn LoadingSink,
    ) {
        if self.mounted.is_none() {
            trace!("{}", SyncError::StaleCallback { source });
            return;
        }
        match event {
            SourceEvent::StateChanged(status) => {
                if let Some(fit) = self.extent_fit.as_mut() {
                    fit.on_state_changed(source, status, map);
                }
            }
            SourceEvent::Tile(_) | SourceEvent::Image(_) => {
                self.tracker.handle(source, event, sink);
            }
        }
    }

    /// Overlay UI from the layer type's render hook, while mounted.
    pub fn overlay(&self, options: &LayerOptions, map: &dyn MapEngine) -> Option<Overlay> {
        let handle = self.handle()?;
        self.registry
            .get(&options.layer_type)?
            .render(options, map, handle)
    }

    /// Detaches the layer from `map`. Safe to call repeatedly or after the
    /// map is gone.
    pub fn unmount(&mut self, map: Option<&mut dyn MapEngine>) {
        self.tracker.detach_all();
        self.extent_fit = None;
        let Some(mounted) = self.mounted.take() else {
            return;
        };
        match map {
            Some(map) => {
                map.remove_layer(mounted.handle);
                debug!(layer_id = %mounted.id, "unmounted layer");
            }
            None => debug!(layer_id = %mounted.id, "map gone before unmount"),
        }
    }
}

fn apply_universal(handle: LayerHandle, options: &EffectiveOptions, map: &mut dyn MapEngine) {
    map.set_visible(handle, options.visibility);
    map.set_opacity(handle, options.engine_opacity());
    map.set_z_index(handle, options.engine_z_index());
}
