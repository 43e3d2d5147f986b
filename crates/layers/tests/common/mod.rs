#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use foundation::handles::LayerHandle;
use layers::{EffectiveOptions, LayerRegistry, LayerType};
use layers::raster::TileLayerType;
use scene::engine::{MapEngine, SourceDesc, SourceKind};

/// Records every `update` call it receives as `(new, old)`.
#[derive(Clone, Default)]
pub struct RecordingType {
    pub kind: Option<SourceKind>,
    pub updates: Rc<RefCell<Vec<(EffectiveOptions, EffectiveOptions)>>>,
}

impl RecordingType {
    pub fn tiled() -> Self {
        Self {
            kind: Some(SourceKind::Tiled),
            ..Self::default()
        }
    }

    pub fn update_count(&self) -> usize {
        self.updates.borrow().len()
    }
}

impl LayerType for RecordingType {
    fn create(&self, options: &EffectiveOptions, map: &mut dyn MapEngine) -> Option<LayerHandle> {
        let kind = self.kind.unwrap_or(SourceKind::Tiled);
        Some(map.create_layer(SourceDesc::new(kind, options.projection.clone())))
    }

    fn update(
        &self,
        _layer: LayerHandle,
        new: &EffectiveOptions,
        old: &EffectiveOptions,
        _map: &mut dyn MapEngine,
    ) -> bool {
        self.updates.borrow_mut().push((new.clone(), old.clone()));
        true
    }
}

/// Registry with a recording `wms` entry plus stock `image` and `vector`.
pub fn registry_with(recorder: &RecordingType) -> Rc<LayerRegistry> {
    let mut registry = LayerRegistry::with_defaults();
    registry.register("wms", recorder.clone());
    registry.register("xyz", TileLayerType);
    Rc::new(registry)
}
