use foundation::handles::LayerHandle;
use scene::engine::MapEngine;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::normalize::EffectiveOptions;
use crate::options::LayerOptions;

/// UI element a layer type may draw on top of the map (legend, attribution).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub kind: String,
    pub props: Map<String, Value>,
}

impl Overlay {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            props: Map::new(),
        }
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }
}

/// Rendering strategy for one layer type.
///
/// Only `create` is mandatory. Types without an `update` hook are static
/// after creation: structural option changes are dropped for them.
pub trait LayerType {
    /// Builds the engine layer. `None` leaves the layer inert.
    fn create(&self, options: &EffectiveOptions, map: &mut dyn MapEngine) -> Option<LayerHandle>;

    /// Applies a structural change in place.
    ///
    /// Returns `false` if this type has no update hook.
    fn update(
        &self,
        _layer: LayerHandle,
        _new: &EffectiveOptions,
        _old: &EffectiveOptions,
        _map: &mut dyn MapEngine,
    ) -> bool {
        false
    }

    fn render(
        &self,
        _options: &LayerOptions,
        _map: &dyn MapEngine,
        _layer: LayerHandle,
    ) -> Option<Overlay> {
        None
    }
}
