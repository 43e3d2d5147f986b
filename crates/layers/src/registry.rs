use std::collections::BTreeMap;

use crate::layer::LayerType;
use crate::raster::{ImageLayerType, TileLayerType};
use crate::vector::VectorLayerType;

/// Open mapping from layer type identifier to its rendering strategy.
#[derive(Default)]
pub struct LayerRegistry {
    entries: BTreeMap<String, Box<dyn LayerType>>,
}

impl std::fmt::Debug for LayerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerRegistry")
            .field("types", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the stock `tile`, `wms`, `image` and `vector` types.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("tile", TileLayerType);
        registry.register("wms", TileLayerType);
        registry.register("image", ImageLayerType);
        registry.register("vector", VectorLayerType);
        registry
    }

    /// Registers `layer_type` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, layer_type: impl LayerType + 'static) {
        self.entries.insert(name.into(), Box::new(layer_type));
    }

    pub fn get(&self, name: &str) -> Option<&dyn LayerType> {
        self.entries.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered type names in sorted order.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::LayerRegistry;
    use crate::layer::LayerType;
    use crate::normalize::EffectiveOptions;
    use foundation::handles::LayerHandle;
    use scene::engine::MapEngine;

    struct Inert;

    impl LayerType for Inert {
        fn create(&self, _: &EffectiveOptions, _: &mut dyn MapEngine) -> Option<LayerHandle> {
            None
        }
    }

    #[test]
    fn defaults_cover_stock_types() {
        let registry = LayerRegistry::with_defaults();
        let types: Vec<&str> = registry.types().collect();
        assert_eq!(types, vec!["image", "tile", "vector", "wms"]);
        assert!(!registry.contains("group"));
    }

    #[test]
    fn register_replaces_existing_entry() {
        let mut registry = LayerRegistry::with_defaults();
        registry.register("wms", Inert);
        registry.register("custom", Inert);
        assert!(registry.get("custom").is_some());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.types().count(), 5);
    }
}
