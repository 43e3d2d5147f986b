use foundation::handles::LayerHandle;
use scene::engine::{MapEngine, SourceDesc, SourceKind};
use serde_json::Value;

use crate::layer::LayerType;
use crate::normalize::EffectiveOptions;

/// Tiled raster layer (`tile`, `wms`): many overlapping per-tile requests.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct TileLayerType;

/// Untiled raster layer: one request per full-image refresh.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ImageLayerType;

/// Builds the source description shared by raster types.
///
/// Request parameters come from the `params` object of the options; string
/// values are used verbatim, anything else as its JSON text.
pub fn raster_source(kind: SourceKind, options: &EffectiveOptions) -> SourceDesc {
    let mut desc = SourceDesc::new(kind, options.projection.clone());
    desc.url = options.url.clone();
    if let Some(Value::Object(params)) = options.extra.get("params") {
        for (key, value) in params {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            desc.params.insert(key.clone(), value);
        }
    }
    desc
}

fn update_raster(
    kind: SourceKind,
    layer: LayerHandle,
    new: &EffectiveOptions,
    old: &EffectiveOptions,
    map: &mut dyn MapEngine,
) -> bool {
    let next = raster_source(kind, new);
    if next != raster_source(kind, old) {
        map.update_source(layer, next);
    }
    true
}

impl LayerType for TileLayerType {
    fn create(&self, options: &EffectiveOptions, map: &mut dyn MapEngine) -> Option<LayerHandle> {
        Some(map.create_layer(raster_source(SourceKind::Tiled, options)))
    }

    fn update(
        &self,
        layer: LayerHandle,
        new: &EffectiveOptions,
        old: &EffectiveOptions,
        map: &mut dyn MapEngine,
    ) -> bool {
        update_raster(SourceKind::Tiled, layer, new, old, map)
    }
}

impl LayerType for ImageLayerType {
    fn create(&self, options: &EffectiveOptions, map: &mut dyn MapEngine) -> Option<LayerHandle> {
        Some(map.create_layer(raster_source(SourceKind::Image, options)))
    }

    fn update(
        &self,
        layer: LayerHandle,
        new: &EffectiveOptions,
        old: &EffectiveOptions,
        map: &mut dyn MapEngine,
    ) -> bool {
        update_raster(SourceKind::Image, layer, new, old, map)
    }
}
