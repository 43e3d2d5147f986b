use foundation::bounds::Extent;
use foundation::handles::LayerHandle;
use scene::engine::{MapEngine, SourceDesc, SourceKind};
use serde_json::Value;

use crate::layer::{LayerType, Overlay};
use crate::normalize::EffectiveOptions;
use crate::options::LayerOptions;

/// Vector layer backed by an in-memory feature source.
///
/// Inline GeoJSON-like `features` in the extra params are loaded into the
/// source at creation. Static after that: there is no update hook.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct VectorLayerType;

impl LayerType for VectorLayerType {
    fn create(&self, options: &EffectiveOptions, map: &mut dyn MapEngine) -> Option<LayerHandle> {
        let mut desc = SourceDesc::new(SourceKind::Vector, options.projection.clone());
        desc.url = options.url.clone();
        if let Some(Value::String(format)) = options.extra.get("format") {
            desc.params.insert("format".into(), format.clone());
        }
        let layer = map.create_layer(desc);
        if let Some(features) = options.extra.get("features").and_then(feature_extents) {
            if let Some(source) = map.source(layer) {
                map.load_features(source.id, &features);
            }
        }
        Some(layer)
    }

    /// Legend entry: title plus the `style` object, if any.
    fn render(
        &self,
        options: &LayerOptions,
        _map: &dyn MapEngine,
        _layer: LayerHandle,
    ) -> Option<Overlay> {
        let title = options.name.clone().unwrap_or_else(|| options.id.clone());
        let mut overlay = Overlay::new("legend").with_prop("title", Value::String(title));
        if let Some(style) = options.extra.get("style") {
            overlay = overlay.with_prop("style", style.clone());
        }
        Some(overlay)
    }
}

/// One extent per feature, from its `bbox` or else its geometry
/// coordinates. Features without coordinates get an empty extent.
fn feature_extents(features: &Value) -> Option<Vec<Extent>> {
    let features = features.as_array()?;
    Some(features.iter().map(feature_extent).collect())
}

fn feature_extent(feature: &Value) -> Extent {
    if let Some(bbox) = feature.get("bbox").and_then(bbox_extent) {
        return bbox;
    }
    let geometry = feature.get("geometry").unwrap_or(feature);
    let mut extent = Extent::new([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]);
    if let Some(coordinates) = geometry.get("coordinates") {
        extend_with_positions(&mut extent, coordinates);
    }
    extent
}

/// `[minx, miny, maxx, maxy]`, or the 3D form `[minx, miny, minz, maxx, maxy, maxz]`.
fn bbox_extent(bbox: &Value) -> Option<Extent> {
    let values: Vec<f64> = bbox.as_array()?.iter().filter_map(Value::as_f64).collect();
    match values.as_slice() {
        [a, b, c, d] => Some(Extent::from_corners([*a, *b, *c, *d])),
        [a, b, _, d, e, _] => Some(Extent::from_corners([*a, *b, *d, *e])),
        _ => None,
    }
}

fn extend_with_positions(extent: &mut Extent, coordinates: &Value) {
    let Some(items) = coordinates.as_array() else {
        return;
    };
    if let (Some(x), Some(y)) = (
        items.first().and_then(Value::as_f64),
        items.get(1).and_then(Value::as_f64),
    ) {
        *extent = extent.union(&Extent::new([x, y], [x, y]));
        return;
    }
    for item in items {
        extend_with_positions(extent, item);
    }
}
