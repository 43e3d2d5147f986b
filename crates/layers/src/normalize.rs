use serde_json::{Map, Value};

use crate::options::LayerOptions;

/// Opacity applied when the options leave it unset.
pub const DEFAULT_OPACITY: f64 = 255.0;

/// Layer options with projection and opacity resolved.
///
/// Derived every cycle, never stored back into the options.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveOptions {
    pub id: String,
    pub layer_type: String,
    pub name: Option<String>,
    pub visibility: bool,
    pub opacity: f64,
    pub z_index: Option<i32>,
    pub projection: String,
    pub zoom_to_extent: bool,
    pub loading: Option<bool>,
    pub url: Option<String>,
    /// Not normalized here; children are resolved when they are created.
    pub items: Vec<LayerOptions>,
    pub extra: Map<String, Value>,
}

impl EffectiveOptions {
    /// Deep equality ignoring the transient `loading` flag.
    pub fn same_structure(&self, other: &Self) -> bool {
        let Self {
            id,
            layer_type,
            name,
            visibility,
            opacity,
            z_index,
            projection,
            zoom_to_extent,
            loading: _,
            url,
            items,
            extra,
        } = self;

        *id == other.id
            && *layer_type == other.layer_type
            && *name == other.name
            && *visibility == other.visibility
            && *opacity == other.opacity
            && *z_index == other.z_index
            && *projection == other.projection
            && *zoom_to_extent == other.zoom_to_extent
            && *url == other.url
            && *items == other.items
            && *extra == other.extra
    }

    /// Opacity in the engine's `[0, 1]` range.
    pub fn engine_opacity(&self) -> f64 {
        (self.opacity / 255.0).clamp(0.0, 1.0)
    }

    pub fn engine_z_index(&self) -> i32 {
        self.z_index.unwrap_or(0)
    }
}

/// Resolves `options` against the host's fallback projection.
///
/// Projection precedence: `srs`, `crs`, `projection`, then `fallback_projection`.
pub fn normalize(options: &LayerOptions, fallback_projection: &str) -> EffectiveOptions {
    let projection = options
        .srs
        .as_deref()
        .or(options.crs.as_deref())
        .or(options.projection.as_deref())
        .unwrap_or(fallback_projection)
        .to_string();

    EffectiveOptions {
        id: options.id.clone(),
        layer_type: options.layer_type.clone(),
        name: options.name.clone(),
        visibility: options.visibility,
        opacity: options.opacity.unwrap_or(DEFAULT_OPACITY),
        z_index: options.z_index,
        projection,
        zoom_to_extent: options.zoom_to_extent,
        loading: options.loading,
        url: options.url.clone(),
        items: options.items.clone(),
        extra: options.extra.clone(),
    }
}
