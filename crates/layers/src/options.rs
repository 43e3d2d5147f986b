use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Layer type that composes child layers instead of owning a source.
pub const GROUP_TYPE: &str = "group";

/// Declarative description of one map layer.
///
/// Immutable per update cycle: the host builds a fresh value each cycle and
/// the synchronizer diffs it against the previous one. Type-specific fields
/// the core does not know about are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerOptions {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub layer_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_visibility")]
    pub visibility: bool,
    /// 0..=255; unset means fully opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<String>,
    #[serde(default)]
    pub zoom_to_extent: bool,
    /// Transient flag written back by the host's state store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loading: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Children, only meaningful when `layer_type` is [`GROUP_TYPE`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<LayerOptions>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_visibility() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    Json(String),
}

impl std::fmt::Display for OptionsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionsError::Json(msg) => write!(f, "invalid layer options: {msg}"),
        }
    }
}

impl std::error::Error for OptionsError {}

impl LayerOptions {
    pub fn new(id: impl Into<String>, layer_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            layer_type: layer_type.into(),
            name: None,
            visibility: true,
            opacity: None,
            z_index: None,
            srs: None,
            crs: None,
            projection: None,
            zoom_to_extent: false,
            loading: None,
            url: None,
            items: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn group(id: impl Into<String>, items: Vec<LayerOptions>) -> Self {
        let mut options = Self::new(id, GROUP_TYPE);
        options.items = items;
        options
    }

    pub fn from_json(raw: &str) -> Result<Self, OptionsError> {
        serde_json::from_str(raw).map_err(|e| OptionsError::Json(e.to_string()))
    }

    pub fn from_value(value: Value) -> Result<Self, OptionsError> {
        serde_json::from_value(value).map_err(|e| OptionsError::Json(e.to_string()))
    }

    pub fn is_group(&self) -> bool {
        self.layer_type == GROUP_TYPE
    }

    /// Key used for this layer inside a group's composite id.
    pub fn child_key(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_visibility(mut self, visibility: bool) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = Some(z_index);
        self
    }

    pub fn with_projection(mut self, projection: impl Into<String>) -> Self {
        self.projection = Some(projection.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_loading(mut self, loading: bool) -> Self {
        self.loading = Some(loading);
        self
    }

    pub fn with_zoom_to_extent(mut self, zoom_to_extent: bool) -> Self {
        self.zoom_to_extent = zoom_to_extent;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{LayerOptions, OptionsError};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_camel_case_and_keeps_unknown_fields() {
        let options = LayerOptions::from_json(
            r#"{
                "id": "roads",
                "type": "wms",
                "zIndex": 3,
                "zoomToExtent": true,
                "srs": "EPSG:4326",
                "params": {"LAYERS": "roads"}
            }"#,
        )
        .expect("parse");

        assert_eq!(options.id, "roads");
        assert_eq!(options.layer_type, "wms");
        assert_eq!(options.z_index, Some(3));
        assert!(options.zoom_to_extent);
        assert!(options.visibility);
        assert_eq!(options.opacity, None);
        assert_eq!(options.extra.get("params"), Some(&json!({"LAYERS": "roads"})));
    }

    #[test]
    fn parses_group_items() {
        let options = LayerOptions::from_value(json!({
            "id": "g",
            "type": "group",
            "items": [
                {"id": "a", "type": "wms"},
                {"name": "b", "type": "image"}
            ]
        }))
        .expect("parse");

        assert!(options.is_group());
        assert_eq!(options.items.len(), 2);
        assert_eq!(options.items[0].child_key(), "a");
        assert_eq!(options.items[1].child_key(), "b");
    }

    #[test]
    fn serializes_back_to_camel_case() {
        let options = LayerOptions::new("x", "tile")
            .with_z_index(2)
            .with_extra("style", json!("red"));
        let value = serde_json::to_value(&options).expect("serialize");
        assert_eq!(
            value,
            json!({
                "id": "x",
                "type": "tile",
                "visibility": true,
                "zIndex": 2,
                "zoomToExtent": false,
                "style": "red"
            })
        );
    }

    #[test]
    fn rejects_missing_type() {
        let err = LayerOptions::from_json(r#"{"id": "x"}"#).unwrap_err();
        assert!(matches!(err, OptionsError::Json(_)));
    }
}
