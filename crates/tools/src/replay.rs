use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use foundation::bounds::Extent;
use foundation::handles::SourceId;
use foundation::ids::LayerId;
use layers::{LayerOptions, LayerRegistry, LayerSynchronizer, Overlay, SyncConfig};
use runtime::event_bus::{EventBus, LoadingEvent};
use scene::engine::{ClipRect, LoadPhase, MapEngine, SourceEvent, ViewportSize};
use scene::memory::MemoryMap;
use scene::paint::RecordingCanvas;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const VIEWPORT_ENV: &str = "ATLAS_VIEWPORT";
pub const DEFAULT_VIEWPORT: ViewportSize = ViewportSize {
    width: 800.0,
    height: 600.0,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    Io(String),
    Json(String),
    InvalidViewport(String),
    UnknownLayer(String),
    UnknownSource { layer: String, child: String },
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::Io(msg) => write!(f, "scenario io error: {msg}"),
            ScenarioError::Json(msg) => write!(f, "scenario json error: {msg}"),
            ScenarioError::InvalidViewport(raw) => {
                write!(f, "invalid viewport {raw:?} (expected <width>x<height>)")
            }
            ScenarioError::UnknownLayer(key) => write!(f, "step references unknown layer {key:?}"),
            ScenarioError::UnknownSource { layer, child } => {
                write!(f, "layer {layer:?} tracks no source for {child:?}")
            }
        }
    }
}

impl std::error::Error for ScenarioError {}

/// Tool settings resolved from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig {
    pub sync: SyncConfig,
    pub viewport: ViewportSize,
}

impl ToolConfig {
    pub fn from_env() -> Result<Self, ScenarioError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ScenarioError> {
        let viewport = match lookup(VIEWPORT_ENV) {
            Some(raw) if !raw.trim().is_empty() => parse_viewport(&raw)?,
            _ => DEFAULT_VIEWPORT,
        };
        Ok(Self {
            sync: SyncConfig::from_lookup(lookup),
            viewport,
        })
    }
}

pub fn parse_viewport(raw: &str) -> Result<ViewportSize, ScenarioError> {
    let invalid = || ScenarioError::InvalidViewport(raw.to_string());
    let (w, h) = raw.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: f64 = w.trim().parse().map_err(|_| invalid())?;
    let height: f64 = h.trim().parse().map_err(|_| invalid())?;
    if width <= 0.0 || height <= 0.0 {
        return Err(invalid());
    }
    Ok(ViewportSize::new(width, height))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default)]
    pub default_projection: Option<String>,
    #[serde(default)]
    pub viewport: Option<[f64; 2]>,
    pub steps: Vec<ScriptStep>,
}

impl Scenario {
    pub fn from_json(raw: &str) -> Result<Self, ScenarioError> {
        serde_json::from_str(raw).map_err(|e| ScenarioError::Json(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScenarioError::Io(format!("read {path:?}: {e}")))?;
        Self::from_json(&raw)
    }
}

/// One step, addressed to the synchronizer registered under `layer`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptStep {
    pub layer: String,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Action {
    Reconcile {
        options: LayerOptions,
    },
    Swipe {
        #[serde(default)]
        value: Option<f64>,
    },
    Source {
        /// Logical id of the tracked source, e.g. `roads` or `g#a`.
        child: String,
        event: EventName,
        /// Feature extents as `[min_x, min_y, max_x, max_y]`, for `change`.
        #[serde(default)]
        features: Vec<[f64; 4]>,
    },
    Paint,
    Unmount,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventName {
    TileLoadStart,
    TileLoadEnd,
    TileLoadError,
    ImageLoadStart,
    ImageLoadEnd,
    ImageLoadError,
    Change,
}

impl EventName {
    fn load_event(self) -> Option<SourceEvent> {
        let event = match self {
            EventName::TileLoadStart => SourceEvent::Tile(LoadPhase::Start),
            EventName::TileLoadEnd => SourceEvent::Tile(LoadPhase::End),
            EventName::TileLoadError => SourceEvent::Tile(LoadPhase::Error),
            EventName::ImageLoadStart => SourceEvent::Image(LoadPhase::Start),
            EventName::ImageLoadEnd => SourceEvent::Image(LoadPhase::End),
            EventName::ImageLoadError => SourceEvent::Image(LoadPhase::Error),
            EventName::Change => return None,
        };
        Some(event)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadingLine {
    pub id: String,
    pub loading: bool,
}

impl From<LoadingEvent> for LoadingLine {
    fn from(event: LoadingEvent) -> Self {
        Self {
            id: event.layer_id.to_string(),
            loading: event.loading,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSummary {
    pub id: Option<String>,
    pub visible: bool,
    pub opacity: f64,
    pub z_index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipSummary {
    pub layer: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub layers: Vec<LayerSummary>,
    pub renders: u64,
    pub fits: Vec<[f64; 4]>,
    pub clips: Vec<ClipSummary>,
    pub overlays: Vec<Overlay>,
}

/// Drives synchronizers against an in-memory map, one step at a time.
#[derive(Debug)]
pub struct Replay {
    registry: Rc<LayerRegistry>,
    config: SyncConfig,
    map: MemoryMap,
    bus: EventBus,
    layers: BTreeMap<String, LayerSynchronizer>,
    current: BTreeMap<String, LayerOptions>,
    sources: BTreeMap<(String, LayerId), SourceId>,
    clips: Vec<ClipSummary>,
}

impl Replay {
    pub fn new(registry: Rc<LayerRegistry>, config: SyncConfig, viewport: ViewportSize) -> Self {
        let mut map = MemoryMap::new();
        map.set_size(Some(viewport));
        Self {
            registry,
            config,
            map,
            bus: EventBus::new(),
            layers: BTreeMap::new(),
            current: BTreeMap::new(),
            sources: BTreeMap::new(),
            clips: Vec::new(),
        }
    }

    /// Scenario settings take precedence over the tool config.
    pub fn for_scenario(registry: Rc<LayerRegistry>, scenario: &Scenario, tool: &ToolConfig) -> Self {
        let config = match &scenario.default_projection {
            Some(p) => SyncConfig::new(p.clone()),
            None => tool.sync.clone(),
        };
        let viewport = scenario
            .viewport
            .map(|[w, h]| ViewportSize::new(w, h))
            .unwrap_or(tool.viewport);
        Self::new(registry, config, viewport)
    }

    pub fn map(&self) -> &MemoryMap {
        &self.map
    }

    /// Applies one step and returns the loading events it produced.
    pub fn apply(&mut self, step: &ScriptStep) -> Result<Vec<LoadingEvent>, ScenarioError> {
        debug!(layer = %step.layer, action = ?step.action, "replay step");
        match &step.action {
            Action::Reconcile { options } => {
                let sync = self
                    .layers
                    .entry(step.layer.clone())
                    .or_insert_with(|| {
                        LayerSynchronizer::new(self.registry.clone(), self.config.clone())
                    });
                sync.reconcile(options, &mut self.map);
                for (id, source, _) in sync.tracked_sources() {
                    self.sources.insert((step.layer.clone(), id), source);
                }
                self.current.insert(step.layer.clone(), options.clone());
            }
            Action::Swipe { value } => {
                let sync = synchronizer(&mut self.layers, &step.layer)?;
                sync.set_swipe(*value, &mut self.map);
            }
            Action::Source {
                child,
                event,
                features,
            } => {
                let source = self.tracked_source(&step.layer, child)?;
                let event = match event.load_event() {
                    Some(event) => event,
                    None => {
                        let extents: Vec<Extent> =
                            features.iter().map(|c| Extent::from_corners(*c)).collect();
                        match self.map.load_features(source, &extents) {
                            Some(event) => event,
                            None => return Ok(Vec::new()),
                        }
                    }
                };
                let sync = synchronizer(&mut self.layers, &step.layer)?;
                sync.handle_source_event(source, &event, &mut self.map, &mut self.bus);
            }
            Action::Paint => self.paint(),
            Action::Unmount => {
                let sync = synchronizer(&mut self.layers, &step.layer)?;
                sync.unmount(Some(&mut self.map));
                self.current.remove(&step.layer);
            }
        }
        Ok(self.bus.drain())
    }

    pub fn run(&mut self, scenario: &Scenario) -> Result<Vec<LoadingEvent>, ScenarioError> {
        let mut events = Vec::new();
        for step in &scenario.steps {
            events.extend(self.apply(step)?);
        }
        info!(steps = scenario.steps.len(), events = events.len(), "replay finished");
        Ok(events)
    }

    /// Sources are remembered past unmount so late engine events can still
    /// be routed to their synchronizer.
    fn tracked_source(&self, key: &str, child: &str) -> Result<SourceId, ScenarioError> {
        if !self.layers.contains_key(key) {
            return Err(ScenarioError::UnknownLayer(key.to_string()));
        }
        self.sources
            .get(&(key.to_string(), LayerId::new(child)))
            .copied()
            .ok_or_else(|| ScenarioError::UnknownSource {
                layer: key.to_string(),
                child: child.to_string(),
            })
    }

    /// Paints every attached layer in draw order through its owner's hooks.
    fn paint(&mut self) {
        let Some(size) = self.map.size() else {
            return;
        };
        for handle in self.map.draw_order() {
            let mut canvas = RecordingCanvas::new(size.width, size.height);
            for sync in self.layers.values() {
                sync.pre_paint(handle, &mut canvas);
                sync.post_paint(handle, &mut canvas);
            }
            let layer = self
                .map
                .layer_id(handle)
                .map(|id| id.to_string())
                .unwrap_or_default();
            for ClipRect { width, height, .. } in canvas.clips() {
                self.clips.push(ClipSummary {
                    layer: layer.clone(),
                    width,
                    height,
                });
            }
        }
    }

    pub fn summary(&self) -> Summary {
        let layers = self
            .map
            .attached()
            .iter()
            .filter_map(|h| self.map.layer(*h))
            .map(|node| LayerSummary {
                id: node.id.as_ref().map(|id| id.to_string()),
                visible: node.visible,
                opacity: node.opacity,
                z_index: node.z_index,
            })
            .collect();
        let overlays = self
            .current
            .iter()
            .filter_map(|(key, options)| self.layers.get(key)?.overlay(options, &self.map))
            .collect();
        Summary {
            layers,
            renders: self.map.render_count(),
            fits: self.map.fits().iter().map(|e| e.corners()).collect(),
            clips: self.clips.clone(),
            overlays,
        }
    }
}

fn synchronizer<'a>(
    layers: &'a mut BTreeMap<String, LayerSynchronizer>,
    key: &str,
) -> Result<&'a mut LayerSynchronizer, ScenarioError> {
    layers
        .get_mut(key)
        .ok_or_else(|| ScenarioError::UnknownLayer(key.to_string()))
}
