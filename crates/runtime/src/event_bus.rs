use foundation::ids::LayerId;

/// A loading-state transition for one logical layer id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingEvent {
    /// 0-based emission order within the bus.
    pub seq: u64,
    pub layer_id: LayerId,
    pub loading: bool,
}

/// Receives loading-state transitions.
///
/// The core only publishes; storing the flag is up to the implementor.
pub trait LoadingSink {
    fn loading_changed(&mut self, layer_id: &LayerId, loading: bool);
}

impl<F> LoadingSink for F
where
    F: FnMut(&LayerId, bool),
{
    fn loading_changed(&mut self, layer_id: &LayerId, loading: bool) {
        self(layer_id, loading)
    }
}

/// Recording sink.
///
/// Keeps events in emission order and the latest flag per layer id.
#[derive(Debug, Default)]
pub struct EventBus {
    next_seq: u64,
    events: Vec<LoadingEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, layer_id: LayerId, loading: bool) {
        self.events.push(LoadingEvent {
            seq: self.next_seq,
            layer_id,
            loading,
        });
        self.next_seq += 1;
    }

    pub fn events(&self) -> &[LoadingEvent] {
        &self.events
    }

    /// Events for one layer id, as `loading` flags in emission order.
    pub fn flags_for(&self, layer_id: &LayerId) -> Vec<bool> {
        self.events
            .iter()
            .filter(|e| &e.layer_id == layer_id)
            .map(|e| e.loading)
            .collect()
    }

    /// Latest flag reported for `layer_id`, `false` if never reported.
    pub fn is_loading(&self, layer_id: &LayerId) -> bool {
        self.events
            .iter()
            .rev()
            .find(|e| &e.layer_id == layer_id)
            .is_some_and(|e| e.loading)
    }

    pub fn drain(&mut self) -> Vec<LoadingEvent> {
        std::mem::take(&mut self.events)
    }
}

impl LoadingSink for EventBus {
    fn loading_changed(&mut self, layer_id: &LayerId, loading: bool) {
        self.emit(layer_id.clone(), loading);
    }
}
