use std::collections::{BTreeMap, BTreeSet};

use foundation::handles::SourceId;
use foundation::ids::LayerId;
use runtime::event_bus::LoadingSink;
use scene::engine::{LoadPhase, SourceEvent, SourceKind, SourceRef};
use tracing::{trace, warn};

use crate::error::SyncError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Attachment {
    layer_id: LayerId,
    kind: SourceKind,
}

/// Aggregates source load events into one loading flag per logical layer id.
///
/// Tiled sources share a single in-flight counter for the whole tracker, so
/// a layer reads "loading" from its first outstanding tile until the last
/// one settles. Untiled sources report each request directly.
///
/// Invariants:
/// - `tiles_in_flight` never underflows; an unmatched end/error is a no-op.
/// - Every id flagged loading through the counter is reported `false` once
///   the counter returns to zero, in id order.
#[derive(Debug, Default)]
pub struct LoadStateTracker {
    attachments: BTreeMap<SourceId, Attachment>,
    tiles_in_flight: u32,
    tiled_loading: BTreeSet<LayerId>,
}

impl LoadStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to the load events of one leaf source.
    ///
    /// Tile events are only honoured for tiled sources and image events only
    /// for the others.
    pub fn attach(&mut self, layer_id: LayerId, source: SourceRef) {
        trace!(%layer_id, source = %source.id, kind = ?source.kind, "attach source");
        self.attachments.insert(
            source.id,
            Attachment {
                layer_id,
                kind: source.kind,
            },
        );
    }

    /// Drops every subscription; later events become no-ops.
    pub fn detach_all(&mut self) {
        self.attachments.clear();
    }

    pub fn is_attached(&self, source: SourceId) -> bool {
        self.attachments.contains_key(&source)
    }

    /// Attached sources in source order.
    pub fn attachments(&self) -> impl Iterator<Item = (SourceId, &LayerId, SourceKind)> {
        self.attachments
            .iter()
            .map(|(source, a)| (*source, &a.layer_id, a.kind))
    }

    pub fn tiles_in_flight(&self) -> u32 {
        self.tiles_in_flight
    }

    /// Routes one source event.
    ///
    /// Returns `false` if the source is not attached or the event does not
    /// match its capability.
    pub fn handle(
        &mut self,
        source: SourceId,
        event: &SourceEvent,
        sink: &mut dyn LoadingSink,
    ) -> bool {
        let Some(attachment) = self.attachments.get(&source) else {
            trace!(%source, "event for unattached source");
            return false;
        };
        let layer_id = attachment.layer_id.clone();

        match (event, attachment.kind) {
            (SourceEvent::Tile(phase), SourceKind::Tiled) => {
                self.on_tile(layer_id, *phase, sink);
                true
            }
            (SourceEvent::Image(phase), kind) if !kind.is_tiled() => {
                sink.loading_changed(&layer_id, *phase == LoadPhase::Start);
                true
            }
            _ => false,
        }
    }

    fn on_tile(&mut self, layer_id: LayerId, phase: LoadPhase, sink: &mut dyn LoadingSink) {
        match phase {
            LoadPhase::Start => {
                if self.tiled_loading.insert(layer_id.clone()) {
                    sink.loading_changed(&layer_id, true);
                }
                self.tiles_in_flight += 1;
            }
            LoadPhase::End | LoadPhase::Error => {
                if self.tiles_in_flight == 0 {
                    warn!("{}", SyncError::CounterUnderflow { layer_id });
                    self.settle(sink);
                    return;
                }
                self.tiles_in_flight -= 1;
                if self.tiles_in_flight == 0 {
                    self.settle(sink);
                }
            }
        }
    }

    fn settle(&mut self, sink: &mut dyn LoadingSink) {
        for layer_id in std::mem::take(&mut self.tiled_loading) {
            sink.loading_changed(&layer_id, false);
        }
    }
}
