use foundation::handles::SourceId;
use foundation::ids::LayerId;

/// Anomalies the synchronizer tolerates.
///
/// None of these are returned to the caller; they are logged and the layer
/// degrades to an inert handle or a corrected loading flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    UnknownLayerType {
        layer_id: LayerId,
        layer_type: String,
    },
    UnknownGroupChildType {
        group_id: LayerId,
        child: String,
        layer_type: String,
    },
    CreateFailed {
        layer_id: LayerId,
        layer_type: String,
    },
    AlreadyMounted {
        layer_id: LayerId,
    },
    Remount {
        layer_id: LayerId,
    },
    CounterUnderflow {
        layer_id: LayerId,
    },
    StaleCallback {
        source: SourceId,
    },
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::UnknownLayerType {
                layer_id,
                layer_type,
            } => write!(f, "layer {layer_id}: unknown layer type {layer_type:?}"),
            SyncError::UnknownGroupChildType {
                group_id,
                child,
                layer_type,
            } => write!(
                f,
                "group {group_id}: child {child:?} has unknown layer type {layer_type:?}"
            ),
            SyncError::CreateFailed {
                layer_id,
                layer_type,
            } => write!(f, "layer {layer_id}: {layer_type:?} produced no layer"),
            SyncError::AlreadyMounted { layer_id } => {
                write!(f, "layer {layer_id}: already mounted")
            }
            SyncError::Remount { layer_id } => {
                write!(f, "layer {layer_id}: mount after unmount ignored")
            }
            SyncError::CounterUnderflow { layer_id } => {
                write!(f, "layer {layer_id}: tile load ended with no tile in flight")
            }
            SyncError::StaleCallback { source } => {
                write!(f, "{source}: event after unmount")
            }
        }
    }
}

impl std::error::Error for SyncError {}
