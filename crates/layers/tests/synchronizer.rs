mod common;

use std::rc::Rc;

use common::{RecordingType, registry_with};
use foundation::ids::LayerId;
use layers::{LayerOptions, LayerRegistry, LayerSynchronizer, SyncConfig};
use pretty_assertions::assert_eq;
use scene::engine::{ClipRect, MapEngine, SourceKind};
use scene::memory::{LayerNodeKind, MemoryMap};
use scene::paint::RecordingCanvas;
use serde_json::json;

fn synchronizer(recorder: &RecordingType) -> LayerSynchronizer {
    LayerSynchronizer::new(registry_with(recorder), SyncConfig::default())
}

#[test]
fn mount_applies_universal_properties() {
    let recorder = RecordingType::tiled();
    let mut sync = synchronizer(&recorder);
    let mut map = MemoryMap::with_size(800.0, 600.0);

    let options = LayerOptions::new("roads", "wms")
        .with_visibility(false)
        .with_opacity(127.5)
        .with_z_index(4);
    let handle = sync.mount(&options, &mut map).expect("mounted");

    assert!(sync.is_mounted());
    assert!(sync.has_mounted());
    assert_eq!(map.attached(), &[handle]);
    let node = map.layer(handle).expect("node");
    assert_eq!(node.id, Some(LayerId::new("roads")));
    assert!(!node.visible);
    assert_eq!(node.opacity, 0.5);
    assert_eq!(node.z_index, 4);
    assert_eq!(
        sync.tracked_sources()
            .into_iter()
            .map(|(id, _, kind)| (id, kind))
            .collect::<Vec<_>>(),
        vec![(LayerId::new("roads"), SourceKind::Tiled)]
    );
}

#[test]
fn mount_then_unmount_leaves_map_unchanged() {
    let recorder = RecordingType::tiled();
    let mut map = MemoryMap::new();
    let mut other = synchronizer(&recorder);
    other.mount(&LayerOptions::new("base", "xyz"), &mut map);
    let before = map.attached().to_vec();

    let mut sync = synchronizer(&recorder);
    sync.mount(&LayerOptions::new("roads", "wms"), &mut map);
    assert_eq!(map.attached().len(), 2);
    sync.unmount(Some(&mut map));

    assert_eq!(map.attached(), before.as_slice());
    assert!(!sync.is_mounted());
    assert!(sync.tracked_sources().is_empty());
}

#[test]
fn unmount_is_idempotent_and_tolerates_missing_map() {
    let recorder = RecordingType::tiled();
    let mut map = MemoryMap::new();
    let mut sync = synchronizer(&recorder);
    sync.mount(&LayerOptions::new("roads", "wms"), &mut map);

    sync.unmount(None);
    sync.unmount(None);
    sync.unmount(Some(&mut map));
    assert!(!sync.is_mounted());
    // The map was never told, so the layer is still attached there.
    assert_eq!(map.attached().len(), 1);
}

#[test]
fn second_mount_keeps_existing_layer() {
    let recorder = RecordingType::tiled();
    let mut map = MemoryMap::new();
    let mut sync = synchronizer(&recorder);
    let first = sync.mount(&LayerOptions::new("roads", "wms"), &mut map);
    let second = sync.mount(&LayerOptions::new("roads", "wms"), &mut map);
    assert_eq!(first, second);
    assert_eq!(map.attached().len(), 1);
}

#[test]
fn mount_after_unmount_stays_inert() {
    let recorder = RecordingType::tiled();
    let mut map = MemoryMap::new();
    let mut sync = synchronizer(&recorder);
    sync.mount(&LayerOptions::new("roads", "wms"), &mut map).expect("mounted");
    sync.unmount(Some(&mut map));

    assert_eq!(sync.mount(&LayerOptions::new("roads", "wms"), &mut map), None);
    assert!(!sync.is_mounted());
    assert!(sync.tracked_sources().is_empty());
    assert!(map.attached().is_empty());
}

#[test]
fn unknown_type_is_inert() {
    let recorder = RecordingType::tiled();
    let mut map = MemoryMap::new();
    let mut sync = synchronizer(&recorder);

    assert_eq!(sync.mount(&LayerOptions::new("x", "unknown"), &mut map), None);
    assert!(sync.has_mounted());
    assert!(!sync.is_mounted());
    assert!(map.attached().is_empty());

    sync.update(
        &LayerOptions::new("x", "unknown").with_opacity(3.0),
        &LayerOptions::new("x", "unknown"),
        &mut map,
    );
    sync.set_swipe(Some(40.0), &mut map);
    assert_eq!(map.render_count(), 0);
    sync.unmount(Some(&mut map));
}

#[test]
fn loading_only_change_skips_type_update() {
    let recorder = RecordingType::tiled();
    let mut map = MemoryMap::new();
    let mut sync = synchronizer(&recorder);
    let old = LayerOptions::new("roads", "wms").with_loading(false);
    sync.mount(&old, &mut map);

    let new = old.clone().with_loading(true);
    sync.update(&new, &old, &mut map);
    assert_eq!(recorder.update_count(), 0);
}

#[test]
fn structural_change_calls_type_update_once_with_normalized_options() {
    let recorder = RecordingType::tiled();
    let mut map = MemoryMap::new();
    let mut sync = synchronizer(&recorder);
    let old = LayerOptions::new("roads", "wms");
    sync.mount(&old, &mut map);

    let new = old
        .clone()
        .with_extra("params", json!({"LAYERS": "rivers"}))
        .with_loading(true);
    sync.update(&new, &old, &mut map);

    let updates = recorder.updates.borrow();
    assert_eq!(updates.len(), 1);
    let (seen_new, seen_old) = &updates[0];
    assert_eq!(seen_new.projection, "EPSG:3857");
    assert_eq!(seen_new.opacity, 255.0);
    assert_eq!(seen_new.extra.get("params"), Some(&json!({"LAYERS": "rivers"})));
    assert_eq!(seen_old.extra.get("params"), None);
}

#[test]
fn projection_alias_change_to_same_value_is_not_structural() {
    let recorder = RecordingType::tiled();
    let mut map = MemoryMap::new();
    let mut sync = synchronizer(&recorder);
    let old = LayerOptions::new("roads", "wms");
    sync.mount(&old, &mut map);

    let mut new = old.clone();
    new.crs = Some("EPSG:3857".into());
    sync.update(&new, &old, &mut map);
    assert_eq!(recorder.update_count(), 0);
}

#[test]
fn universal_properties_are_reapplied_every_cycle() {
    let recorder = RecordingType::tiled();
    let mut map = MemoryMap::new();
    let mut sync = synchronizer(&recorder);
    let options = LayerOptions::new("roads", "wms").with_z_index(1);
    let handle = sync.mount(&options, &mut map).expect("mounted");

    // Something else touched the layer behind our back.
    map.set_visible(handle, false);
    map.set_z_index(handle, 9);

    sync.update(&options, &options, &mut map);
    let node = map.layer(handle).expect("node");
    assert!(node.visible);
    assert_eq!(node.z_index, 1);
    assert_eq!(recorder.update_count(), 0);

    let hidden = options.clone().with_visibility(false).with_opacity(0.0);
    sync.update(&hidden, &options, &mut map);
    let node = map.layer(handle).expect("node");
    assert!(!node.visible);
    assert_eq!(node.opacity, 0.0);
    assert_eq!(recorder.update_count(), 1);
}

#[test]
fn types_without_update_hook_drop_structural_changes() {
    let recorder = RecordingType::tiled();
    let mut map = MemoryMap::new();
    let mut sync = synchronizer(&recorder);
    let old = LayerOptions::new("parcels", "vector");
    let handle = sync.mount(&old, &mut map).expect("mounted");
    let source = map.source(handle).expect("source").id;

    sync.update(&old.clone().with_url("https://example.test/b.json"), &old, &mut map);
    assert_eq!(map.source_node(source).map(|n| n.revision), Some(0));
}

#[test]
fn reconcile_mounts_then_updates_against_previous_options() {
    let recorder = RecordingType::tiled();
    let mut map = MemoryMap::new();
    let mut sync = synchronizer(&recorder);

    let first = LayerOptions::new("roads", "wms");
    sync.reconcile(&first, &mut map);
    assert!(sync.is_mounted());

    sync.reconcile(&first.clone().with_loading(true), &mut map);
    assert_eq!(recorder.update_count(), 0);

    let second = first.clone().with_url("https://example.test/wms");
    sync.reconcile(&second, &mut map);
    sync.reconcile(&second, &mut map);
    let updates = recorder.updates.borrow();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0.url.as_deref(), Some("https://example.test/wms"));
    assert_eq!(updates[0].1.url, None);
}

#[test]
fn group_skips_unknown_children() {
    let recorder = RecordingType::tiled();
    let mut map = MemoryMap::new();
    let mut sync = synchronizer(&recorder);

    let group = LayerOptions::group(
        "g",
        vec![
            LayerOptions::new("a", "wms"),
            LayerOptions::new("b", "unknown"),
        ],
    );
    let handle = sync.mount(&group, &mut map).expect("group");

    let node = map.layer(handle).expect("node");
    assert_eq!(node.id, Some(LayerId::new("g")));
    let LayerNodeKind::Group { children } = &node.kind else {
        panic!("expected group node");
    };
    assert_eq!(children.len(), 1);
    assert_eq!(map.layer_id(children[0]), Some(LayerId::new("g#a")));

    let tracked: Vec<LayerId> = sync.tracked_sources().into_iter().map(|(id, _, _)| id).collect();
    assert_eq!(tracked, vec![LayerId::new("g#a")]);
}

#[test]
fn group_children_use_name_for_composite_ids() {
    let recorder = RecordingType::tiled();
    let mut map = MemoryMap::new();
    let mut sync = synchronizer(&recorder);

    let group = LayerOptions::group(
        "base",
        vec![
            LayerOptions::new("1", "xyz").with_name("streets"),
            LayerOptions::new("2", "image").with_name("ortho"),
        ],
    );
    sync.mount(&group, &mut map);

    let mut tracked: Vec<(LayerId, SourceKind)> = sync
        .tracked_sources()
        .into_iter()
        .map(|(id, _, kind)| (id, kind))
        .collect();
    tracked.sort();
    assert_eq!(
        tracked,
        vec![
            (LayerId::new("base#ortho"), SourceKind::Image),
            (LayerId::new("base#streets"), SourceKind::Tiled),
        ]
    );
}

#[test]
fn swipe_change_forces_one_repaint() {
    let recorder = RecordingType::tiled();
    let mut map = MemoryMap::new();
    let mut sync = synchronizer(&recorder);
    sync.mount(&LayerOptions::new("roads", "wms"), &mut map);

    sync.set_swipe(Some(50.0), &mut map);
    sync.set_swipe(Some(50.0), &mut map);
    assert_eq!(map.render_count(), 1);
    sync.set_swipe(None, &mut map);
    assert_eq!(map.render_count(), 2);
    assert_eq!(sync.swipe(), None);
}

#[test]
fn paint_hooks_clip_only_the_owned_layer() {
    let recorder = RecordingType::tiled();
    let mut map = MemoryMap::new();
    let mut sync = synchronizer(&recorder);
    let mut other = synchronizer(&recorder);
    let handle = sync.mount(&LayerOptions::new("roads", "wms"), &mut map).expect("roads");
    let foreign = other.mount(&LayerOptions::new("base", "xyz"), &mut map).expect("base");
    sync.set_swipe(Some(50.0), &mut map);

    let mut canvas = RecordingCanvas::new(800.0, 600.0);
    sync.pre_paint(foreign, &mut canvas);
    sync.post_paint(foreign, &mut canvas);
    assert!(canvas.ops().is_empty());

    sync.pre_paint(handle, &mut canvas);
    assert_eq!(canvas.depth(), 1);
    sync.post_paint(handle, &mut canvas);
    assert_eq!(canvas.depth(), 0);
    assert_eq!(
        canvas.clips(),
        vec![ClipRect {
            x: 0.0,
            y: 0.0,
            width: 400.0,
            height: 600.0
        }]
    );
}

#[test]
fn overlay_comes_from_type_render_hook_while_mounted() {
    let registry = Rc::new(LayerRegistry::with_defaults());
    let mut sync = LayerSynchronizer::new(registry, SyncConfig::new("EPSG:4326"));
    let mut map = MemoryMap::new();
    let options = LayerOptions::new("parcels", "vector").with_name("Parcels");

    assert_eq!(sync.overlay(&options, &map), None);
    sync.mount(&options, &mut map);
    let overlay = sync.overlay(&options, &map).expect("overlay");
    assert_eq!(overlay.kind, "legend");

    sync.unmount(Some(&mut map));
    assert_eq!(sync.overlay(&options, &map), None);
}

#[test]
fn configured_projection_reaches_the_source() {
    let registry = Rc::new(LayerRegistry::with_defaults());
    let mut sync = LayerSynchronizer::new(registry, SyncConfig::new("EPSG:4326"));
    let mut map = MemoryMap::new();
    let handle = sync
        .mount(&LayerOptions::new("roads", "tile"), &mut map)
        .expect("mounted");
    let source = map.source(handle).expect("source").id;
    assert_eq!(
        map.source_node(source).map(|n| n.desc.projection.clone()),
        Some("EPSG:4326".to_string())
    );
}
