use nifgraph::blocks::{
    BSFadeNode, BSXFlags, ExtraDataBase, FloatKey, FloatKeyGroup, KeyType, NiAlphaController, NiBSplineBasisData,
    NiBSplineCompFloatInterpolator, NiBSplineData, NiFloatData, NiFloatInterpolator,
    NiMultiTargetTransformController, NiNode, NiStringExtraData, NiTransformController,
};
use nifgraph::version::{pack, V10_1_0_0};
use nifgraph::{
    AvObject, Block, BlockPtr, BlockRef, BlockRegistry, Controller, Diagnostic, ExtraData, LoadOptions, NiVersion,
    NifError, NifFile, SaveOptions, UnknownBlock, NIF_NONE,
};
use tempfile::NamedTempFile;

// ── Fixtures ─────────────────────────────────────────────────────────────────

fn node(file: &mut NifFile, name: &str, children: &[u32]) -> NiNode {
    let mut node = NiNode::default();
    node.av.net.name = file.intern(name);
    node.children = children.iter().copied().collect();
    node
}

/// ```text
/// 0 BSFadeNode "Scene Root"  children [1, 2]  extra [3]
/// 1 NiNode "Bip01"           controller 4
/// 2 NiNode "Leaf"            controller 7
/// 3 BSXFlags
/// 4 NiTransformController    target → 1, interpolator 5
/// 5 NiFloatInterpolator      data 6
/// 6 NiFloatData
/// 7 NiMultiTargetTransformController  target → 2, extra targets → [1]
/// ```
fn scene(version: NiVersion) -> NifFile {
    let mut file = NifFile::new(version);

    let mut root = BSFadeNode { node: node(&mut file, "Scene Root", &[1, 2]) };
    root.node.av.net.extra_data = [3].into_iter().collect();
    file.add(root);

    let mut bip = node(&mut file, "Bip01", &[]);
    bip.av.net.controller = BlockRef::new(4);
    file.add(bip);

    let mut leaf = node(&mut file, "Leaf", &[]);
    leaf.av.net.controller = BlockRef::new(7);
    leaf.av.transform.translation = [1.0, 2.0, 3.0];
    file.add(leaf);

    let bsx = BSXFlags { base: ExtraDataBase { name: file.intern("BSX") }, flags: 0xC2 };
    file.add(bsx);

    let mut ctrl = NiTransformController::default();
    ctrl.base.controller.target = BlockPtr::new(1);
    ctrl.base.interpolator = BlockRef::new(5);
    file.add(ctrl);

    file.add(NiFloatInterpolator { value: 0.5, data: BlockRef::new(6) });

    let key = |time: f32, value: f32| FloatKey { time, value, forward: 0.1, backward: -0.1, tbc: [0.0; 3] };
    file.add(NiFloatData {
        data: FloatKeyGroup { interpolation: KeyType::QUADRATIC, keys: vec![key(0.0, 1.0), key(1.0, 0.0)] },
    });

    let mut multi = NiMultiTargetTransformController::default();
    multi.controller.target = BlockPtr::new(2);
    multi.extra_targets = [1].into_iter().collect();
    file.add(multi);

    file.roots_mut().push(0);
    file
}

fn save(file: &mut NifFile) -> Vec<u8> {
    file.to_bytes(&SaveOptions::default()).unwrap()
}

fn name_of(file: &NifFile, index: u32) -> &str {
    let av = file.get::<dyn AvObject>(index).unwrap();
    file.string(av.av().net.name).unwrap()
}

fn assert_refs_in_range(file: &NifFile) {
    let len = file.len() as u32;
    for (i, block) in file.blocks().iter().enumerate() {
        for target in block.child_indices().into_iter().chain(block.pointer_indices()) {
            assert!(target < len, "block {i} refers to {target} of {len}");
        }
    }
    for root in file.roots().indices() {
        assert!(root < len, "root {root} of {len}");
    }
}

// ── Round trip ───────────────────────────────────────────────────────────────

#[test]
fn test_round_trip_is_byte_exact_across_versions() {
    for version in [
        NiVersion::SKYRIM_SE,
        NiVersion::SKYRIM,
        NiVersion::FALLOUT3,
        NiVersion::FALLOUT4,
        NiVersion::OBLIVION,
        NiVersion::GAMEBRYO_20_1,
        NiVersion::NETIMMERSE_10,
    ] {
        let bytes = save(&mut scene(version));
        let mut loaded = NifFile::load(bytes.as_slice()).unwrap();
        assert_eq!(loaded.version(), version);
        assert_eq!(loaded.len(), 8);
        assert!(loaded.diagnostics().is_empty());
        assert_eq!(save(&mut loaded), bytes, "round trip differs for {version}");
    }
}

#[test]
fn test_loaded_values_match_written_values() {
    let bytes = save(&mut scene(NiVersion::SKYRIM_SE));
    let file = NifFile::load(bytes.as_slice()).unwrap();

    assert_eq!(name_of(&file, 0), "Scene Root");
    assert_eq!(name_of(&file, 2), "Leaf");
    assert_eq!(file.get::<NiNode>(2).unwrap().av.transform.translation, [1.0, 2.0, 3.0]);

    let bsx = file.get::<BSXFlags>(3).unwrap();
    assert_eq!(bsx.flags, 0xC2);
    assert_eq!(file.string(bsx.base.name), Some("BSX"));

    let data = file.get::<NiFloatData>(6).unwrap();
    assert_eq!(data.data.interpolation, KeyType::QUADRATIC);
    assert_eq!(data.data.keys[1].backward, -0.1);

    assert_eq!(file.header().block_types, vec!["BSFadeNode", "NiNode", "BSXFlags", "NiTransformController",
        "NiFloatInterpolator", "NiFloatData", "NiMultiTargetTransformController"]);
}

#[test]
fn test_inline_strings_before_string_table() {
    let mut file = scene(NiVersion::NETIMMERSE_10);
    let bytes = save(&mut file);
    assert!(bytes.starts_with(b"NetImmerse File Format, Version 10.0.1.0\n"));
    // Inline form: u32 length then the characters.
    let needle = [&10u32.to_le_bytes()[..], b"Scene Root"].concat();
    assert!(bytes.windows(needle.len()).any(|w| w == needle.as_slice()));

    let loaded = NifFile::load(bytes.as_slice()).unwrap();
    assert_eq!(name_of(&loaded, 1), "Bip01");
}

#[test]
fn test_file_helpers_round_trip_through_disk() {
    let temp_file = NamedTempFile::new().unwrap();
    let mut file = scene(NiVersion::SKYRIM_SE);
    file.save_file(temp_file.path(), &SaveOptions::default()).unwrap();

    let mut loaded = NifFile::open(temp_file.path()).unwrap();
    assert_eq!(std::fs::read(temp_file.path()).unwrap(), save(&mut loaded));
}

#[test]
fn test_group_table_round_trips() {
    for version in [NiVersion::SKYRIM_SE, NiVersion::NETIMMERSE_10] {
        let mut file = scene(version);
        file.header_mut().groups = vec![3, 0, 0xDEAD_BEEF];
        let bytes = save(&mut file);

        let mut loaded = NifFile::load(bytes.as_slice()).unwrap();
        assert_eq!(loaded.header().groups, vec![3, 0, 0xDEAD_BEEF]);
        assert_eq!(save(&mut loaded), bytes);
    }
}

// ── Version gates ────────────────────────────────────────────────────────────

#[test]
fn test_alpha_controller_data_is_version_gated() {
    let build = |version: NiVersion| {
        let mut file = NifFile::new(version);
        let mut ctrl = NiAlphaController::default();
        ctrl.data = BlockRef::new(1);
        file.add(ctrl);
        file.add(NiFloatData::default());
        file.roots_mut().push(0);
        file
    };

    let old = NiVersion::new(V10_1_0_0, 0, 0);
    let bytes = save(&mut build(old));
    let loaded = NifFile::load(bytes.as_slice()).unwrap();
    let ctrl = loaded.get::<NiAlphaController>(0).unwrap();
    assert!(loaded.resolve(&ctrl.data).is_some());

    let bytes = save(&mut build(NiVersion::SKYRIM));
    let loaded = NifFile::load(bytes.as_slice()).unwrap();
    assert!(loaded.get::<NiAlphaController>(0).unwrap().data.is_none());
}

#[test]
fn test_short_array_uses_u16_count() {
    let mut file = scene(NiVersion::SKYRIM_SE);
    save(&mut file);
    // next, flags, frequency, phase, start, stop, target; then u16 count + one i32.
    let expected = 4 + 2 + 4 * 4 + 4 + 2 + 4;
    assert_eq!(file.header().block_sizes[7], expected);
}

// ── Unknown types ────────────────────────────────────────────────────────────

#[test]
fn test_unknown_block_survives_round_trip() {
    let mut file = scene(NiVersion::SKYRIM_SE);
    let payload: Vec<u8> = (0u8..37).collect();
    let index = file.add(UnknownBlock::with_data("NiFutureThing", payload.clone()));
    let bytes = save(&mut file);

    let mut loaded = NifFile::load(bytes.as_slice()).unwrap();
    assert_eq!(
        loaded.diagnostics(),
        &[Diagnostic::UnknownBlockType { index, name: "NiFutureThing".into() }]
    );
    let unknown = loaded.get::<UnknownBlock>(index).unwrap();
    assert_eq!(unknown.block_name(), "NiFutureThing");
    assert_eq!(unknown.data(), payload.as_slice());
    assert_eq!(save(&mut loaded), bytes);
}

#[test]
fn test_unknown_block_without_size_table_is_fatal() {
    let mut file = scene(NiVersion::GAMEBRYO_20_1);
    let index = file.add(UnknownBlock::with_data("NiFutureThing", vec![1, 2, 3, 4]));
    let bytes = save(&mut file);

    match NifFile::load(bytes.as_slice()) {
        Err(NifError::UnknownBlockType { index: i, name }) => {
            assert_eq!(i, index);
            assert_eq!(name, "NiFutureThing");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_short_schema_skips_rest_of_declared_size() {
    let mut file = scene(NiVersion::SKYRIM_SE);
    let index = file.add(UnknownBlock::with_data("NiFutureThing", vec![7; 37]));
    let bytes = save(&mut file);

    let mut registry = BlockRegistry::default();
    registry.register_ctor("NiFutureThing", || -> Box<dyn Block> { Box::new(NiBSplineBasisData::default()) });
    let loaded = NifFile::load_with(bytes.as_slice(), &registry, &LoadOptions::default()).unwrap();

    assert_eq!(loaded.diagnostics(), &[Diagnostic::BlockSizeMismatch { index, declared: 37, consumed: 4 }]);
    assert_eq!(loaded.roots().indices().collect::<Vec<_>>(), vec![0]);
}

#[test]
fn test_schema_reading_past_declared_size_is_fatal() {
    let mut file = scene(NiVersion::SKYRIM_SE);
    file.add(UnknownBlock::with_data("NiFutureThing", vec![7; 2]));
    let bytes = save(&mut file);

    let mut registry = BlockRegistry::default();
    registry.register_ctor("NiFutureThing", || -> Box<dyn Block> { Box::new(NiBSplineBasisData::default()) });
    let result = NifFile::load_with(bytes.as_slice(), &registry, &LoadOptions::default());
    assert!(matches!(result, Err(NifError::BlockOverrun { declared: 2, consumed: 4, .. })));
}

// ── Malformed input ──────────────────────────────────────────────────────────

#[test]
fn test_garbage_is_malformed_header() {
    let result = NifFile::load(&b"PK\x03\x04 definitely not a nif\n\0\0\0\0"[..]);
    assert!(matches!(result, Err(NifError::MalformedHeader { offset: 0, .. })));
}

#[test]
fn test_unsupported_version_is_malformed_header() {
    let mut bytes = b"Gamebryo File Format, Version 4.0.0.2\n".to_vec();
    bytes.extend_from_slice(&pack(4, 0, 0, 2).to_le_bytes());
    assert!(matches!(NifFile::load(bytes.as_slice()), Err(NifError::MalformedHeader { .. })));
}

#[test]
fn test_truncated_block_data_is_fatal() {
    let bytes = save(&mut scene(NiVersion::SKYRIM_SE));
    for cut in [10, 40, bytes.len() / 2, bytes.len() - 1] {
        let result = NifFile::load(&bytes[..cut]);
        assert!(
            matches!(result, Err(NifError::TruncatedStream { .. }) | Err(NifError::MalformedHeader { .. })),
            "cut at {cut}: {result:?}"
        );
    }
    let result = NifFile::load(&bytes[..bytes.len() - 1]);
    assert!(matches!(result, Err(NifError::TruncatedStream { .. })));
}

#[test]
fn test_huge_string_count_is_truncation() {
    let mut bytes = save(&mut NifFile::new(NiVersion::SKYRIM_SE));
    // Empty file tail: string count, max length, group count, root count.
    let at = bytes.len() - 16;
    bytes[at..at + 4].copy_from_slice(&u32::MAX.to_le_bytes());
    bytes.truncate(at + 8);

    let result = NifFile::load(bytes.as_slice());
    assert!(matches!(result, Err(NifError::TruncatedStream { .. })), "{result:?}");
}

// ── Typed access ─────────────────────────────────────────────────────────────

#[test]
fn test_capability_views() {
    let file = scene(NiVersion::SKYRIM_SE);

    assert!(file.get::<BSFadeNode>(0).is_some());
    assert!(file.get::<NiNode>(0).is_none());
    assert!(file.get::<dyn AvObject>(0).is_some());
    assert!(file.get::<dyn Controller>(0).is_none());
    assert!(file.get::<dyn ExtraData>(3).is_some());
    assert!(file.get::<dyn Controller>(4).is_some());
    assert!(file.get::<dyn Block>(42).is_none());

    let root = file.get::<BSFadeNode>(0).unwrap();
    let children: Vec<&dyn AvObject> =
        root.node.children.links().iter().filter_map(|link| file.resolve(link)).collect();
    assert_eq!(children.len(), 2);

    // A link declared against a family fails soft on a block of another kind.
    let wrong: BlockRef<dyn Controller> = BlockRef::new(3);
    assert!(file.resolve(&wrong).is_none());
    let none: BlockRef<dyn Controller> = BlockRef::NONE;
    assert!(file.resolve(&none).is_none());

    let ctrl = file.get::<dyn Controller>(7).unwrap();
    assert_eq!(ctrl.controller().target.index(), 2);
}

#[test]
fn test_graph_queries() {
    let file = scene(NiVersion::SKYRIM_SE);
    assert_eq!(file.child_indices(0), vec![3, 1, 2]);
    assert_eq!(file.parents_of(1), vec![0]);
    assert_eq!(file.parents_of(6), vec![5]);
    assert_eq!(file.reachable_blocks(), (0..8).collect::<Vec<_>>());
    assert_eq!(file.get::<dyn Block>(7).unwrap().pointer_indices(), vec![2, 1]);
}

// ── Mutation ─────────────────────────────────────────────────────────────────

#[test]
fn test_delete_first_block_shifts_the_rest() {
    let mut file = NifFile::new(NiVersion::SKYRIM_SE);
    let a = node(&mut file, "A", &[1]);
    let b = node(&mut file, "B", &[]);
    file.add(a);
    file.add(b);

    file.delete_block(0).unwrap();

    assert_eq!(file.len(), 1);
    assert_eq!(name_of(&file, 0), "B");
    assert!(file.get::<NiNode>(0).unwrap().children.is_empty());
}

#[test]
fn test_delete_clears_slots_and_shifts_later_refs() {
    let mut file = scene(NiVersion::SKYRIM_SE);
    file.delete_block(1).unwrap();

    let root = file.get::<BSFadeNode>(0).unwrap();
    assert_eq!(root.node.children.capacity(), 2);
    assert_eq!(root.node.children.links()[0].index(), NIF_NONE);
    assert_eq!(root.node.children.indices().collect::<Vec<_>>(), vec![1]);

    // The controller that targeted Bip01 lost its target; the multi-target
    // controller (now 6) lost its extra target but kept its slot.
    let ctrl = file.get::<NiTransformController>(3).unwrap();
    assert!(ctrl.base.controller.target.is_none());
    assert_eq!(ctrl.base.interpolator.index(), 4);
    let multi = file.get::<NiMultiTargetTransformController>(6).unwrap();
    assert_eq!(multi.extra_targets.capacity(), 1);
    assert!(multi.extra_targets.is_empty());
    assert_eq!(multi.controller.target.index(), 1);
    assert_refs_in_range(&file);

    let bytes = save(&mut file);
    let mut loaded = NifFile::load(bytes.as_slice()).unwrap();
    assert_eq!(save(&mut loaded), bytes);
}

#[test]
fn test_delete_out_of_range_leaves_file_untouched() {
    let mut file = scene(NiVersion::SKYRIM_SE);
    let before = save(&mut file);
    assert!(matches!(file.delete_blocks(&[2, 8]), Err(NifError::BlockIndexOutOfRange { index: 8, len: 8 })));
    assert_eq!(save(&mut file), before);
}

#[test]
fn test_delete_drops_unused_type_names_on_save() {
    let mut file = scene(NiVersion::SKYRIM_SE);
    file.delete_blocks(&[5, 6]).unwrap();
    save(&mut file);
    let types = &file.header().block_types;
    assert!(!types.iter().any(|t| t == "NiFloatData" || t == "NiFloatInterpolator"));
    assert_eq!(file.header().block_type_indices.len(), 6);
}

#[test]
fn test_header_tables_refresh_on_save() {
    let bytes = save(&mut scene(NiVersion::SKYRIM_SE));
    let mut file = NifFile::load(bytes.as_slice()).unwrap();
    file.delete_blocks(&[3]).unwrap();
    file.add(NiStringExtraData::default());

    // Still the tables that were read.
    assert_eq!(file.header().block_count, 8);
    assert_eq!(file.header().block_type(3), Some("BSXFlags"));

    save(&mut file);
    assert_eq!(file.header().block_count, 8);
    assert_eq!(file.header().block_type(3), Some("NiTransformController"));
    assert_eq!(file.header().block_type(7), Some("NiStringExtraData"));
    assert!(!file.header().block_types.iter().any(|t| t == "BSXFlags"));
    assert_eq!(file.header().block_sizes.len(), 8);
}

#[test]
fn test_duplicate_copies_owned_subgraph() {
    let mut file = scene(NiVersion::SKYRIM_SE);
    let copy = file.duplicate_block(0).unwrap();
    assert_eq!(copy, 8);
    assert_eq!(file.len(), 16);
    assert_eq!(name_of(&file, copy), "Scene Root");

    // Pre-order: root, its extra data, then each child subtree.
    let names: Vec<&str> = file.blocks()[8..].iter().map(|b| b.block_name()).collect();
    assert_eq!(names, vec!["BSFadeNode", "BSXFlags", "NiNode", "NiTransformController", "NiFloatInterpolator",
        "NiFloatData", "NiNode", "NiMultiTargetTransformController"]);

    // Every reference inside the copy stays inside the copy.
    for block in &file.blocks()[8..] {
        for target in block.child_indices().into_iter().chain(block.pointer_indices()) {
            assert!(target >= 8, "{} escapes to {target}", block.block_name());
        }
    }
    // The original is untouched and the copy is not attached anywhere.
    assert_eq!(file.child_indices(0), vec![3, 1, 2]);
    assert!(file.parents_of(copy).is_empty());
    assert_eq!(file.roots().indices().collect::<Vec<_>>(), vec![0]);
}

#[test]
fn test_duplicate_keeps_external_pointers() {
    let mut file = scene(NiVersion::SKYRIM_SE);
    let copy = file.duplicate_block(2).unwrap();
    assert_eq!(file.len(), 10);

    let leaf = file.get::<NiNode>(copy).unwrap();
    assert_eq!(leaf.av.net.controller.index(), copy + 1);

    let multi = file.get::<NiMultiTargetTransformController>(copy + 1).unwrap();
    assert_eq!(multi.controller.target.index(), copy);
    assert_eq!(multi.extra_targets.indices().collect::<Vec<_>>(), vec![1]);
    // Strings are shared, not copied.
    assert_eq!(leaf.av.net.name, file.get::<NiNode>(2).unwrap().av.net.name);
}

#[test]
fn test_move_block_follows_references() {
    let mut file = scene(NiVersion::SKYRIM_SE);
    file.move_block(6, 0).unwrap();

    assert!(file.get::<NiFloatData>(0).is_some());
    assert_eq!(file.roots().indices().collect::<Vec<_>>(), vec![1]);
    let interp = file.get::<NiFloatInterpolator>(6).unwrap();
    assert!(file.resolve(&interp.data).is_some());
    assert_eq!(name_of(&file, 2), "Bip01");
    assert_refs_in_range(&file);

    file.move_block(0, 7).unwrap();
    assert!(file.get::<NiFloatData>(7).is_some());
    assert_eq!(file.roots().indices().collect::<Vec<_>>(), vec![0]);
}

#[test]
fn test_reorder_reverses_and_reloads() {
    let mut file = scene(NiVersion::SKYRIM_SE);
    let order: Vec<u32> = (0..8).rev().collect();
    file.reorder_blocks(&order).unwrap();

    assert!(file.get::<BSFadeNode>(7).is_some());
    assert_eq!(file.roots().indices().collect::<Vec<_>>(), vec![7]);
    assert_eq!(file.child_indices(7), vec![4, 6, 5]);

    let bytes = save(&mut file);
    let loaded = NifFile::load(bytes.as_slice()).unwrap();
    assert_eq!(name_of(&loaded, 6), "Bip01");

    assert!(matches!(file.reorder_blocks(&[0, 1]), Err(NifError::InvalidOrder { len: 8 })));
}

#[test]
fn test_prune_removes_orphans_once() {
    let mut file = scene(NiVersion::SKYRIM_SE);
    let orphan = node(&mut file, "Orphan", &[]);
    let orphan = file.add(orphan);
    let child = file.add(NiStringExtraData::default());
    file.get_mut::<NiNode>(orphan).unwrap().av.net.extra_data.push(child);

    assert_eq!(file.prune_unreachable(), 2);
    let once = save(&mut file);
    assert_eq!(file.prune_unreachable(), 0);
    assert_eq!(save(&mut file), once);
    assert_eq!(file.len(), 8);
}

#[test]
fn test_prune_without_roots_is_a_no_op() {
    let mut file = scene(NiVersion::SKYRIM_SE);
    file.roots_mut().clean_none();
    file.roots_mut().remove_index(0);
    assert_eq!(file.prune_unreachable(), 0);
    assert_eq!(file.len(), 8);
}

#[test]
fn test_save_options_prune_and_compact() {
    let mut file = scene(NiVersion::SKYRIM_SE);
    file.add(NiBSplineData { float_points: vec![0.0, 1.0], short_points: vec![-1, 1] });
    file.strings_mut().push("unused".into());

    let options = SaveOptions { prune_unreachable: true, compact_strings: true };
    let bytes = file.to_bytes(&options).unwrap();
    assert_eq!(file.len(), 8);
    assert!(!file.strings().iter().any(|s| s == "unused"));

    let loaded = NifFile::load(bytes.as_slice()).unwrap();
    assert_eq!(loaded.len(), 8);
}

#[test]
fn test_compaction_merges_equal_strings() {
    let mut file = scene(NiVersion::SKYRIM_SE);
    let dup = file.strings_mut().push("Bip01".into());
    file.get_mut::<NiNode>(2).unwrap().av.net.name = dup;
    file.strings_mut().push("stale".into());

    let before: Vec<String> = (0..file.len() as u32).filter_map(|i| {
        file.get::<dyn AvObject>(i).map(|av| file.string(av.av().net.name).unwrap_or_default().to_owned())
    }).collect();

    file.compact_strings();

    let after: Vec<String> = (0..file.len() as u32).filter_map(|i| {
        file.get::<dyn AvObject>(i).map(|av| file.string(av.av().net.name).unwrap_or_default().to_owned())
    }).collect();
    assert_eq!(before, after);
    assert!(!file.strings().has_duplicates());
    assert_eq!(file.strings().len(), 3);
    assert_eq!(
        file.get::<NiNode>(1).unwrap().av.net.name,
        file.get::<NiNode>(2).unwrap().av.net.name
    );
}

#[test]
fn test_validate_clears_dangling_references() {
    let mut file = scene(NiVersion::SKYRIM_SE);
    file.get_mut::<NiNode>(1).unwrap().children.push(99);
    file.get_mut::<BSXFlags>(3).unwrap().base.name = nifgraph::StringRef::new(50);
    file.roots_mut().push(12);

    let found = file.validate();
    assert_eq!(found, vec![
        Diagnostic::DanglingReference { block: Some(1), target: 99 },
        Diagnostic::DanglingString { block: 3, index: 50 },
        Diagnostic::DanglingReference { block: None, target: 12 },
    ]);
    assert!(file.validate().is_empty());
    assert_eq!(file.get::<NiNode>(1).unwrap().children.capacity(), 1);
}

#[test]
fn test_load_can_repair_references() {
    let mut file = scene(NiVersion::SKYRIM_SE);
    file.get_mut::<NiFloatInterpolator>(5).unwrap().data = BlockRef::new(40);
    let bytes = save(&mut file);

    let verbatim = NifFile::load(bytes.as_slice()).unwrap();
    assert_eq!(verbatim.get::<NiFloatInterpolator>(5).unwrap().data.index(), 40);

    let options = LoadOptions { repair_references: true };
    let repaired = NifFile::load_with(bytes.as_slice(), &BlockRegistry::default(), &options).unwrap();
    assert!(repaired.get::<NiFloatInterpolator>(5).unwrap().data.is_none());
    assert_eq!(repaired.diagnostics(), &[Diagnostic::DanglingReference { block: Some(5), target: 40 }]);
}

#[test]
fn test_spline_blocks_round_trip() {
    let mut file = NifFile::new(NiVersion::FALLOUT4);
    let interp = NiBSplineCompFloatInterpolator {
        start: 0.0,
        stop: 2.5,
        spline_data: BlockRef::new(1),
        basis_data: BlockRef::new(2),
        base: 1.0,
        offset: 0,
        bias: 0.5,
        multiplier: 2.0,
    };
    file.add(interp);
    file.add(NiBSplineData { float_points: vec![0.25; 5], short_points: (0..9).collect() });
    file.add(NiBSplineBasisData { num_control_points: 9 });
    file.roots_mut().push(0);

    let bytes = save(&mut file);
    let mut loaded = NifFile::load(bytes.as_slice()).unwrap();
    assert_eq!(loaded.get::<NiBSplineData>(1).unwrap().short_points, (0..9).collect::<Vec<i16>>());
    let interp = loaded.get::<NiBSplineCompFloatInterpolator>(0).unwrap();
    assert_eq!(loaded.resolve(&interp.basis_data).unwrap().num_control_points, 9);
    assert_eq!(save(&mut loaded), bytes);
}
