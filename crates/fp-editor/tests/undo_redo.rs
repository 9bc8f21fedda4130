//! Integration tests: undo/redo history driven through the editor.
//!
//! Every edit runs against a real `SvgScene`, so these also check that
//! undo puts the markup back, not just the registry.

use fp_core::{Color, DeviceId, FloorplanError, IndicatorIndex, Snapshot};
use fp_editor::{Editor, EditorConfig, EditorEvent, InputEvent};
use fp_render::SvgScene;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::num::NonZeroU32;
use std::rc::Rc;

const PLANT_ROOM: &str = include_str!("fixtures/plant_room.svg");

fn p(n: u8) -> IndicatorIndex {
    IndicatorIndex::new(n).unwrap()
}

fn boiler() -> DeviceId {
    DeviceId::intern("12")
}

fn editor() -> Editor<SvgScene> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut editor = Editor::new(SvgScene::new());
    editor.load_document(PLANT_ROOM).expect("fixture should load");
    editor
}

fn tile_y(editor: &Editor<SvgScene>, tile: &str) -> Option<String> {
    let doc = editor.scene().document()?;
    let idx = doc.find_by_id(tile)?;
    doc.attr(idx, "y").map(str::to_string)
}

fn position(editor: &Editor<SvgScene>, id: DeviceId) -> (f32, f32) {
    let device = editor.device(id).expect("device should exist");
    (device.x, device.y)
}

// ─── Basic undo/redo ────────────────────────────────────────────────────

#[test]
fn fresh_document_has_no_history() {
    let editor = editor();
    assert!(!editor.can_undo());
    assert!(!editor.can_redo());
}

#[test]
fn undo_restores_previous_state() {
    let mut editor = editor();
    assert!(editor.set_position(boiler(), 300.0, 200.0));
    assert_eq!(position(&editor, boiler()), (300.0, 200.0));

    assert!(editor.undo());
    assert_eq!(position(&editor, boiler()), (120.0, 80.0));
    assert!(editor.can_redo());
}

#[test]
fn redo_cancels_undo() {
    let mut editor = editor();
    editor.set_position(boiler(), 300.0, 200.0);
    let after = editor.capture_state();

    editor.undo();
    assert!(editor.redo());
    assert_eq!(editor.capture_state(), after);
    assert!(!editor.can_redo());
}

#[test]
fn undoing_everything_returns_to_the_loaded_state() {
    let mut editor = editor();
    let initial = editor.capture_state();

    editor.set_name(boiler(), "Boiler");
    editor.set_scale(boiler(), 3.0);
    editor.set_indicator_color(boiler(), p(1), Color::rgba(0.0, 0.0, 1.0, 1.0));
    editor.create_device("99", "Chiller", 500.0, 100.0, 2).unwrap();
    editor.delete_device(DeviceId::intern("7"));

    let mut steps = 0;
    while editor.undo() {
        steps += 1;
    }
    assert_eq!(steps, 5);
    assert_eq!(editor.capture_state(), initial);
}

#[test]
fn new_edit_clears_redo() {
    let mut editor = editor();
    editor.set_position(boiler(), 300.0, 200.0);
    editor.undo();
    assert!(editor.can_redo());

    editor.set_name(boiler(), "Boiler");
    assert!(!editor.can_redo());
    assert!(!editor.redo());
}

#[test]
fn undo_and_redo_on_empty_stacks_do_nothing() {
    let mut editor = editor();
    let before = editor.capture_state();
    assert!(!editor.undo());
    assert!(!editor.redo());
    assert_eq!(editor.capture_state(), before);
}

#[test]
fn indicator_edits_unwind_to_the_loaded_state() {
    let mut editor = editor();
    let initial = editor.capture_state();
    let renamed = DeviceId::intern("55");

    assert_eq!(editor.reorder_indicators(boiler(), &[p(1), p(2), p(3)]), Ok(true));
    assert_eq!(
        editor.set_indicator_membership(boiler(), &[p(2), p(5), p(1)]),
        Ok(true)
    );
    assert_eq!(editor.set_device_id(boiler(), "55"), Ok(true));
    assert!(editor.set_indicator_blink(renamed, p(1), true));
    assert!(editor.set_indicator_query(renamed, p(2), NonZeroU32::new(4)));
    assert!(editor.set_indicator_off_color(renamed, p(5), Color::from_hex("#111111").unwrap()));
    assert!(editor.move_indicator_up(renamed, p(1)));
    assert_eq!(editor.history().undo_depth(), 7);

    for _ in 0..7 {
        assert!(editor.undo());
    }
    assert_eq!(editor.capture_state(), initial);

    assert_eq!(tile_y(&editor, "dev_12_p3").as_deref(), Some("0"));
    assert_eq!(tile_y(&editor, "dev_12_p1").as_deref(), Some("35"));
    assert_eq!(tile_y(&editor, "dev_12_p2").as_deref(), Some("70"));
    let doc = editor.scene().document().unwrap();
    assert!(doc.find_by_id("device_55").is_none());
    for n in 1..=8 {
        assert!(doc.find_by_id(&format!("dev_55_p{n}")).is_none());
    }
}

#[test]
fn undo_of_create_restores_the_previous_selection() {
    let mut editor = editor();
    editor.select(boiler());
    let id = editor.create_device("99", "Chiller", 0.0, 0.0, 2).unwrap();
    assert_eq!(editor.selected_id(), Some(id));

    assert!(editor.undo());
    assert_eq!(editor.selected_id(), Some(boiler()));
    assert!(editor.device(id).is_none());

    assert!(editor.redo());
    assert_eq!(editor.selected_id(), Some(id));
}

#[test]
fn undo_works_after_loading_a_tileless_group() {
    let mut editor = Editor::new(SvgScene::new());
    editor
        .load_document(
            r##"<svg viewBox="0 0 400 300"><g id="device_3" transform="translate(10,20)"><title>Empty</title></g><g id="device_4" transform="translate(100,20)"><title>Full</title><rect id="dev_4_p1" x="0" y="0" width="30" height="30" fill="#00ff00"/></g></svg>"##,
        )
        .unwrap();
    let before = editor.capture_state();

    assert!(editor.set_name(DeviceId::intern("4"), "Renamed"));
    assert!(editor.undo());
    assert_eq!(editor.capture_state(), before);
    assert_eq!(
        editor.device(DeviceId::intern("3")).unwrap().visual_order().as_slice(),
        &[p(1)]
    );
    assert!(tile_y(&editor, "dev_3_p1").is_some());
    assert!(editor.redo());
}

// ─── Depth cap ──────────────────────────────────────────────────────────

#[test]
fn history_keeps_only_the_newest_fifty_steps() {
    let mut editor = editor();
    for i in 1..=60 {
        assert!(editor.set_position(boiler(), i as f32, 0.0));
    }
    assert_eq!(editor.history().undo_depth(), 50);

    for _ in 0..50 {
        assert!(editor.undo());
    }
    assert!(!editor.undo());
    // The ten oldest steps were discarded.
    assert_eq!(position(&editor, boiler()), (10.0, 0.0));
}

#[test]
fn configured_depth_is_respected() {
    let config = EditorConfig {
        max_undo_depth: 3,
        ..EditorConfig::default()
    };
    let mut editor = Editor::with_config(SvgScene::new(), config);
    editor.load_document(PLANT_ROOM).unwrap();
    for i in 0..5 {
        editor.set_position(boiler(), i as f32, 0.0);
    }
    assert_eq!(editor.history().undo_depth(), 3);
}

// ─── No-op edits ────────────────────────────────────────────────────────

#[test]
fn no_op_edits_record_nothing() {
    let mut editor = editor();
    assert!(!editor.set_position(boiler(), 120.0, 80.0));
    assert!(!editor.set_name(boiler(), "Boiler & Pump"));
    assert!(!editor.set_scale(boiler(), 1.0));
    assert!(!editor.set_indicator_blink(boiler(), p(3), true));
    assert!(!editor.move_indicator_up(boiler(), p(3)));
    assert!(!editor.set_indicator_count(boiler(), 3));
    assert_eq!(editor.reorder_indicators(boiler(), &[p(3), p(1), p(2)]), Ok(false));
    assert!(!editor.can_undo());
}

#[test]
fn edits_on_missing_devices_record_nothing() {
    let mut editor = editor();
    let ghost = DeviceId::intern("404");
    assert!(!editor.set_position(ghost, 1.0, 1.0));
    assert!(!editor.set_scale(ghost, 2.0));
    assert!(!editor.delete_device(ghost));
    assert!(!editor.set_indicator_color(boiler(), p(8), Color::rgba(1.0, 1.0, 1.0, 1.0)));
    assert!(!editor.can_undo());
}

#[test]
fn selection_is_not_an_undo_step() {
    let mut editor = editor();
    editor.select(boiler());
    editor.deselect();
    assert!(!editor.can_undo());
}

#[test]
fn failed_create_leaves_registry_and_history_alone() {
    let mut editor = editor();
    let before = editor.capture_state();

    let err = editor.create_device("12", "Dup", 0.0, 0.0, 3).unwrap_err();
    assert_eq!(
        err,
        FloorplanError::DuplicateId {
            id: "12".to_string()
        }
    );
    assert_eq!(editor.capture_state(), before);
    assert!(!editor.can_undo());
}

// ─── Batches ────────────────────────────────────────────────────────────

#[test]
fn batch_is_one_step() {
    let mut editor = editor();
    editor.batch("tidy up", |ed| {
        ed.set_position(boiler(), 10.0, 10.0);
        ed.set_scale(boiler(), 2.0);
        ed.set_name(boiler(), "Boiler");
    });
    assert_eq!(editor.history().undo_depth(), 1);
    assert_eq!(editor.history().undo_label(), Some("tidy up"));

    editor.undo();
    let device = editor.device(boiler()).unwrap();
    assert_eq!((device.x, device.y, device.scale()), (120.0, 80.0, 1.0));
    assert_eq!(device.name, "Boiler & Pump");
}

#[test]
fn empty_batch_records_nothing() {
    let mut editor = editor();
    editor.begin_batch("nothing");
    assert!(!editor.end_batch());
    assert!(!editor.can_undo());
}

#[test]
fn undo_closes_an_open_batch() {
    let mut editor = editor();
    editor.begin_batch("open");
    editor.set_position(boiler(), 10.0, 10.0);
    assert!(editor.undo());
    assert_eq!(position(&editor, boiler()), (120.0, 80.0));
    assert!(!editor.history().is_batching());
}

// ─── Gestures ───────────────────────────────────────────────────────────

#[test]
fn drag_is_a_single_step() {
    let mut editor = editor();
    assert!(editor.handle_input(InputEvent::from_pointer_down(130.0, 90.0)));
    editor.handle_input(InputEvent::from_pointer_move(150.0, 110.0));
    editor.handle_input(InputEvent::from_pointer_move(180.0, 140.0));
    // Preview only: the registry has not moved yet.
    assert_eq!(position(&editor, boiler()), (120.0, 80.0));
    editor.handle_input(InputEvent::from_pointer_up(180.0, 140.0));

    assert_eq!(position(&editor, boiler()), (170.0, 130.0));
    assert_eq!(editor.history().undo_depth(), 1);

    editor.undo();
    assert_eq!(position(&editor, boiler()), (120.0, 80.0));
}

#[test]
fn click_without_movement_selects_but_records_nothing() {
    let mut editor = editor();
    editor.handle_input(InputEvent::from_pointer_down(130.0, 90.0));
    editor.handle_input(InputEvent::from_pointer_up(130.0, 90.0));

    assert_eq!(editor.selected_id(), Some(boiler()));
    assert!(!editor.can_undo());
}

#[test]
fn resize_handle_drag_is_a_single_step() {
    let mut editor = editor();
    // Handle of the 3-tile boiler sits at (150, 180) with size 28.
    editor.handle_input(InputEvent::from_pointer_down(160.0, 190.0));
    editor.handle_input(InputEvent::from_pointer_move(160.0, 215.0));
    editor.handle_input(InputEvent::from_pointer_move(160.0, 240.0));
    assert_eq!(editor.device(boiler()).unwrap().scale(), 1.0);
    editor.handle_input(InputEvent::from_pointer_up(160.0, 240.0));

    assert_eq!(editor.device(boiler()).unwrap().scale(), 1.5);
    assert_eq!(editor.history().undo_depth(), 1);
    editor.undo();
    assert_eq!(editor.device(boiler()).unwrap().scale(), 1.0);
}

#[test]
fn cancelled_drag_restores_visuals_without_history() {
    let mut editor = editor();
    editor.handle_input(InputEvent::from_pointer_down(130.0, 90.0));
    editor.handle_input(InputEvent::from_pointer_move(230.0, 190.0));
    editor.cancel_gesture();

    assert!(editor.gesture().is_none());
    assert!(!editor.can_undo());
    let doc = editor.scene().document().unwrap();
    let tile = doc.find_by_id("dev_12_p3").unwrap();
    assert_eq!(doc.attr(tile, "x"), Some("0"));
    assert_eq!(doc.attr(tile, "y"), Some("0"));
}

// ─── Restore ────────────────────────────────────────────────────────────

#[test]
fn undo_of_delete_rebuilds_markup_and_selection() {
    let mut editor = editor();
    editor.select(boiler());
    editor.delete_device(boiler());
    assert_eq!(editor.selected_id(), None);
    assert!(editor.scene().document().unwrap().find_by_id("device_12").is_none());

    editor.undo();
    assert_eq!(editor.selected_id(), Some(boiler()));
    let doc = editor.scene().document().unwrap();
    let group = doc.find_by_id("device_12").expect("group restored");
    assert!(doc.element(group).unwrap().has_class("selected"));
    for tile in ["dev_12_p3", "dev_12_p1", "dev_12_p2"] {
        assert!(doc.find_by_id(tile).is_some(), "{tile} missing after undo");
    }
}

#[test]
fn restore_is_undoable() {
    let mut editor = editor();
    let before = editor.capture_state();
    editor.restore(&Snapshot::empty()).unwrap();
    assert!(editor.registry().is_empty());

    editor.undo();
    assert_eq!(editor.capture_state(), before);
}

#[test]
fn blank_create_records_nothing() {
    let mut editor = editor();
    assert_eq!(
        editor.create_device("  ", "Ghost", 0.0, 0.0, 2),
        Err(FloorplanError::BlankId)
    );
    assert!(!editor.can_undo());
}

#[test]
fn inconsistent_snapshot_is_rejected() {
    let mut editor = editor();
    let mut snapshot = editor.capture_state();
    let first = snapshot.devices[0].clone();
    snapshot.devices.push(first);

    let before = editor.capture_state();
    assert!(matches!(
        editor.restore(&snapshot),
        Err(FloorplanError::DuplicateId { .. })
    ));
    assert_eq!(editor.capture_state(), before);
    assert!(!editor.can_undo());
}

// ─── Events ─────────────────────────────────────────────────────────────

#[test]
fn history_changes_are_announced_once() {
    let mut editor = editor();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    editor.subscribe(move |event| {
        if let EditorEvent::HistoryChanged { can_undo, can_redo } = event {
            sink.borrow_mut().push((*can_undo, *can_redo));
        }
    });

    editor.set_position(boiler(), 1.0, 1.0);
    editor.set_position(boiler(), 2.0, 2.0);
    editor.undo();
    editor.undo();

    assert_eq!(
        *seen.borrow(),
        vec![(true, false), (true, true), (false, true)]
    );
}
