//! WASM bridge for FP: exposes the floorplan editor to the browser.
//!
//! Compiled via `wasm-pack build --target web`. The page owns file
//! reading and DOM display; it hands document text in, pulls markup and
//! JSON views back out, and forwards pointer events in document space.

use fp_core::{Color, DeviceId, FloorplanError, IndicatorIndex, Snapshot};
use fp_editor::{Editor, EditorConfig, InputEvent, SubscriptionId};
use fp_render::SvgScene;
use serde::Serialize;
use std::num::NonZeroU32;
use wasm_bindgen::prelude::*;

/// The main WASM-facing editor controller.
#[wasm_bindgen]
pub struct FloorplanCanvas {
    editor: Editor<SvgScene>,
    listener: Option<SubscriptionId>,
}

/// Outcome of a fallible call, as JSON for the page.
#[derive(Serialize)]
struct Outcome<'a> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn ok_json(id: Option<&str>) -> String {
    serde_json::to_string(&Outcome {
        ok: true,
        id,
        error: None,
    })
    .unwrap_or_default()
}

fn err_json(err: &FloorplanError) -> String {
    serde_json::to_string(&Outcome {
        ok: false,
        id: None,
        error: Some(err.to_string()),
    })
    .unwrap_or_default()
}

fn index(n: u8) -> Option<IndicatorIndex> {
    IndicatorIndex::new(n)
}

fn indices(ns: &[u8]) -> Option<Vec<IndicatorIndex>> {
    ns.iter().map(|&n| IndicatorIndex::new(n)).collect()
}

#[wasm_bindgen]
impl FloorplanCanvas {
    /// Create an editor with default settings, or from a JSON config
    /// object (missing fields take defaults).
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Self {
        console_error_panic_hook_setup();

        let config = config_json
            .as_deref()
            .and_then(|json| match serde_json::from_str::<EditorConfig>(json) {
                Ok(config) => Some(config),
                Err(err) => {
                    log::warn!("ignoring editor config: {err}");
                    None
                }
            })
            .unwrap_or_default();
        Self {
            editor: Editor::with_config(SvgScene::new(), config),
            listener: None,
        }
    }

    // ─── Document ────────────────────────────────────────────────────────

    /// Load SVG text. Returns JSON `{"ok":true}` or `{"ok":false,"error":"..."}`.
    pub fn load_document(&mut self, text: &str) -> String {
        match self.editor.load_document(text) {
            Ok(_) => ok_json(None),
            Err(err) => err_json(&err),
        }
    }

    pub fn new_document(&mut self, width: f32, height: f32) -> String {
        match self.editor.new_document(width, height) {
            Ok(_) => ok_json(None),
            Err(err) => err_json(&err),
        }
    }

    /// Live markup including handles and highlight, for display.
    pub fn display_svg(&self) -> Option<String> {
        self.editor
            .scene()
            .document()
            .map(fp_core::emit_document)
    }

    /// Cleaned markup for download.
    pub fn export_document(&self) -> Option<String> {
        self.editor.export_document()
    }

    /// Device records in registry order, indicators in visual order.
    pub fn devices_json(&self) -> String {
        serde_json::to_string(&self.editor.capture_state().devices)
            .unwrap_or_else(|_| "[]".to_string())
    }

    /// Full versioned snapshot, including the selection.
    pub fn snapshot_json(&self) -> String {
        self.editor.capture_state().to_json()
    }

    /// Replace the document state with a snapshot from `snapshot_json`,
    /// as one undo step.
    pub fn restore_snapshot(&mut self, json: &str) -> String {
        let result = Snapshot::from_json(json).and_then(|snapshot| self.editor.restore(&snapshot));
        match result {
            Ok(()) => ok_json(None),
            Err(err) => err_json(&err),
        }
    }

    pub fn dashboard_json(&self) -> String {
        self.editor.dashboard_snapshot().to_json()
    }

    pub fn export_diagnostics_json(&self) -> String {
        #[derive(Serialize)]
        struct Diagnostic<'a> {
            device: &'a str,
            indicator: Option<u8>,
            message: &'a str,
            severity: String,
            rule: &'a str,
        }

        let diagnostics = self.editor.validate_export();
        let out: Vec<_> = diagnostics
            .iter()
            .map(|d| Diagnostic {
                device: d.device.as_str(),
                indicator: d.indicator.map(IndicatorIndex::get),
                message: &d.message,
                severity: format!("{:?}", d.severity).to_lowercase(),
                rule: d.rule,
            })
            .collect();
        serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
    }

    // ─── Devices ─────────────────────────────────────────────────────────

    pub fn create_device(&mut self, id: &str, name: &str, x: f32, y: f32, count: usize) -> String {
        match self.editor.create_device(id, name, x, y, count) {
            Ok(id) => ok_json(Some(id.as_str())),
            Err(err) => err_json(&err),
        }
    }

    /// Create with the next free id and default placement.
    pub fn add_device(&mut self, name: &str) -> String {
        match self.editor.add_device(name) {
            Ok(id) => ok_json(Some(id.as_str())),
            Err(err) => err_json(&err),
        }
    }

    pub fn delete_device(&mut self, id: &str) -> bool {
        self.editor.delete_device(DeviceId::intern(id))
    }

    pub fn set_position(&mut self, id: &str, x: f32, y: f32) -> bool {
        self.editor.set_position(DeviceId::intern(id), x, y)
    }

    pub fn set_scale(&mut self, id: &str, scale: f32) -> bool {
        self.editor.set_scale(DeviceId::intern(id), scale)
    }

    pub fn set_name(&mut self, id: &str, name: &str) -> bool {
        self.editor.set_name(DeviceId::intern(id), name)
    }

    pub fn set_device_id(&mut self, old: &str, new: &str) -> String {
        match self.editor.set_device_id(DeviceId::intern(old), new) {
            Ok(_) => ok_json(Some(new.trim())),
            Err(err) => err_json(&err),
        }
    }

    // ─── Indicators ──────────────────────────────────────────────────────

    pub fn set_indicator_color(&mut self, id: &str, n: u8, hex: &str) -> bool {
        match (index(n), Color::from_hex(hex)) {
            (Some(index), Some(color)) => {
                self.editor
                    .set_indicator_color(DeviceId::intern(id), index, color)
            }
            _ => false,
        }
    }

    pub fn set_indicator_off_color(&mut self, id: &str, n: u8, hex: &str) -> bool {
        match (index(n), Color::from_hex(hex)) {
            (Some(index), Some(color)) => {
                self.editor
                    .set_indicator_off_color(DeviceId::intern(id), index, color)
            }
            _ => false,
        }
    }

    pub fn set_indicator_blink(&mut self, id: &str, n: u8, blink: bool) -> bool {
        index(n).is_some_and(|index| {
            self.editor
                .set_indicator_blink(DeviceId::intern(id), index, blink)
        })
    }

    /// `query` 0 clears the reference.
    pub fn set_indicator_query(&mut self, id: &str, n: u8, query: u32) -> bool {
        index(n).is_some_and(|index| {
            self.editor
                .set_indicator_query(DeviceId::intern(id), index, NonZeroU32::new(query))
        })
    }

    pub fn set_indicator_membership(&mut self, id: &str, order: &[u8]) -> String {
        let Some(order) = indices(order) else {
            return err_json(&FloorplanError::invalid_order("P-numbers must be 1..=8"));
        };
        match self
            .editor
            .set_indicator_membership(DeviceId::intern(id), &order)
        {
            Ok(_) => ok_json(None),
            Err(err) => err_json(&err),
        }
    }

    pub fn toggle_indicator(&mut self, id: &str, n: u8, on: bool) -> bool {
        index(n).is_some_and(|index| self.editor.toggle_indicator(DeviceId::intern(id), index, on))
    }

    pub fn reorder_indicators(&mut self, id: &str, order: &[u8]) -> String {
        let Some(order) = indices(order) else {
            return err_json(&FloorplanError::invalid_order("P-numbers must be 1..=8"));
        };
        match self.editor.reorder_indicators(DeviceId::intern(id), &order) {
            Ok(_) => ok_json(None),
            Err(err) => err_json(&err),
        }
    }

    pub fn move_indicator_up(&mut self, id: &str, n: u8) -> bool {
        index(n).is_some_and(|index| self.editor.move_indicator_up(DeviceId::intern(id), index))
    }

    pub fn move_indicator_down(&mut self, id: &str, n: u8) -> bool {
        index(n).is_some_and(|index| self.editor.move_indicator_down(DeviceId::intern(id), index))
    }

    pub fn set_indicator_count(&mut self, id: &str, count: usize) -> bool {
        self.editor.set_indicator_count(DeviceId::intern(id), count)
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        self.editor.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.editor.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.editor.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.editor.can_redo()
    }

    pub fn begin_batch(&mut self, label: &str) {
        self.editor.begin_batch(label);
    }

    pub fn end_batch(&mut self) -> bool {
        self.editor.end_batch()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select(&mut self, id: &str) -> bool {
        self.editor.select(DeviceId::intern(id))
    }

    pub fn deselect(&mut self) {
        self.editor.deselect();
    }

    pub fn selected_id(&self) -> Option<String> {
        self.editor.selected_id().map(|id| id.as_str().to_string())
    }

    // ─── Pointer input (document coordinates) ───────────────────────────

    pub fn handle_pointer_down(&mut self, x: f32, y: f32) -> bool {
        self.editor.handle_input(InputEvent::from_pointer_down(x, y))
    }

    pub fn handle_pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.editor.handle_input(InputEvent::from_pointer_move(x, y))
    }

    pub fn handle_pointer_up(&mut self, x: f32, y: f32) -> bool {
        self.editor.handle_input(InputEvent::from_pointer_up(x, y))
    }

    pub fn cancel_gesture(&mut self) {
        self.editor.cancel_gesture();
    }

    /// Viewport zoom; keeps resize handles a constant size on screen.
    pub fn set_zoom(&mut self, zoom: f32) {
        self.editor.scene_mut().set_zoom(zoom);
        self.editor.refresh_handles();
    }

    // ─── Events ──────────────────────────────────────────────────────────

    /// Install the page's event callback. It receives one JSON string per
    /// event, e.g. `{"type":"DeviceMoved","id":"12","x":10,"y":20}`.
    /// Replaces any previous callback.
    pub fn set_event_listener(&mut self, callback: js_sys::Function) {
        self.clear_event_listener();
        let id = self.editor.subscribe(move |event| {
            let payload = JsValue::from_str(&event.to_json());
            if let Err(err) = callback.call1(&JsValue::NULL, &payload) {
                web_sys::console::error_1(&err);
            }
        });
        self.listener = Some(id);
    }

    pub fn clear_event_listener(&mut self) {
        if let Some(id) = self.listener.take() {
            self.editor.unsubscribe(id);
        }
    }
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("FP WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone validation (no canvas needed) ────────────────────────────

/// Check that text loads as a floorplan document.
/// Returns JSON: `{"ok":true}` or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate(source: &str) -> String {
    match fp_core::parse_document(source) {
        Ok(_) => ok_json(None),
        Err(err) => err_json(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = r##"<svg viewBox="0 0 400 300"><g id="device_3" transform="translate(10,20)"><rect id="dev_3_p1" x="0" y="0" width="30" height="30" fill="#00ff00"/></g></svg>"##;

    fn canvas() -> FloorplanCanvas {
        let mut canvas = FloorplanCanvas::new(None);
        assert_eq!(canvas.load_document(DOC), r#"{"ok":true}"#);
        canvas
    }

    #[test]
    fn create_reports_id_or_error() {
        let mut canvas = canvas();
        assert_eq!(canvas.add_device("Fan"), r#"{"ok":true,"id":"4"}"#);
        assert_eq!(
            canvas.create_device("3", "Dup", 0.0, 0.0, 2),
            r#"{"ok":false,"error":"device id already exists: 3"}"#
        );
    }

    #[test]
    fn bad_indices_and_colors_are_refused() {
        let mut canvas = canvas();
        assert!(!canvas.set_indicator_color("3", 9, "#ff0000"));
        assert!(!canvas.set_indicator_color("3", 1, "red"));
        assert!(canvas.set_indicator_color("3", 1, "#ff0000"));
        assert!(
            canvas
                .reorder_indicators("3", &[0])
                .starts_with(r#"{"ok":false"#)
        );
    }

    #[test]
    fn config_json_overrides_defaults() {
        let mut canvas = FloorplanCanvas::new(Some(r#"{"max_undo_depth": 1}"#.to_string()));
        canvas.load_document(DOC);
        canvas.set_position("3", 1.0, 1.0);
        canvas.set_position("3", 2.0, 2.0);
        assert!(canvas.undo());
        assert!(!canvas.undo());
    }

    #[test]
    fn export_and_selection_round_trip_through_strings() {
        let mut canvas = canvas();
        assert!(canvas.select("3"));
        assert_eq!(canvas.selected_id().as_deref(), Some("3"));
        assert!(canvas.display_svg().unwrap().contains("selected"));
        assert!(!canvas.export_document().unwrap().contains("selected"));
        assert!(canvas.snapshot_json().contains(r#""selected":"3""#));
        assert!(canvas.devices_json().starts_with(r#"[{"id":"3""#));
    }

    #[test]
    fn snapshot_json_restores_as_one_step() {
        let mut canvas = canvas();
        let saved = canvas.snapshot_json();
        canvas.delete_device("3");
        assert_eq!(canvas.restore_snapshot(&saved), r#"{"ok":true}"#);
        assert_eq!(canvas.devices_json(), {
            let mut fresh = FloorplanCanvas::new(None);
            fresh.load_document(DOC);
            fresh.devices_json()
        });
        assert!(canvas.restore_snapshot("{}").starts_with(r#"{"ok":false"#));
    }

    #[test]
    fn validate_reports_parse_errors() {
        assert_eq!(validate(DOC), r#"{"ok":true}"#);
        assert!(validate("<svg>").starts_with(r#"{"ok":false"#));
    }
}
