//! Pointer gestures: click-to-select, drag-to-move, handle-to-resize.
//!
//! While a gesture runs only the scene changes. The registry and history
//! see a single edit when the pointer is released, and a press/release
//! without movement records nothing.

use crate::editor::Editor;
use crate::input::InputEvent;
use fp_core::layout::scale_from_drag;
use fp_core::{DeviceId, SceneAdapter};
use fp_render::{Hit, hit_test};

/// A gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Moving a device body.
    Drag {
        device: DeviceId,
        /// Pointer position at press.
        start: (f32, f32),
        moved: bool,
    },
    /// Dragging a device's resize handle.
    Resize {
        device: DeviceId,
        start_y: f32,
        start_scale: f32,
        /// Preview scale shown on screen.
        current: f32,
    },
}

impl Gesture {
    pub fn device(&self) -> DeviceId {
        match *self {
            Gesture::Drag { device, .. } | Gesture::Resize { device, .. } => device,
        }
    }
}

impl<S: SceneAdapter> Editor<S> {
    /// Feed one document-space pointer event. Returns `true` when the
    /// event was consumed by a device or an active gesture.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { x, y } => self.pointer_down(x, y),
            InputEvent::PointerMove { x, y } => self.pointer_move(x, y),
            InputEvent::PointerUp { .. } => self.pointer_up(),
        }
    }

    pub fn gesture(&self) -> Option<&Gesture> {
        self.gesture.as_ref()
    }

    /// Abandon the active gesture and put the visuals back.
    pub fn cancel_gesture(&mut self) {
        let Some(gesture) = self.gesture.take() else {
            return;
        };
        let id = gesture.device();
        match gesture {
            Gesture::Drag { .. } => {
                if let Some(group) = self.registry.get(id).and_then(|d| d.handle) {
                    self.scene.preview_offset(group, 0.0, 0.0);
                }
            }
            Gesture::Resize { .. } => self.layout_current(id),
        }
        log::trace!("cancelled gesture on {id}");
    }

    fn pointer_down(&mut self, x: f32, y: f32) -> bool {
        self.cancel_gesture();
        let zoom = self.scene.zoom();
        let hit = hit_test(&self.registry, x, y, zoom, self.config.handle_screen_size);

        let Some(hit) = hit else {
            self.deselect();
            return false;
        };
        let id = hit.device();
        self.select(id);
        self.gesture = Some(match hit {
            Hit::ResizeHandle(_) => {
                let scale = self.registry.get(id).map_or(1.0, |d| d.scale());
                Gesture::Resize {
                    device: id,
                    start_y: y,
                    start_scale: scale,
                    current: scale,
                }
            }
            Hit::Device(_) => Gesture::Drag {
                device: id,
                start: (x, y),
                moved: false,
            },
        });
        true
    }

    fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        let Some(gesture) = self.gesture.as_mut() else {
            return false;
        };
        match gesture {
            Gesture::Drag {
                device,
                start,
                moved,
            } => {
                let (dx, dy) = (x - start.0, y - start.1);
                *moved |= dx != 0.0 || dy != 0.0;
                let id = *device;
                if let Some(group) = self.registry.get(id).and_then(|d| d.handle) {
                    self.scene.preview_offset(group, dx, dy);
                }
            }
            Gesture::Resize {
                device,
                start_y,
                start_scale,
                current,
            } => {
                let next = scale_from_drag(*start_scale, y - *start_y, self.config.resize_sensitivity);
                if next == *current {
                    return true;
                }
                *current = next;
                let id = *device;
                self.layout_visuals(id, next);
            }
        }
        true
    }

    fn pointer_up(&mut self) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        let id = gesture.device();
        match gesture {
            Gesture::Drag { moved: false, .. } => {}
            Gesture::Drag { moved: true, .. } => {
                let resolved = self
                    .registry
                    .get(id)
                    .and_then(|d| d.handle)
                    .and_then(|group| self.scene.read_resolved_transform(group));
                if let Some((x, y)) = resolved {
                    self.set_position(id, x, y);
                }
            }
            Gesture::Resize {
                start_scale,
                current,
                ..
            } => {
                if current != start_scale {
                    self.set_scale(id, current);
                } else {
                    self.layout_current(id);
                }
            }
        }
        true
    }
}
