//! Input abstraction layer.
//!
//! Normalizes mouse, touch and pen events into document-space pointer
//! events consumed by the gesture handler.

/// A normalized pointer event, already mapped into document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start, pen contact).
    PointerDown { x: f32, y: f32 },

    /// Pointer moved.
    PointerMove { x: f32, y: f32 },

    /// Pointer released.
    PointerUp { x: f32, y: f32 },
}

impl InputEvent {
    pub fn from_pointer_down(x: f32, y: f32) -> Self {
        Self::PointerDown { x, y }
    }

    pub fn from_pointer_move(x: f32, y: f32) -> Self {
        Self::PointerMove { x, y }
    }

    pub fn from_pointer_up(x: f32, y: f32) -> Self {
        Self::PointerUp { x, y }
    }

    pub fn position(&self) -> (f32, f32) {
        match *self {
            Self::PointerDown { x, y } | Self::PointerMove { x, y } | Self::PointerUp { x, y } => {
                (x, y)
            }
        }
    }
}

/// Map a screen point into document space given the viewport's origin
/// (document coordinates of the top-left pixel) and zoom.
pub fn screen_to_document(sx: f32, sy: f32, origin: (f32, f32), zoom: f32) -> (f32, f32) {
    let zoom = if zoom > 0.0 { zoom } else { 1.0 };
    (origin.0 + sx / zoom, origin.1 + sy / zoom)
}
