//! Indicator tile geometry.
//!
//! Every measurement is a base unit multiplied by the device scale. Tiles
//! stack vertically in visual order; the resize handle sits just outside
//! the bottom-right corner of the last tile.


/// Tile edge length at scale 1.
pub const TILE_SIZE: f32 = 30.0;
/// Vertical distance between consecutive tile origins at scale 1.
pub const TILE_PITCH: f32 = 35.0;
/// Tile corner radius at scale 1.
pub const TILE_RADIUS: f32 = 10.0;
/// Tile stroke width (not scaled).
pub const TILE_STROKE_WIDTH: f32 = 2.0;

pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 20.0;

/// Clamp a scale factor to [`MIN_SCALE`, `MAX_SCALE`]. NaN falls back to 1.
pub fn clamp_scale(scale: f32) -> f32 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// Axis-aligned box in a device's local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LocalBounds {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    /// Shift into document space by a device origin.
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Geometry of one indicator tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGeometry {
    /// Local Y offset of the tile (`slot · pitch · scale`); X is always 0.
    pub offset: f32,
    pub size: f32,
    pub radius: f32,
}

impl TileGeometry {
    pub fn bounds(&self) -> LocalBounds {
        LocalBounds {
            x: 0.0,
            y: self.offset,
            width: self.size,
            height: self.size,
        }
    }
}

/// Geometry of the tile at visual `slot` (0 = top).
pub fn tile_geometry(slot: usize, scale: f32) -> TileGeometry {
    TileGeometry {
        offset: slot as f32 * TILE_PITCH * scale,
        size: TILE_SIZE * scale,
        radius: TILE_RADIUS * scale,
    }
}

/// Local bounds covering all `count` tiles.
pub fn device_bounds(count: usize, scale: f32) -> LocalBounds {
    let count = count.max(1);
    LocalBounds {
        x: 0.0,
        y: 0.0,
        width: TILE_SIZE * scale,
        height: ((count - 1) as f32 * TILE_PITCH + TILE_SIZE) * scale,
    }
}

/// Placement of the resize handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleGeometry {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

impl HandleGeometry {
    pub fn bounds(&self) -> LocalBounds {
        LocalBounds {
            x: self.x,
            y: self.y,
            width: self.size,
            height: self.size,
        }
    }
}

/// Resize handle for a device with `count` tiles.
///
/// `screen_size / zoom` keeps the handle a constant size on screen; it is
/// capped at one tile so it never dwarfs a small device.
pub fn handle_geometry(count: usize, scale: f32, zoom: f32, screen_size: f32) -> HandleGeometry {
    let zoom = if zoom > 0.0 { zoom } else { 1.0 };
    HandleGeometry {
        x: TILE_SIZE * scale,
        y: (TILE_PITCH * count as f32 - 5.0) * scale,
        size: (screen_size / zoom).min(TILE_SIZE * scale),
    }
}

/// Scale reached by dragging the resize handle `dy` units from where the
/// gesture started.
pub fn scale_from_drag(start_scale: f32, dy: f32, sensitivity: f32) -> f32 {
    let sensitivity = if sensitivity > 0.0 { sensitivity } else { 100.0 };
    clamp_scale(start_scale + dy / sensitivity)
}
