//! Hit testing: document point → device or resize handle.
//!
//! Works from registry geometry rather than the markup, so it agrees with
//! what the editor believes is on screen. Later devices paint on top and
//! are tested first.

use fp_core::layout::{LocalBounds, device_bounds, handle_geometry};
use fp_core::{DeviceId, DeviceRegistry};
use kurbo::{Point, Rect};

/// What a pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    /// The resize handle of a device.
    ResizeHandle(DeviceId),
    /// A device body.
    Device(DeviceId),
}

impl Hit {
    pub fn device(self) -> DeviceId {
        match self {
            Hit::ResizeHandle(id) | Hit::Device(id) => id,
        }
    }
}

fn to_rect(b: LocalBounds, origin: Point) -> Rect {
    Rect::new(
        origin.x + f64::from(b.x),
        origin.y + f64::from(b.y),
        origin.x + f64::from(b.x + b.width),
        origin.y + f64::from(b.y + b.height),
    )
}

/// Find the topmost device (or handle) at `(px, py)`. A device's handle
/// is tested before its body.
pub fn hit_test(
    registry: &DeviceRegistry,
    px: f32,
    py: f32,
    zoom: f32,
    handle_screen_size: f32,
) -> Option<Hit> {
    let point = Point::new(f64::from(px), f64::from(py));
    for device in registry.list_all().collect::<Vec<_>>().into_iter().rev() {
        let origin = Point::new(f64::from(device.x), f64::from(device.y));
        let count = device.indicators().len();
        if count > 0 {
            let handle = handle_geometry(count, device.scale(), zoom, handle_screen_size);
            if to_rect(handle.bounds(), origin).contains(point) {
                return Some(Hit::ResizeHandle(device.id()));
            }
        }
        if to_rect(device_bounds(count, device.scale()), origin).contains(point) {
            return Some(Hit::Device(device.id()));
        }
    }
    None
}

/// Every device whose body intersects a marquee rectangle, in registry order.
pub fn hit_test_rect(registry: &DeviceRegistry, x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<DeviceId> {
    let marquee = Rect::new(f64::from(x0), f64::from(y0), f64::from(x1), f64::from(y1)).abs();
    registry
        .list_all()
        .filter(|device| {
            let origin = Point::new(f64::from(device.x), f64::from(device.y));
            let body = to_rect(
                device_bounds(device.indicators().len(), device.scale()),
                origin,
            );
            marquee.intersect(body).area() > 0.0
        })
        .map(|device| device.id())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry() -> DeviceRegistry {
        let mut reg = DeviceRegistry::new();
        reg.create(DeviceId::intern("1"), "A", 100.0, 100.0, 3).unwrap();
        reg.create(DeviceId::intern("2"), "B", 110.0, 110.0, 1).unwrap();
        reg
    }

    #[test]
    fn topmost_device_wins() {
        let reg = registry();
        assert_eq!(
            hit_test(&reg, 115.0, 115.0, 1.0, 28.0),
            Some(Hit::Device(DeviceId::intern("2")))
        );
        assert_eq!(
            hit_test(&reg, 105.0, 170.0, 1.0, 28.0),
            Some(Hit::Device(DeviceId::intern("1")))
        );
        assert_eq!(hit_test(&reg, 10.0, 10.0, 1.0, 28.0), None);
    }

    #[test]
    fn handle_below_last_tile() {
        let reg = registry();
        // Device 1: three tiles, handle at (30, 100) local, size 28.
        let hit = hit_test(&reg, 100.0 + 40.0, 100.0 + 110.0, 1.0, 28.0);
        assert_eq!(hit, Some(Hit::ResizeHandle(DeviceId::intern("1"))));
        assert_eq!(hit.map(Hit::device), Some(DeviceId::intern("1")));
    }

    #[test]
    fn marquee_selects_overlaps() {
        let reg = registry();
        assert_eq!(
            hit_test_rect(&reg, 0.0, 0.0, 105.0, 105.0),
            vec![DeviceId::intern("1")]
        );
        assert_eq!(hit_test_rect(&reg, 300.0, 300.0, 0.0, 0.0).len(), 2);
    }
}
