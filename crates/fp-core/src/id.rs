use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Interner behind every [`DeviceId`].
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A lightweight, interned device identifier.
///
/// Device ids are user-editable, so a rename interns a new string and the
/// registry rekeys; the old spur simply stays in the interner.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(Spur);

impl DeviceId {
    /// Intern a new string as a DeviceId, or return existing if already interned.
    pub fn intern(s: &str) -> Self {
        DeviceId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Markup id of the device's group element (`device_{id}`).
    pub fn group_element_id(&self) -> String {
        format!("device_{}", self.as_str())
    }

    /// Markup id of one indicator tile (`dev_{id}_p{n}`).
    ///
    /// This is also the name the dashboard maps query results onto, so it
    /// must stay a pure function of `(device id, P-number)`.
    pub fn indicator_element_id(&self, index: IndicatorIndex) -> String {
        format!("dev_{}_p{}", self.as_str(), index.get())
    }

    /// Extract the device id from a group element id (`device_42`, `dev_42`).
    pub fn from_group_element_id(element_id: &str) -> Option<Self> {
        let rest = element_id
            .strip_prefix("device_")
            .or_else(|| element_id.strip_prefix("dev_"))?;
        let digits: &str = &rest[..rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len())];
        if digits.is_empty() {
            return None;
        }
        Some(Self::intern(digits))
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DeviceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DeviceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(DeviceId::intern(&s))
    }
}

/// Stable indicator identity within a device ("P-number"), always 1..=8.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndicatorIndex(u8);

impl IndicatorIndex {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 8;
    pub const P1: Self = Self(1);

    pub const fn new(n: u8) -> Option<Self> {
        if n >= Self::MIN && n <= Self::MAX {
            Some(Self(n))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// All eight P-numbers in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (Self::MIN..=Self::MAX).map(Self)
    }

    /// Zero-based position into per-index tables such as the preset palette.
    pub(crate) const fn table_slot(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl fmt::Debug for IndicatorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl fmt::Display for IndicatorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl Serialize for IndicatorIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for IndicatorIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let n = u8::deserialize(deserializer)?;
        IndicatorIndex::new(n)
            .ok_or_else(|| serde::de::Error::custom(format!("indicator index out of range: {n}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = DeviceId::intern("42");
        let b = DeviceId::intern("42");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "42");
    }

    #[test]
    fn element_ids_follow_device_id() {
        let id = DeviceId::intern("99");
        let p3 = IndicatorIndex::new(3).unwrap();
        assert_eq!(id.group_element_id(), "device_99");
        assert_eq!(id.indicator_element_id(p3), "dev_99_p3");
    }

    #[test]
    fn group_element_id_parsing() {
        assert_eq!(
            DeviceId::from_group_element_id("device_17"),
            Some(DeviceId::intern("17"))
        );
        assert_eq!(
            DeviceId::from_group_element_id("dev_5_extra"),
            Some(DeviceId::intern("5"))
        );
        assert_eq!(DeviceId::from_group_element_id("device_abc"), None);
        assert_eq!(DeviceId::from_group_element_id("layer_1"), None);
    }

    #[test]
    fn indicator_index_bounds() {
        assert!(IndicatorIndex::new(0).is_none());
        assert!(IndicatorIndex::new(9).is_none());
        assert_eq!(IndicatorIndex::new(8).map(IndicatorIndex::get), Some(8));
        assert_eq!(IndicatorIndex::all().count(), 8);
        assert_eq!(IndicatorIndex::new(4).unwrap().to_string(), "P4");
    }
}
