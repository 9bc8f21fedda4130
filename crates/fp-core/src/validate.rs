//! Pre-export checks over the registry.
//!
//! Reports problems without modifying anything. The host decides whether
//! an `Error` blocks the dashboard export.

use crate::id::{DeviceId, IndicatorIndex};
use crate::registry::DeviceRegistry;

// ─── Diagnostic types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExportSeverity {
    /// Informational, the export is still usable.
    Info,
    /// Probably a mistake.
    Warning,
    /// The export would be broken.
    Error,
}

/// A single finding for a device (and optionally one of its indicators).
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDiagnostic {
    pub device: DeviceId,
    pub indicator: Option<IndicatorIndex>,
    pub message: String,
    pub severity: ExportSeverity,
    /// Short rule identifier, e.g. `empty-device`.
    pub rule: &'static str,
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Run every rule, in registry order.
#[must_use]
pub fn validate_export(registry: &DeviceRegistry) -> Vec<ExportDiagnostic> {
    let mut diags = Vec::new();
    check_empty_devices(registry, &mut diags);
    check_missing_queries(registry, &mut diags);
    check_duplicate_queries(registry, &mut diags);
    diags
}

/// Whether any diagnostic is an `Error`.
pub fn has_errors(diags: &[ExportDiagnostic]) -> bool {
    diags.iter().any(|d| d.severity == ExportSeverity::Error)
}

// ─── Rules ────────────────────────────────────────────────────────────────

fn check_empty_devices(registry: &DeviceRegistry, diags: &mut Vec<ExportDiagnostic>) {
    for device in registry.list_all() {
        if device.indicators().is_empty() {
            diags.push(ExportDiagnostic {
                device: device.id(),
                indicator: None,
                message: format!("Device \"{}\" (ID: {}) has no indicators.", device.name, device.id()),
                severity: ExportSeverity::Error,
                rule: "empty-device",
            });
        }
    }
}

fn check_missing_queries(registry: &DeviceRegistry, diags: &mut Vec<ExportDiagnostic>) {
    for device in registry.list_all() {
        for ind in device.indicators().iter().filter(|i| i.query.is_none()) {
            diags.push(ExportDiagnostic {
                device: device.id(),
                indicator: Some(ind.index()),
                message: format!("{} of device {} has no query reference.", ind.index(), device.id()),
                severity: ExportSeverity::Info,
                rule: "missing-query",
            });
        }
    }
}

fn check_duplicate_queries(registry: &DeviceRegistry, diags: &mut Vec<ExportDiagnostic>) {
    for device in registry.list_all() {
        let indicators = device.indicators();
        for (i, ind) in indicators.iter().enumerate() {
            let Some(query) = ind.query else {
                continue;
            };
            if let Some(first) = indicators[..i].iter().find(|o| o.query == Some(query)) {
                diags.push(ExportDiagnostic {
                    device: device.id(),
                    indicator: Some(ind.index()),
                    message: format!(
                        "{} shares query {} with {} on device {}.",
                        ind.index(),
                        query_letter(query.get()),
                        first.index(),
                        device.id()
                    ),
                    severity: ExportSeverity::Warning,
                    rule: "duplicate-query",
                });
            }
        }
    }
}

/// Dashboard query reference letter: 1 → `A`, 26 → `Z`, 27 → `AA`.
pub fn query_letter(mut n: u32) -> String {
    let mut out = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        out.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Device;
    use std::num::NonZeroU32;

    fn p(n: u8) -> IndicatorIndex {
        IndicatorIndex::new(n).unwrap()
    }

    #[test]
    fn clean_registry_only_reports_missing_queries() {
        let mut reg = DeviceRegistry::new();
        let dev = reg.create(DeviceId::intern("1"), "A", 0.0, 0.0, 2).unwrap();
        dev.indicator_mut(p(1)).unwrap().query = NonZeroU32::new(1);
        let diags = validate_export(&reg);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].rule, "missing-query");
        assert_eq!(diags[0].indicator, Some(p(2)));
        assert!(!has_errors(&diags));
    }

    #[test]
    fn duplicate_queries_warn_once_per_repeat() {
        let mut reg = DeviceRegistry::new();
        let dev = reg.create(DeviceId::intern("1"), "A", 0.0, 0.0, 3).unwrap();
        for ind in dev.indicators_mut() {
            ind.query = NonZeroU32::new(3);
        }
        let diags = validate_export(&reg);
        let dups: Vec<_> = diags.iter().filter(|d| d.rule == "duplicate-query").collect();
        assert_eq!(dups.len(), 2);
        assert!(dups[0].message.contains("query C"));
    }

    #[test]
    fn device_without_indicators_is_an_error() {
        let mut reg = DeviceRegistry::new();
        let bare = Device::new(DeviceId::intern("9"), "Bare", 0.0, 0.0, 1).without_indicators();
        reg.insert(bare).unwrap();
        let diags = validate_export(&reg);
        assert_eq!(diags[0].rule, "empty-device");
        assert!(has_errors(&diags));
    }

    #[test]
    fn query_letters() {
        assert_eq!(query_letter(1), "A");
        assert_eq!(query_letter(26), "Z");
        assert_eq!(query_letter(27), "AA");
    }
}
