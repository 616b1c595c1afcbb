use std::collections::BTreeSet;

/// Detector class names that raise an alert, with the text shown to the operator.
///
/// The table is fixed at build time. Lookups are by exact class name as reported
/// by the detector's class table.
pub const DANGER_LABELS: &[(&str, &str)] = &[
    ("bottle", "BOTTLE"),
    ("knife", "KNIFE"),
    ("baseball bat", "BASEBALL BAT"),
    ("scissors", "SCISSORS"),
    ("fork", "FORK"),
    ("spoon", "SPOON"),
];

/// Read-only view over [`DANGER_LABELS`].
#[derive(Clone, Copy, Debug)]
pub struct DangerLabelMap {
    entries: &'static [(&'static str, &'static str)],
}

impl DangerLabelMap {
    pub const fn new() -> Self {
        Self {
            entries: DANGER_LABELS,
        }
    }

    /// Alert text for a class name, if the class is dangerous.
    pub fn alert_for(&self, class_name: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(name, _)| *name == class_name)
            .map(|(_, alert)| *alert)
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.alert_for(class_name).is_some()
    }

    /// Scan a detector class table and collect the ids whose names are dangerous.
    pub fn danger_class_ids<S: AsRef<str>>(&self, class_names: &[S]) -> BTreeSet<usize> {
        class_names
            .iter()
            .enumerate()
            .filter(|(_, name)| self.contains(name.as_ref()))
            .map(|(id, _)| id)
            .collect()
    }
}

impl Default for DangerLabelMap {
    fn default() -> Self {
        Self::new()
    }
}
