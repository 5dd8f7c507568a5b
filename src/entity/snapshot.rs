use indexmap::IndexMap;
use serde::Serialize;

/// A serializable record of an entity's state.
///
/// Processes nest the snapshots of their responses under `children`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SnapshotData>,
    pub metadata: IndexMap<String, String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub children: IndexMap<String, Snapshot>,
}

/// Per-cell values with the unit they are expressed in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotData {
    pub values: Vec<f64>,
    pub unit: String,
}

impl Snapshot {
    #[must_use]
    pub fn with_data(mut self, values: Vec<f64>, unit: impl Into<String>) -> Self {
        self.data = Some(SnapshotData {
            values,
            unit: unit.into(),
        });
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.metadata.insert(key.into(), value.to_string());
        self
    }

    #[must_use]
    pub fn with_child(mut self, name: impl Into<String>, child: Snapshot) -> Self {
        self.children.insert(name.into(), child);
        self
    }
}
