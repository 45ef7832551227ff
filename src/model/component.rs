use serde::{Deserialize, Serialize};

use crate::model::Id;

/// Field order of a component row in a nodes CSV
pub const COMPONENT_FIELDS: [&str; 9] = [
    "id",
    "label",
    "component_type",
    "category",
    "location",
    "technology",
    "host",
    "description",
    "interface",
];

/// A deployment architecture component, stored as a `Component` node.
///
/// The `id` is supplied by whoever owns the inventory; the import never
/// generates one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentRecord {
    pub id: Id,
    pub label: String,
    pub component_type: String,
    pub category: String,
    pub location: String,
    pub technology: String,
    pub host: String,
    pub description: String,
    pub interface: String,
}

impl ComponentRecord {
    pub fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Build a record from cells laid out in `COMPONENT_FIELDS` order.
    /// Missing trailing cells become empty strings, extra cells are ignored.
    pub fn from_cells<S: AsRef<str>>(cells: &[S]) -> Self {
        let cell = |index: usize| {
            cells
                .get(index)
                .map(|value| value.as_ref().trim().to_string())
                .unwrap_or_default()
        };

        Self {
            id: cell(0),
            label: cell(1),
            component_type: cell(2),
            category: cell(3),
            location: cell(4),
            technology: cell(5),
            host: cell(6),
            description: cell(7),
            interface: cell(8),
        }
    }

    /// Property pairs in `COMPONENT_FIELDS` order, as written to the store
    pub fn properties(&self) -> [(&'static str, &str); 9] {
        [
            ("id", self.id.as_str()),
            ("label", self.label.as_str()),
            ("component_type", self.component_type.as_str()),
            ("category", self.category.as_str()),
            ("location", self.location.as_str()),
            ("technology", self.technology.as_str()),
            ("host", self.host.as_str()),
            ("description", self.description.as_str()),
            ("interface", self.interface.as_str()),
        ]
    }

    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }
}
