// Installation categories and install indexes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Installation category of a connection. Every category shares the same
/// extraction and gating mechanics; only the snapshot root and the identity
/// field names differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Summary,
    #[serde(alias = "pv")]
    Photovoltaic,
    #[serde(alias = "p1")]
    GridMeter,
    ChargePoint,
}

impl Category {
    /// Catalog order: summary first, then the installation categories.
    pub const ALL: [Category; 4] = [
        Category::Summary,
        Category::Photovoltaic,
        Category::GridMeter,
        Category::ChargePoint,
    ];

    /// Top-level key of this category inside a connection snapshot.
    pub fn root(self) -> &'static str {
        match self {
            Category::Summary => "summary_data",
            Category::Photovoltaic => "pv_installation",
            Category::GridMeter => "p1_installation",
            Category::ChargePoint => "charge_point_installation",
        }
    }

    /// Whether the root holds a sequence of installations (vs. one summary mapping).
    pub fn is_indexed(self) -> bool {
        !matches!(self, Category::Summary)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.root())
    }
}

/// Position of an installation within its category sequence.
///
/// `Aggregate` covers totals entities (index -1 upstream) and the non-indexed
/// summary category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InstallIndex {
    Aggregate,
    At(usize),
}

impl InstallIndex {
    /// Upstream numbering: -1 for the aggregate.
    pub fn as_raw(self) -> i64 {
        match self {
            InstallIndex::Aggregate => -1,
            InstallIndex::At(n) => n as i64,
        }
    }
}

impl fmt::Display for InstallIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_raw())
    }
}

impl Serialize for InstallIndex {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_raw())
    }
}
