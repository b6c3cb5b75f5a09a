//! Output column descriptors

use serde::{Deserialize, Serialize};

use super::types::DatumType;

/// One output column of a plan node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultColumn {
    /// Column name (alias or auto-derived name)
    pub name: String,
    /// Column type
    #[serde(rename = "type")]
    pub typ: DatumType,
    /// Hidden columns exist only to support ordering and are never returned
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
}

impl ResultColumn {
    /// Creates a visible column
    pub fn new(name: impl Into<String>, typ: DatumType) -> Self {
        Self {
            name: name.into(),
            typ,
            hidden: false,
        }
    }

    /// Creates a hidden column
    pub fn hidden(name: impl Into<String>, typ: DatumType) -> Self {
        Self {
            name: name.into(),
            typ,
            hidden: true,
        }
    }
}

/// Ordered output column list of a plan node
pub type ResultColumns = Vec<ResultColumn>;
