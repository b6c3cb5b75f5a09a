//! Table and index descriptors
//!
//! The resolver reads descriptors only while expanding `ORDER BY INDEX` and
//! `ORDER BY PRIMARY KEY`. It never caches them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ast::normalize_name;
use super::errors::{PlannerError, PlannerResult};

/// Stored direction of one index key column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexDirection {
    #[default]
    Asc,
    Desc,
}

/// Key columns of one index, in key order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub column_names: Vec<String>,
    /// One entry per key column. Missing entries read as ascending.
    #[serde(default)]
    pub column_directions: Vec<IndexDirection>,
}

impl IndexDescriptor {
    /// An index with every key column ascending
    pub fn ascending<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let column_names: Vec<String> = columns.into_iter().map(Into::into).collect();
        let column_directions = vec![IndexDirection::Asc; column_names.len()];
        Self {
            name: name.into(),
            column_names,
            column_directions,
        }
    }

    /// An index with explicit per-column directions
    pub fn with_directions<S: Into<String>>(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = (S, IndexDirection)>,
    ) -> Self {
        let (column_names, column_directions) = columns
            .into_iter()
            .map(|(c, d)| -> (String, IndexDirection) { (c.into(), d) })
            .unzip();
        Self {
            name: name.into(),
            column_names,
            column_directions,
        }
    }

    /// Stored direction of key column `pos`
    pub fn direction(&self, pos: usize) -> IndexDirection {
        self.column_directions.get(pos).copied().unwrap_or_default()
    }
}

/// A table's primary and secondary indexes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    pub primary_index: IndexDescriptor,
    #[serde(default)]
    pub indexes: Vec<IndexDescriptor>,
}

impl TableDescriptor {
    /// Finds an index by name.
    ///
    /// No name, or the primary index's own name, selects the primary index.
    pub fn find_index(&self, name: Option<&str>) -> Option<&IndexDescriptor> {
        let wanted = match name.map(normalize_name) {
            None => return Some(&self.primary_index),
            Some(n) if n.is_empty() => return Some(&self.primary_index),
            Some(n) => n,
        };
        if wanted == normalize_name(&self.primary_index.name) {
            return Some(&self.primary_index);
        }
        self.indexes
            .iter()
            .find(|idx| normalize_name(&idx.name) == wanted)
    }
}

/// Read-only table lookup
pub trait Catalog {
    /// Resolves a table name to its descriptor
    fn resolve_table(&self, name: &str) -> PlannerResult<&TableDescriptor>;
}

/// Catalog held entirely in memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "CatalogDocument")]
pub struct MemoryCatalog {
    tables: Vec<TableDescriptor>,
    #[serde(skip)]
    by_name: HashMap<String, usize>,
}

/// On-disk shape of a catalog
#[derive(Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    tables: Vec<TableDescriptor>,
}

impl From<CatalogDocument> for MemoryCatalog {
    fn from(doc: CatalogDocument) -> Self {
        MemoryCatalog::from_tables(doc.tables)
    }
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from a list of tables
    pub fn from_tables(tables: Vec<TableDescriptor>) -> Self {
        let mut catalog = Self::new();
        for table in tables {
            catalog.add_table(table);
        }
        catalog
    }

    /// Registers a table, replacing any table of the same name
    pub fn add_table(&mut self, table: TableDescriptor) {
        let key = normalize_name(&table.name);
        match self.by_name.get(&key) {
            Some(&pos) => self.tables[pos] = table,
            None => {
                self.by_name.insert(key, self.tables.len());
                self.tables.push(table);
            }
        }
    }
}

impl Catalog for MemoryCatalog {
    fn resolve_table(&self, name: &str) -> PlannerResult<&TableDescriptor> {
        self.by_name
            .get(&normalize_name(name))
            .map(|&pos| &self.tables[pos])
            .ok_or_else(|| PlannerError::unknown_table(name))
    }
}
