//! Field and table metadata.
//!
//! A [`TableMapping`] is built once per entity type at startup and treated as
//! an immutable capability object: every render borrows it read-only, which
//! is what makes concurrent rendering safe without locks.

use crate::error::{SqlError, SqlResult};
use crate::param::Param;

/// Role a column plays in statement construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldRole {
    /// Primary key column. At most one per mapping.
    PrimaryId,
    /// Optimistic-lock version column. At most one per mapping.
    LockVersion,
    /// Logical-delete flag column. At most one per mapping.
    LogicDeleted,
    /// Ordinary column.
    Normal,
}

/// How a logical delete marks a row. Fixed per entity type by its metadata,
/// never per call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteMarker {
    /// Boolean flag column: `SET col = true`.
    Flag,
    /// Long-typed column: `SET col = <current epoch milliseconds>`.
    Timestamp,
}

/// Metadata for one mapped column.
#[derive(Clone, Debug)]
pub struct FieldMeta {
    pub property: String,
    pub column: String,
    pub role: FieldRole,
    pub auto_increment: bool,
    pub insertable: bool,
    pub updatable: bool,
    /// Raw SQL assignment applied by updates that do not set this column
    /// explicitly, e.g. `now()` for a modified-timestamp column or
    /// `version + 1` for the lock version.
    pub update_default: Option<String>,
    /// Marker kind, set only on the logic-delete field.
    pub marker: Option<DeleteMarker>,
}

impl FieldMeta {
    /// Create an ordinary column mapping.
    pub fn new(property: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            column: column.into(),
            role: FieldRole::Normal,
            auto_increment: false,
            insertable: true,
            updatable: true,
            update_default: None,
            marker: None,
        }
    }

    /// Mark as the primary key column.
    pub fn primary(mut self) -> Self {
        self.role = FieldRole::PrimaryId;
        self
    }

    /// Mark as an auto-increment primary key.
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Mark as the optimistic-lock version column.
    pub fn version(mut self) -> Self {
        self.role = FieldRole::LockVersion;
        self
    }

    /// Mark as the logical-delete column with the given marker kind.
    pub fn logic_delete(mut self, marker: DeleteMarker) -> Self {
        self.role = FieldRole::LogicDeleted;
        self.marker = Some(marker);
        self
    }

    /// Set the default assignment applied when an update does not set this
    /// column explicitly.
    pub fn update_default(mut self, expr: impl Into<String>) -> Self {
        self.update_default = Some(expr.into());
        self
    }

    /// Exclude this column from INSERT column lists.
    pub fn not_insertable(mut self) -> Self {
        self.insertable = false;
        self
    }

    /// Exclude this column from UPDATE assignments.
    pub fn not_updatable(mut self) -> Self {
        self.updatable = false;
        self
    }
}

/// Column metadata for one entity type, with O(1) role lookup.
#[derive(Clone, Debug)]
pub struct TableMapping {
    table: String,
    fields: Vec<FieldMeta>,
    primary: Option<usize>,
    version: Option<usize>,
    logic_delete: Option<usize>,
}

impl TableMapping {
    /// Build a mapping, validating that each special role appears at most
    /// once.
    pub fn new(table: impl Into<String>, fields: Vec<FieldMeta>) -> SqlResult<Self> {
        let table = table.into();
        if table.is_empty() {
            return Err(SqlError::validation("table name cannot be empty"));
        }
        if fields.is_empty() {
            return Err(SqlError::validation(format!(
                "mapping for table '{table}' has no fields"
            )));
        }
        let mut primary = None;
        let mut version = None;
        let mut logic_delete = None;
        for (i, field) in fields.iter().enumerate() {
            let slot = match field.role {
                FieldRole::PrimaryId => &mut primary,
                FieldRole::LockVersion => &mut version,
                FieldRole::LogicDeleted => &mut logic_delete,
                FieldRole::Normal => continue,
            };
            if slot.is_some() {
                return Err(SqlError::configuration(format!(
                    "table '{table}' declares more than one {:?} field",
                    field.role
                )));
            }
            *slot = Some(i);
        }
        Ok(Self {
            table,
            fields,
            primary,
            version,
            logic_delete,
        })
    }

    /// Static table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// All mapped fields in declaration order.
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    /// The primary key field, if declared.
    pub fn primary(&self) -> Option<&FieldMeta> {
        self.primary.map(|i| &self.fields[i])
    }

    /// The primary key field, or a configuration error if none is declared.
    pub fn primary_required(&self) -> SqlResult<&FieldMeta> {
        self.primary().ok_or_else(|| {
            SqlError::configuration(format!(
                "table '{}' declares no primary key field",
                self.table
            ))
        })
    }

    /// The optimistic-lock version field, if declared.
    pub fn version(&self) -> Option<&FieldMeta> {
        self.version.map(|i| &self.fields[i])
    }

    /// The logical-delete field, if declared.
    pub fn logic_delete(&self) -> Option<&FieldMeta> {
        self.logic_delete.map(|i| &self.fields[i])
    }

    /// Find a field by its property name.
    pub fn field(&self, property: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.property == property)
    }

    /// Insertable fields in declaration order; the primary key is included
    /// iff `with_pk`.
    pub fn insert_fields(&self, with_pk: bool) -> Vec<&FieldMeta> {
        self.fields
            .iter()
            .filter(|f| f.insertable && (with_pk || f.role != FieldRole::PrimaryId))
            .collect()
    }

    /// All mapped column names, for SELECT lists.
    pub fn select_columns(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.column.as_str()).collect()
    }
}

/// Per-row capabilities the orchestrator needs from an entity instance.
///
/// The engine renders parameter paths, not values, so the surface is small:
/// primary-key presence for insert policy, an optional table override for
/// dynamic sharding, and value lookup so bindings can carry the value when
/// the execution layer binds positionally.
pub trait Entity {
    /// Whether the primary key property currently holds a value.
    fn primary_is_set(&self) -> bool;

    /// Which physical table this row belongs to, for sharded entities.
    /// `None` means the mapping's static table name.
    fn table_override(&self) -> Option<String> {
        None
    }

    /// Current value of a property, by property name.
    fn value(&self, property: &str) -> Option<Param>;
}
