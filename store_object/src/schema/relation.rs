//! Introspected relation schemas

use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use type_mapping::ColumnDescriptor;

use crate::errors::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Table,
    View,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Table => "table",
            RelationKind::View => "view",
        }
    }
}

/// Columns and key of one table or view
#[derive(Debug, Clone, PartialEq)]
pub struct RelationSchema {
    pub kind: RelationKind,
    pub namespace: String,
    pub name: String,
    columns: Vec<ColumnDescriptor>,
    index: HashMap<String, usize>,
    pub primary_key: Option<String>,
}

impl RelationSchema {
    pub fn new(kind: RelationKind, namespace: &str, name: &str) -> Self {
        Self {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
            columns: Vec::new(),
            index: HashMap::new(),
            primary_key: None,
        }
    }

    /// Add a column; a repeated name replaces the earlier descriptor in place
    pub fn push_column(&mut self, column: ColumnDescriptor) {
        match self.index.get(&column.name) {
            Some(&position) => self.columns[position] = column,
            None => {
                self.index.insert(column.name.clone(), self.columns.len());
                self.columns.push(column);
            }
        }
    }

    pub fn with_primary_key(mut self, column: &str) -> Self {
        self.primary_key = Some(column.to_string());
        self
    }

    /// Columns in catalog order
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.index.get(name).map(|&position| &self.columns[position])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Like [`RelationSchema::column`], failing with `relation.column does not exist`
    pub fn require_column(&self, name: &str) -> Result<&ColumnDescriptor, StoreError> {
        self.column(name)
            .ok_or_else(|| StoreError::missing_column(&self.name, name))
    }

    /// Every introspected column is required
    pub fn required_columns(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// `relation.column` label used in error messages
    pub fn column_id(&self, column: &str) -> String {
        format!("{}.{}", self.name, column)
    }

    /// JSON-Schema object describing the relation
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .columns
            .iter()
            .map(|c| (c.name.clone(), c.to_json_schema()))
            .collect();

        json!({
            "type": "object",
            "additionalProperties": false,
            "required": self.required_columns(),
            "properties": properties,
        })
    }
}

/// All tables and views of one namespace
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaCatalog {
    pub tables: BTreeMap<String, Arc<RelationSchema>>,
    pub views: BTreeMap<String, Arc<RelationSchema>>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, relation: RelationSchema) {
        let name = relation.name.clone();
        match relation.kind {
            RelationKind::Table => self.tables.insert(name, Arc::new(relation)),
            RelationKind::View => self.views.insert(name, Arc::new(relation)),
        };
    }

    pub fn relation(&self, kind: RelationKind, name: &str) -> Option<Arc<RelationSchema>> {
        match kind {
            RelationKind::Table => self.tables.get(name).cloned(),
            RelationKind::View => self.views.get(name).cloned(),
        }
    }

    pub fn table(&self, name: &str) -> Option<Arc<RelationSchema>> {
        self.relation(RelationKind::Table, name)
    }

    pub fn view(&self, name: &str) -> Option<Arc<RelationSchema>> {
        self.relation(RelationKind::View, name)
    }

    /// Tables first, then views, each sorted by name
    pub fn relations(&self) -> impl Iterator<Item = &Arc<RelationSchema>> {
        self.tables.values().chain(self.views.values())
    }

    pub fn len(&self) -> usize {
        self.tables.len() + self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `{ "tables": { name: schema }, "views": { name: schema } }`
    pub fn to_persistable(&self) -> Value {
        let render = |relations: &BTreeMap<String, Arc<RelationSchema>>| -> Map<String, Value> {
            relations
                .iter()
                .map(|(name, relation)| (name.clone(), relation.to_json_schema()))
                .collect()
        };

        json!({
            "tables": render(&self.tables),
            "views": render(&self.views),
        })
    }
}
