//! Selection sets — which fields a live query returns.
//!
//! DESIGN
//! ======
//! A selection set is a list of dotted paths rooted at one record kind:
//! `"name"`, `"locations.location.name"`, `"games.game.*"`. Parsing turns
//! the paths into a field tree validated against `ModelKind` metadata, so
//! a bad path fails at subscribe time rather than silently returning holes.
//!
//! Projection walks a `RecordGraph` (one full table per kind) through the
//! tree. Has-many relations become arrays, belongs-to relations become an
//! object or `null` when the referenced record no longer exists. Dangling
//! join rows therefore surface as `{"location": null}` and it is up to the
//! caller to filter them.

use std::collections::{BTreeSet, HashMap};

use serde_json::{Map, Value};

use crate::model::{ModelKind, Relation};

pub type Record = Map<String, Value>;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("empty path segment in selection '{0}'")]
    EmptySegment(String),
    #[error("unknown field '{field}' on {kind}")]
    UnknownField { kind: ModelKind, field: String },
    #[error("'{field}' on {kind} is not a relationship")]
    NotARelation { kind: ModelKind, field: String },
    #[error("relationship '{field}' on {kind} needs a nested field")]
    MissingSubfields { kind: ModelKind, field: String },
}

impl crate::frame::ErrorCode for SelectionError {
    fn error_code(&self) -> &'static str {
        "E_SELECTION"
    }
}

// =============================================================================
// FIELD TREE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Node {
    scalars: Vec<&'static str>,
    relations: Vec<RelationNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RelationNode {
    field: String,
    relation: Relation,
    node: Node,
}

impl Node {
    fn add_scalar(&mut self, kind: ModelKind, field: &str) -> bool {
        let Some(name) = kind.scalar_fields().iter().find(|f| **f == field) else {
            return false;
        };
        if !self.scalars.contains(name) {
            self.scalars.push(name);
        }
        true
    }

    fn add_all_scalars(&mut self, kind: ModelKind) {
        for field in kind.scalar_fields() {
            self.add_scalar(kind, field);
        }
    }

    fn relation_mut(&mut self, field: &str, relation: Relation) -> &mut Node {
        let idx = match self.relations.iter().position(|r| r.field == field) {
            Some(idx) => idx,
            None => {
                self.relations.push(RelationNode { field: field.to_owned(), relation, node: Node::default() });
                self.relations.len() - 1
            }
        };
        &mut self.relations[idx].node
    }

    fn collect_kinds(&self, out: &mut BTreeSet<ModelKind>) {
        for rel in &self.relations {
            out.insert(rel.relation.target());
            rel.node.collect_kinds(out);
        }
    }
}

/// Parsed, validated selection set rooted at one record kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSet {
    root: ModelKind,
    node: Node,
}

impl SelectionSet {
    /// Parse dotted paths. An empty list selects every scalar field of `root`.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectionError`] if a path names an unknown field, walks
    /// through a scalar, or stops on a relationship.
    pub fn parse<S: AsRef<str>>(root: ModelKind, paths: &[S]) -> Result<Self, SelectionError> {
        let mut node = Node::default();
        if paths.is_empty() {
            node.add_all_scalars(root);
            return Ok(Self { root, node });
        }

        for path in paths {
            let path = path.as_ref();
            let segments: Vec<&str> = path.split('.').collect();
            if segments.iter().any(|s| s.trim().is_empty()) {
                return Err(SelectionError::EmptySegment(path.to_owned()));
            }
            add_path(&mut node, root, &segments)?;
        }

        Ok(Self { root, node })
    }

    /// Default selection: every scalar field of `root`, no relationships.
    #[must_use]
    pub fn scalars(root: ModelKind) -> Self {
        let mut node = Node::default();
        node.add_all_scalars(root);
        Self { root, node }
    }

    #[must_use]
    pub fn root(&self) -> ModelKind {
        self.root
    }

    /// Every record kind this selection reads. A mutation of any of them
    /// changes the query result.
    #[must_use]
    pub fn dependencies(&self) -> BTreeSet<ModelKind> {
        let mut out = BTreeSet::new();
        out.insert(self.root);
        self.node.collect_kinds(&mut out);
        out
    }

    /// Project every root record of `graph` through this selection.
    #[must_use]
    pub fn project_all(&self, graph: &RecordGraph) -> Vec<Value> {
        graph
            .records(self.root)
            .iter()
            .map(|record| project_node(&self.node, record, graph))
            .collect()
    }
}

fn add_path(node: &mut Node, kind: ModelKind, segments: &[&str]) -> Result<(), SelectionError> {
    let Some((&head, rest)) = segments.split_first() else {
        return Ok(());
    };

    if rest.is_empty() {
        if head == "*" {
            node.add_all_scalars(kind);
            return Ok(());
        }
        if node.add_scalar(kind, head) {
            return Ok(());
        }
        if kind.relation(head).is_some() {
            return Err(SelectionError::MissingSubfields { kind, field: head.to_owned() });
        }
        return Err(SelectionError::UnknownField { kind, field: head.to_owned() });
    }

    let Some(relation) = kind.relation(head) else {
        if kind.has_scalar(head) {
            return Err(SelectionError::NotARelation { kind, field: head.to_owned() });
        }
        return Err(SelectionError::UnknownField { kind, field: head.to_owned() });
    };

    let child = node.relation_mut(head, relation);
    add_path(child, relation.target(), rest)
}

fn project_node(node: &Node, record: &Record, graph: &RecordGraph) -> Value {
    let mut out = Map::new();

    for field in &node.scalars {
        out.insert((*field).to_owned(), record.get(*field).cloned().unwrap_or(Value::Null));
    }

    for rel in &node.relations {
        let value = match rel.relation {
            Relation::HasMany { target, foreign_key } => {
                let id = record.get("id");
                let items = graph
                    .records(target)
                    .iter()
                    .filter(|r| id.is_some() && r.get(foreign_key) == id)
                    .map(|r| project_node(&rel.node, r, graph))
                    .collect();
                Value::Array(items)
            }
            Relation::BelongsTo { target, foreign_key } => record
                .get(foreign_key)
                .and_then(Value::as_str)
                .and_then(|id| graph.find(target, id))
                .map_or(Value::Null, |r| project_node(&rel.node, r, graph)),
        };
        out.insert(rel.field.clone(), value);
    }

    Value::Object(out)
}

// =============================================================================
// RECORD GRAPH
// =============================================================================

/// Full tables of every kind a query needs, as JSON records keyed by the
/// camelCase wire names.
#[derive(Debug, Clone, Default)]
pub struct RecordGraph {
    tables: HashMap<ModelKind, Vec<Record>>,
    index: HashMap<(ModelKind, String), usize>,
}

impl RecordGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the table for `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if a record does not serialize to a JSON object.
    pub fn insert_table<T: serde::Serialize>(&mut self, kind: ModelKind, rows: &[T]) -> Result<(), serde_json::Error> {
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            match serde_json::to_value(row)? {
                Value::Object(map) => records.push(map),
                other => {
                    return Err(serde::ser::Error::custom(format!("expected object record, got {other}")));
                }
            }
        }

        self.index.retain(|(k, _), _| *k != kind);
        for (pos, record) in records.iter().enumerate() {
            if let Some(id) = record.get("id").and_then(Value::as_str) {
                self.index.insert((kind, id.to_owned()), pos);
            }
        }
        self.tables.insert(kind, records);
        Ok(())
    }

    #[must_use]
    pub fn records(&self, kind: ModelKind) -> &[Record] {
        self.tables.get(&kind).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn find(&self, kind: ModelKind, id: &str) -> Option<&Record> {
        let pos = *self.index.get(&(kind, id.to_owned()))?;
        self.tables.get(&kind)?.get(pos)
    }
}

#[cfg(test)]
#[path = "selection_test.rs"]
mod tests;
