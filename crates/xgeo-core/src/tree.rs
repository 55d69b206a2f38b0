// crates/xgeo-core/src/tree.rs

//! # Untyped Payload Trees
//!
//! API responses are walked as an arena of nodes rather than as nested
//! `serde_json::Value`s. Containers hold [`NodeId`] links, which lets a tree
//! share subtrees or even point back at an ancestor. Every walker in this
//! crate carries a visited set of ids and a depth counter, so such shapes are
//! harmless.
//!
//! Lookups are total: asking an array for a key, or a string for a child,
//! yields `None` instead of an error.

use crate::error::Result;
use serde_json::{Map, Number, Value};
use std::collections::HashSet;

/// Index of a node inside its [`Payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<NodeId>),
    /// Fields in the order `serde_json` yields them (sorted by key).
    Object(Vec<(String, NodeId)>),
}

/// An arena-backed JSON-shaped tree.
#[derive(Debug, Clone)]
pub struct Payload {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Payload {
    /// Parse raw response text.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        let mut payload = Payload {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        payload.root = payload.push_value(value);
        payload
    }

    fn push_value(&mut self, value: &Value) -> NodeId {
        let node = match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(*b),
            Value::Number(n) => Node::Number(n.clone()),
            Value::String(s) => Node::String(s.clone()),
            Value::Array(items) => {
                Node::Array(items.iter().map(|item| self.push_value(item)).collect())
            }
            Value::Object(map) => Node::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.push_value(v)))
                    .collect(),
            ),
        };
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            payload: self,
            id: self.root,
        }
    }

    /// Cursor for `id`, if it belongs to this payload.
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.0 < self.nodes.len()).then_some(NodeRef { payload: self, id })
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Point `parent[key]` at an existing node, replacing any previous field.
    ///
    /// This is how shared and cyclic structure is built. Returns `false` when
    /// `parent` is not an object or `target` is out of range.
    pub fn link(&mut self, parent: NodeId, key: &str, target: NodeId) -> bool {
        if target.0 >= self.nodes.len() {
            return false;
        }
        match self.nodes.get_mut(parent.0) {
            Some(Node::Object(fields)) => {
                match fields.iter_mut().find(|(k, _)| k.as_str() == key) {
                    Some(field) => field.1 = target,
                    None => fields.push((key.to_string(), target)),
                }
                true
            }
            _ => false,
        }
    }
}

impl From<&Value> for Payload {
    fn from(value: &Value) -> Self {
        Payload::from_value(value)
    }
}

/// A borrowed cursor into a [`Payload`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    payload: &'a Payload,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> &'a Node {
        &self.payload.nodes[self.id.0]
    }

    fn at(&self, id: NodeId) -> NodeRef<'a> {
        NodeRef {
            payload: self.payload,
            id,
        }
    }

    /// Field `key` of an object node.
    pub fn get(&self, key: &str) -> Option<NodeRef<'a>> {
        match self.node() {
            Node::Object(fields) => fields
                .iter()
                .find(|(k, _)| k.as_str() == key)
                .map(|(_, id)| self.at(*id)),
            _ => None,
        }
    }

    /// Field `key`, but only when its value is truthy.
    pub fn present(&self, key: &str) -> Option<NodeRef<'a>> {
        self.get(key).filter(NodeRef::is_truthy)
    }

    /// Follow a chain of object keys.
    pub fn path(&self, keys: &[&str]) -> Option<NodeRef<'a>> {
        keys.iter().try_fold(*self, |node, key| node.get(key))
    }

    /// String at the end of `keys`, if that is what lives there.
    pub fn str_at(&self, keys: &[&str]) -> Option<&'a str> {
        self.path(keys).and_then(|n| n.as_str())
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self.node() {
            Node::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.node() {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self.node(), Node::Object(_))
    }

    pub fn is_container(&self) -> bool {
        matches!(self.node(), Node::Object(_) | Node::Array(_))
    }

    /// JavaScript-style truthiness: `null`, `false`, `0` and `""` are falsy,
    /// containers are always truthy.
    pub fn is_truthy(&self) -> bool {
        match self.node() {
            Node::Null => false,
            Node::Bool(b) => *b,
            Node::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Node::String(s) => !s.is_empty(),
            Node::Array(_) | Node::Object(_) => true,
        }
    }

    /// A scalar rendered as text: non-empty strings as-is, numbers in
    /// decimal. Used for identity fields, which arrive as either.
    pub fn scalar_text(&self) -> Option<String> {
        match self.node() {
            Node::String(s) if !s.is_empty() => Some(s.clone()),
            Node::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// `(key, child)` pairs of an object; empty for anything else.
    pub fn entries(&self) -> impl Iterator<Item = (&'a str, NodeRef<'a>)> + 'a {
        let payload = self.payload;
        let fields: &'a [(String, NodeId)] = match self.node() {
            Node::Object(fields) => fields,
            _ => &[],
        };
        fields
            .iter()
            .map(move |(k, id)| (k.as_str(), NodeRef { payload, id: *id }))
    }

    /// Child nodes of an object (in field order) or an array (in index order).
    pub fn children(&self) -> Vec<NodeRef<'a>> {
        match self.node() {
            Node::Object(fields) => fields.iter().map(|(_, id)| self.at(*id)).collect(),
            Node::Array(items) => items.iter().map(|id| self.at(*id)).collect(),
            _ => Vec::new(),
        }
    }

    /// Export as a `serde_json::Value`.
    ///
    /// A node that is already being exported further up the current path is
    /// written as `null`, so cyclic payloads still export in finite time.
    pub fn to_value(&self) -> Value {
        let mut on_path = HashSet::new();
        self.export(&mut on_path)
    }

    fn export(&self, on_path: &mut HashSet<NodeId>) -> Value {
        if !on_path.insert(self.id) {
            return Value::Null;
        }
        let value = match self.node() {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Number(n) => Value::Number(n.clone()),
            Node::String(s) => Value::String(s.clone()),
            Node::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|id| self.at(*id).export(on_path))
                    .collect(),
            ),
            Node::Object(fields) => {
                let mut map = Map::new();
                for (k, id) in fields {
                    map.insert(k.clone(), self.at(*id).export(on_path));
                }
                Value::Object(map)
            }
        };
        on_path.remove(&self.id);
        value
    }
}
