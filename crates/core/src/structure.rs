//! Hierarchical document structure: node types, materialized paths, tree
//! reconstruction and whole-tree sync planning.
//!
//! A node's `path` is the dot-joined list of its ancestors' ids followed by
//! its own id (`"12.45.78"`). Descendants of `p` are the nodes whose path
//! starts with `"p."`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Separator between ids in a materialized path.
pub const PATH_SEPARATOR: char = '.';

/// Maximum nesting depth accepted from clients.
pub const MAX_DEPTH: usize = 12;

// ---------------------------------------------------------------------------
// Node type
// ---------------------------------------------------------------------------

/// Structural division of a legal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Book,
    Part,
    Title,
    Chapter,
    Section,
    Subsection,
}

impl NodeType {
    pub const ALL: [NodeType; 6] = [
        Self::Book,
        Self::Part,
        Self::Title,
        Self::Chapter,
        Self::Section,
        Self::Subsection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Part => "part",
            Self::Title => "title",
            Self::Chapter => "chapter",
            Self::Section => "section",
            Self::Subsection => "subsection",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == value)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid node_type '{value}'. Valid types: {}",
                    Self::ALL.map(|t| t.as_str()).join(", ")
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Materialized paths
// ---------------------------------------------------------------------------

/// Path of a node with id `id` under `parent_path` (or at the root).
pub fn child_path(parent_path: Option<&str>, id: DbId) -> String {
    match parent_path {
        Some(parent) => format!("{parent}{PATH_SEPARATOR}{id}"),
        None => id.to_string(),
    }
}

/// Depth of a node (root nodes have depth 1).
pub fn depth(path: &str) -> usize {
    path.split(PATH_SEPARATOR).count()
}

/// Whether `path` lies strictly below `ancestor`.
pub fn is_descendant_path(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path[ancestor.len()..].starts_with(PATH_SEPARATOR)
}

/// Validate moving the node at `node_path` under `new_parent_path`.
pub fn validate_move(node_path: &str, new_parent_path: Option<&str>) -> Result<(), CoreError> {
    if let Some(parent) = new_parent_path {
        if parent == node_path || is_descendant_path(parent, node_path) {
            return Err(CoreError::Validation(
                "A node cannot be moved under itself or one of its descendants".into(),
            ));
        }
        if depth(parent) + 1 > MAX_DEPTH {
            return Err(CoreError::Validation(format!(
                "Structure nesting is limited to {MAX_DEPTH} levels"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tree reconstruction
// ---------------------------------------------------------------------------

/// Flat item that can be arranged into a tree.
pub trait TreeItem {
    fn id(&self) -> DbId;
    fn parent_id(&self) -> Option<DbId>;
    fn sort_order(&self) -> i32;
}

/// A node with its children, ready for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode<T> {
    #[serde(flatten)]
    pub item: T,
    pub children: Vec<TreeNode<T>>,
}

/// Rebuild a nested tree from a flat list.
///
/// Siblings are ordered by `(sort_order, id)`. Items whose parent is not in
/// the list become roots, so a partial subtree listing still renders.
pub fn build_tree<T: TreeItem>(items: Vec<T>) -> Vec<TreeNode<T>> {
    let ids: HashSet<DbId> = items.iter().map(TreeItem::id).collect();
    let mut children_of: HashMap<Option<DbId>, Vec<T>> = HashMap::new();

    for item in items {
        let parent = item.parent_id().filter(|p| ids.contains(p));
        children_of.entry(parent).or_default().push(item);
    }

    fn attach<T: TreeItem>(
        parent: Option<DbId>,
        children_of: &mut HashMap<Option<DbId>, Vec<T>>,
    ) -> Vec<TreeNode<T>> {
        let mut level = children_of.remove(&parent).unwrap_or_default();
        level.sort_by_key(|item| (item.sort_order(), item.id()));
        level
            .into_iter()
            .map(|item| {
                let children = attach(Some(item.id()), children_of);
                TreeNode { item, children }
            })
            .collect()
    }

    attach(None, &mut children_of)
}

// ---------------------------------------------------------------------------
// Whole-tree sync
// ---------------------------------------------------------------------------

/// A node as sent by the curation UI when saving a whole structure.
///
/// `key` is a client-side identifier (an existing id as text or a temporary
/// key for new nodes); `parent_key` refers to another item's `key`.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncNode {
    pub key: String,
    pub parent_key: Option<String>,
    pub node_type: String,
    pub number: Option<String>,
    pub title: Option<String>,
}

/// One node of a validated sync plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedNode {
    /// Index into the original input slice.
    pub index: usize,
    pub node_type: NodeType,
    /// Position among siblings, in input order starting at 0.
    pub sort_order: i32,
}

/// Validate a flat structure and order it parents-first.
///
/// Rejects duplicate keys, unknown parent keys, cycles, invalid node types
/// and trees deeper than [`MAX_DEPTH`].
pub fn plan_sync(nodes: &[SyncNode]) -> Result<Vec<PlannedNode>, CoreError> {
    let mut index_of: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        if node.key.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Structure node at position {i} has an empty key"
            )));
        }
        if index_of.insert(node.key.as_str(), i).is_some() {
            return Err(CoreError::Validation(format!(
                "Duplicate structure key '{}'",
                node.key
            )));
        }
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut roots = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        match node.parent_key.as_deref() {
            None => roots.push(i),
            Some(parent_key) => {
                let parent = *index_of.get(parent_key).ok_or_else(|| {
                    CoreError::Validation(format!(
                        "Structure node '{}' references unknown parent '{parent_key}'",
                        node.key
                    ))
                })?;
                children[parent].push(i);
            }
        }
    }

    // Breadth-first from the roots; anything unreached sits on a cycle.
    let mut planned = Vec::with_capacity(nodes.len());
    let mut frontier: Vec<(usize, i32, usize)> = roots
        .iter()
        .enumerate()
        .map(|(pos, &i)| (i, pos as i32, 1))
        .collect();

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for (i, sort_order, level) in frontier {
            if level > MAX_DEPTH {
                return Err(CoreError::Validation(format!(
                    "Structure nesting is limited to {MAX_DEPTH} levels"
                )));
            }
            planned.push(PlannedNode {
                index: i,
                node_type: NodeType::parse(&nodes[i].node_type)?,
                sort_order,
            });
            next.extend(
                children[i]
                    .iter()
                    .enumerate()
                    .map(|(pos, &child)| (child, pos as i32, level + 1)),
            );
        }
        frontier = next;
    }

    if planned.len() != nodes.len() {
        let reached: HashSet<usize> = planned.iter().map(|p| p.index).collect();
        let stuck = nodes
            .iter()
            .enumerate()
            .find(|(i, _)| !reached.contains(i))
            .map(|(_, n)| n.key.as_str())
            .unwrap_or_default();
        return Err(CoreError::Validation(format!(
            "Structure contains a cycle involving '{stuck}'"
        )));
    }

    Ok(planned)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
