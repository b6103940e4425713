use std::collections::HashMap;

/// Flat product-type node as read from storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeNode {
    pub id: i64,
    pub label: String,
    pub parent_id: Option<i64>,
    pub has_details: bool,
}

/// A node of the assembled forest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
    pub id: i64,
    pub label: String,
    pub parent_id: Option<i64>,
    pub has_details: bool,
    pub children: Vec<TreeNode>,
}

/// Assemble a flat node list into a rooted forest.
///
/// Tolerant builder: a node whose declared parent is not in the input
/// becomes a root instead of being dropped. Ordering within roots and
/// within each children list follows the input sequence; no sorting is
/// performed here (callers pass the list pre-sorted by id ascending for
/// deterministic output). No cycle detection; the create/update API
/// cannot produce a cyclic parent chain.
pub fn build_tree(nodes: Vec<TypeNode>) -> Vec<TreeNode> {
    let mut known: HashMap<i64, TypeNode> = HashMap::with_capacity(nodes.len());
    for node in &nodes {
        known.insert(node.id, node.clone());
    }

    let mut roots: Vec<i64> = Vec::new();
    let mut children_of: HashMap<i64, Vec<i64>> = HashMap::new();
    for node in &nodes {
        match node.parent_id {
            Some(parent_id) if known.contains_key(&parent_id) => {
                children_of.entry(parent_id).or_default().push(node.id);
            }
            // Null parent, or a dangling reference: treat as root.
            _ => roots.push(node.id),
        }
    }

    roots
        .into_iter()
        .map(|id| assemble(id, &known, &mut children_of))
        .collect()
}

fn assemble(
    id: i64,
    known: &HashMap<i64, TypeNode>,
    children_of: &mut HashMap<i64, Vec<i64>>,
) -> TreeNode {
    let node = &known[&id];
    let children = children_of
        .remove(&id)
        .unwrap_or_default()
        .into_iter()
        .map(|child_id| assemble(child_id, known, children_of))
        .collect();
    TreeNode {
        id: node.id,
        label: node.label.clone(),
        parent_id: node.parent_id,
        has_details: node.has_details,
        children,
    }
}

/// Flatten a forest back to its node list, pre-order, roots first.
pub fn flatten(forest: &[TreeNode]) -> Vec<TypeNode> {
    let mut out = Vec::new();
    for root in forest {
        flatten_into(root, &mut out);
    }
    out
}

fn flatten_into(node: &TreeNode, out: &mut Vec<TypeNode>) {
    out.push(TypeNode {
        id: node.id,
        label: node.label.clone(),
        parent_id: node.parent_id,
        has_details: node.has_details,
    });
    for child in &node.children {
        flatten_into(child, out);
    }
}
