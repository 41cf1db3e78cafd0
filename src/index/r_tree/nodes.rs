use super::*;

use crate::geometry::{planar::*, Extending, HasArea, Intersecting};

use get_size::GetSize;
use std::{cmp::Ordering, collections::VecDeque, mem};

pub(super) type NodeId = usize;

/// An R*-tree over anything with a lon/lat rectangle.
///
/// Nodes live in a single arena and refer to each other by index.
#[derive(Debug, Clone, GetSize)]
pub struct RTree<V> {
    root: NodeId,
    nodes: Vec<Node<V>>,
    len: usize,
}

impl<V> RTree<V>
where
    V: AsRef<Rectangle>,
{
    pub fn new() -> Self {
        RTree {
            root: 0,
            nodes: vec![Node::Leaf(Leaf::new(None))],
            len: 0,
        }
    }

    /// Creates an empty tree designed to take `capacity` elements
    pub fn with_capacity(capacity: usize) -> Self {
        // assume all nodes are half-filled
        let avg_fill_degree = NODE_WIDTH / 2;
        let mut num_nodes = capacity / avg_fill_degree + 1;
        let mut last_summand = num_nodes;
        let mut level = 1;
        while last_summand > 0 {
            level += 1;
            last_summand = capacity / avg_fill_degree.pow(level);
            num_nodes += last_summand;
        }
        let mut nodes = Vec::with_capacity(num_nodes);
        nodes.push(Node::Leaf(Leaf::new(None)));
        RTree {
            root: 0,
            nodes,
            len: 0,
        }
    }

    /// Number of values in the tree
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of nodes, leaves included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Search for all values in this tree whose rectangle intersects with `geometry`
    pub fn search<G>(&self, geometry: &G) -> Vec<&V>
    where
        G: Intersecting<Rectangle>,
    {
        let mut results: Vec<&V> = Vec::new();

        let mut to_search: VecDeque<NodeId> = VecDeque::with_capacity(1);
        to_search.push_back(self.root);

        while let Some(current) = to_search.pop_front() {
            match &self.nodes[current] {
                Node::Internal(node) => {
                    for ChildEntry(bounds, id) in node.children.iter() {
                        if geometry.intersects(bounds) {
                            to_search.push_back(*id);
                        }
                    }
                }
                Node::Leaf(leaf) => {
                    results.extend(
                        leaf.values
                            .iter()
                            .filter(|value| geometry.intersects(value.as_ref())),
                    );
                }
            }
        }
        results
    }

    /// Updates the tree to include `value`
    pub fn insert(&mut self, value: V) {
        let target_leaf = self.choose_leaf(value.as_ref());
        let Node::Leaf(leaf) = &mut self.nodes[target_leaf] else {
            panic!("Node {} chosen for insertion is not a leaf", target_leaf);
        };
        let split = if leaf.has_space() {
            leaf.values.push(value);
            None
        } else {
            // Take a full target leaf plus `value`
            // and spread them over the leaf and a new sibling
            let mut values = mem::take(&mut leaf.values);
            values.push(value);
            let (left, right) = find_split(values, MIN_FILL, NODE_WIDTH);
            leaf.values = left;
            let parent = leaf.parent;
            let mut sibling = Leaf::new(parent);
            sibling.values = right;
            Some(self.push_node(Node::Leaf(sibling)))
        };
        self.adjust_tree(target_leaf, split);
        self.len += 1;
    }

    fn push_node(&mut self, node: Node<V>) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn choose_leaf(&self, rectangle: &Rectangle) -> NodeId {
        let mut current = self.root;
        while let Node::Internal(node) = &self.nodes[current] {
            match node.best_fit(rectangle) {
                Some(best_id) => current = best_id,
                None => break,
            }
        }
        current
    }

    fn adjust_tree(&mut self, mut node: NodeId, mut split_node_opt: Option<NodeId>) {
        while let Some(parent_id) = self.nodes[node].parent() {
            let node_box = self.bounding_box(node);
            let split_entry = split_node_opt.map(|split_id| ChildEntry(self.bounding_box(split_id), split_id));
            let parent = self.internal_mut(parent_id);
            parent.update_bounding_box(node, node_box);
            let overflowing = match split_entry {
                Some(entry) => {
                    parent.children.push(entry);
                    parent.children.len() > NODE_WIDTH
                }
                None => false,
            };
            if let Some(ChildEntry(_, split_id)) = split_entry {
                self.nodes[split_id].set_parent(parent_id);
            }
            // set up next iteration
            split_node_opt = if overflowing {
                Some(self.split_internal(parent_id))
            } else {
                None
            };
            node = parent_id;
        }
        // done when node is root
        if let Some(split_node) = split_node_opt {
            // grow tree
            let children = vec![
                ChildEntry(self.bounding_box(node), node),
                ChildEntry(self.bounding_box(split_node), split_node),
            ];
            let new_root = self.push_node(Node::Internal(InternalNode {
                parent: None,
                children,
            }));
            self.nodes[node].set_parent(new_root);
            self.nodes[split_node].set_parent(new_root);
            self.root = new_root;
        }
    }

    /// Take an overflowing `node`, and spread its children over it and a new sibling
    fn split_internal(&mut self, node: NodeId) -> NodeId {
        let internal = self.internal_mut(node);
        let children = mem::take(&mut internal.children);
        let parent = internal.parent;
        let (left, right) = find_split(children, MIN_FILL, NODE_WIDTH);
        internal.children = left;
        let moved: Vec<NodeId> = right.iter().map(|ChildEntry(_, id)| *id).collect();
        let sibling = self.push_node(Node::Internal(InternalNode {
            parent,
            children: right,
        }));
        for id in moved {
            self.nodes[id].set_parent(sibling);
        }
        sibling
    }

    fn internal_mut(&mut self, id: NodeId) -> &mut InternalNode {
        match &mut self.nodes[id] {
            Node::Internal(node) => node,
            Node::Leaf(_) => panic!("Node {} is a leaf, not an internal node", id),
        }
    }

    fn bounding_box(&self, id: NodeId) -> Rectangle {
        match &self.nodes[id] {
            Node::Internal(node) => Rectangle::bound_all(node.children.iter().map(|c| &c.0)),
            Node::Leaf(leaf) => Rectangle::bound_all(leaf.values.iter().map(|v| v.as_ref())),
        }
    }

    /// Checks the whole tree to determine it is sound
    pub fn assert_invariants(&self) {
        let mut to_search: VecDeque<NodeId> = VecDeque::with_capacity(1);
        to_search.push_back(self.root);
        assert!(self.nodes[self.root].parent().is_none());
        let mut num_values = 0;
        while let Some(current_id) = to_search.pop_front() {
            let is_root = current_id == self.root;
            match &self.nodes[current_id] {
                Node::Internal(node) => {
                    node.assert_invariants(is_root);
                    for ChildEntry(bbox, id) in node.children.iter() {
                        assert!(
                            bbox.contains(&self.bounding_box(*id)),
                            "Entry {} of node {} does not cover its child",
                            bbox,
                            current_id
                        );
                        let child_parent = self.nodes[*id].parent().expect("must have parent");
                        assert_eq!(child_parent, current_id);
                        to_search.push_back(*id);
                    }
                }
                Node::Leaf(leaf) => {
                    leaf.assert_invariants(is_root);
                    num_values += leaf.values.len();
                }
            }
        }
        assert_eq!(self.len, num_values);
    }
}

impl<V> Default for RTree<V>
where
    V: AsRef<Rectangle>,
{
    fn default() -> Self {
        RTree::new()
    }
}

#[derive(Debug, Clone, GetSize)]
enum Node<V> {
    Internal(InternalNode),
    Leaf(Leaf<V>),
}

impl<V> Node<V> {
    fn parent(&self) -> Option<NodeId> {
        match self {
            Node::Internal(n) => n.parent,
            Node::Leaf(l) => l.parent,
        }
    }

    fn set_parent(&mut self, parent_id: NodeId) {
        match self {
            Node::Internal(n) => n.parent = Some(parent_id),
            Node::Leaf(l) => l.parent = Some(parent_id),
        }
    }
}

#[derive(Debug, Clone, GetSize)]
struct Leaf<V> {
    parent: Option<NodeId>,
    values: Vec<V>,
}

impl<V> Leaf<V> {
    fn new(parent: Option<NodeId>) -> Self {
        Leaf {
            parent,
            values: Vec::with_capacity(NODE_WIDTH),
        }
    }

    fn has_space(&self) -> bool {
        self.values.len() < NODE_WIDTH
    }

    fn assert_invariants(&self, is_root: bool) {
        assert!(self.values.len() <= NODE_WIDTH);
        if !is_root {
            assert!(MIN_FILL <= self.values.len());
        }
    }
}

#[derive(Debug, Clone, Copy, GetSize)]
struct ChildEntry(Rectangle, NodeId);

impl AsRef<Rectangle> for ChildEntry {
    fn as_ref(&self) -> &Rectangle {
        &self.0
    }
}

#[derive(Debug, Clone, GetSize)]
struct InternalNode {
    parent: Option<NodeId>,
    children: Vec<ChildEntry>,
}

impl InternalNode {
    fn update_bounding_box(&mut self, at_node_id: NodeId, new_bounding_box: Rectangle) {
        let entry = self.children.iter_mut().find(|ChildEntry(_, id)| *id == at_node_id);
        debug_assert!(entry.is_some(), "No entry matched node id={}", at_node_id);
        if let Some(ChildEntry(bbox, _)) = entry {
            *bbox = new_bounding_box;
        }
    }

    /// The child needing the least enlargement to include `rectangle`,
    /// with ties going to the smaller child
    fn best_fit(&self, rectangle: &Rectangle) -> Option<NodeId> {
        self.children
            .iter()
            .min_by(|l, r| {
                let l_enlargement = rectangle.extend_area(l.0);
                let r_enlargement = rectangle.extend_area(r.0);
                match l_enlargement.total_cmp(&r_enlargement) {
                    Ordering::Equal => l.0.area().total_cmp(&r.0.area()),
                    unequal => unequal,
                }
            })
            .map(|ChildEntry(_, id)| *id)
    }

    fn assert_invariants(&self, is_root: bool) {
        assert!(self.children.len() <= NODE_WIDTH);
        if !is_root {
            assert!(MIN_FILL <= self.children.len());
        } else {
            assert!(2 <= self.children.len());
        }
    }
}
