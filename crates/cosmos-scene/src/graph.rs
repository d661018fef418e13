//! Flat scene graph: the root owns every inserted node until it is removed.

use std::collections::BTreeMap;
use std::sync::Arc;

use cosmos_bodies::{Color, GeneratedObject};
use glam::Vec3;

/// Stable handle to a node in a [`SceneGraph`]. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A drawable entry in the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Every vertex of the object drawn as one point batch.
    PointCloud { object: Arc<GeneratedObject> },
    /// One placed copy of a triangle mesh, tinted by `color`.
    Mesh {
        object: Arc<GeneratedObject>,
        position: Vec3,
        color: Color,
    },
}

impl Node {
    pub fn object(&self) -> &Arc<GeneratedObject> {
        match self {
            Node::PointCloud { object } | Node::Mesh { object, .. } => object,
        }
    }
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, Node>,
    next_id: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    /// Detach a node, handing ownership back to the caller.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
