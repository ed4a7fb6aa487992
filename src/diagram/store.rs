use rand::Rng;
use uuid::Uuid;

use super::model::{
    ArrowMarker, BIDIRECTIONAL_EDGE_TYPE, DEFAULT_EDGE_NAME, Edge, ElementData, MetadataPatch, Node,
    NodeId, NodeKind, Position, Selection,
};

/// Half-width of the square new nodes are scattered in.
pub const DEFAULT_SPAWN_EXTENT: f32 = 100.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ZDirection {
    ToFront,
    Up,
    Down,
    ToBack,
}

/// Owns the live node and edge sequences of one editing session.
///
/// Node order is the z-order: index 0 is drawn first, the last node is
/// topmost. Every edge endpoint refers to a node in the sequence.
#[derive(Clone, Debug)]
pub struct DiagramStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    selected: Option<Selection>,
    dirty: bool,
    spawn_extent: f32,
}

impl Default for DiagramStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagramStore {
    pub fn new() -> Self {
        Self::with_spawn_extent(DEFAULT_SPAWN_EXTENT)
    }

    pub fn with_spawn_extent(spawn_extent: f32) -> Self {
        let spawn_extent = if spawn_extent.is_finite() { spawn_extent.abs().max(1.0) } else { DEFAULT_SPAWN_EXTENT };
        DiagramStore {
            nodes: Vec::new(),
            edges: Vec::new(),
            selected: None,
            dirty: false,
            spawn_extent,
        }
    }

    pub fn nodes(&self) -> &[Node] { &self.nodes }
    pub fn edges(&self) -> &[Edge] { &self.edges }
    pub fn selection(&self) -> Option<Selection> { self.selected }
    pub fn is_dirty(&self) -> bool { self.dirty }
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() && self.edges.is_empty() }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: Uuid) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn mark_dirty(&mut self) { self.dirty = true; }
    pub fn mark_clean(&mut self) { self.dirty = false; }

    // Add a node at a random spot around the origin and return it
    pub fn add_node(&mut self, kind: NodeKind) -> &Node {
        let mut rng = rand::thread_rng();
        let extent = self.spawn_extent;
        let position = Position::new(rng.gen_range(-extent..extent), rng.gen_range(-extent..extent));
        let node = Node {
            id: Uuid::now_v7(),
            kind,
            position,
            data: ElementData::named(kind.tag()),
        };
        log::debug!("add {} node {}", kind, node.id);
        self.nodes.push(node);
        self.dirty = true;
        &self.nodes[self.nodes.len() - 1]
    }

    // Connect two existing nodes; parallel and reverse edges are allowed
    pub fn connect(&mut self, source: NodeId, target: NodeId) -> Option<&Edge> {
        if self.node(source).is_none() || self.node(target).is_none() {
            log::warn!("ignoring connect {} -> {}: unknown endpoint", source, target);
            return None;
        }
        let edge = Edge {
            id: Uuid::now_v7(),
            source,
            target,
            kind: BIDIRECTIONAL_EDGE_TYPE.to_string(),
            data: ElementData::named(DEFAULT_EDGE_NAME),
            marker_end: Some(ArrowMarker::default()),
        };
        log::debug!("connect {} -> {} as {}", source, target, edge.id);
        self.edges.push(edge);
        self.dirty = true;
        Some(&self.edges[self.edges.len() - 1])
    }

    // Selection
    pub fn select(&mut self, id: Uuid) -> bool {
        if self.node(id).is_some() {
            self.selected = Some(Selection::Node(id));
            true
        } else if self.edge(id).is_some() {
            self.selected = Some(Selection::Edge(id));
            true
        } else {
            false
        }
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// A drag release selects the dragged node.
    pub fn finish_drag(&mut self, id: NodeId) -> bool {
        if self.node(id).is_some() {
            self.selected = Some(Selection::Node(id));
            true
        } else {
            false
        }
    }

    pub fn selected_data(&self) -> Option<&ElementData> {
        match self.selected? {
            Selection::Node(id) => self.node(id).map(|n| &n.data),
            Selection::Edge(id) => self.edge(id).map(|e| &e.data),
        }
    }

    pub fn move_node(&mut self, id: NodeId, position: Position) -> bool {
        if let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) {
            node.position = position;
            self.dirty = true;
            true
        } else {
            false
        }
    }

    /// Merge `patch` into the selected element. No-op without a selection.
    pub fn update_selected_metadata(&mut self, patch: &MetadataPatch) -> bool {
        let data = match self.selected {
            Some(Selection::Node(id)) => self.nodes.iter_mut().find(|n| n.id == id).map(|n| &mut n.data),
            Some(Selection::Edge(id)) => self.edges.iter_mut().find(|e| e.id == id).map(|e| &mut e.data),
            None => None,
        };
        match data {
            Some(data) => {
                data.apply(patch);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Move the selected node within the sequence. Only nodes carry a z-order.
    pub fn change_z_order(&mut self, direction: ZDirection) -> bool {
        let Some(Selection::Node(id)) = self.selected else { return false };
        let Some(index) = self.nodes.iter().position(|n| n.id == id) else { return false };
        let last = self.nodes.len() - 1;
        let new_index = match direction {
            ZDirection::ToFront => last,
            ZDirection::Up => (index + 1).min(last),
            ZDirection::Down => index.saturating_sub(1),
            ZDirection::ToBack => 0,
        };
        if new_index == index {
            return false;
        }
        let node = self.nodes.remove(index);
        self.nodes.insert(new_index, node);
        self.dirty = true;
        true
    }

    // Delete a node (cascading its edges) or an edge
    pub fn remove_element(&mut self, id: Uuid) -> bool {
        let removed = if let Some(index) = self.nodes.iter().position(|n| n.id == id) {
            self.nodes.remove(index);
            let before = self.edges.len();
            self.edges.retain(|e| e.source != id && e.target != id);
            log::debug!("removed node {} and {} edge(s)", id, before - self.edges.len());
            true
        } else if let Some(index) = self.edges.iter().position(|e| e.id == id) {
            self.edges.remove(index);
            true
        } else {
            false
        };
        if removed {
            // the selection may have pointed at a cascaded edge
            if let Some(sel) = self.selected {
                let still_there = match sel {
                    Selection::Node(sid) => self.node(sid).is_some(),
                    Selection::Edge(sid) => self.edge(sid).is_some(),
                };
                if !still_there {
                    self.selected = None;
                }
            }
            self.dirty = true;
        }
        removed
    }

    /// Replace all contents, e.g. after restoring a snapshot.
    pub fn replace_contents(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) {
        self.nodes = nodes;
        self.edges = edges;
        self.selected = None;
        self.dirty = false;
    }
}
