use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Basic type aliases for clarity
pub type NodeId = Uuid;
pub type EdgeId = Uuid;

/// Rendering tag given to every edge created through `connect`.
pub const BIDIRECTIONAL_EDGE_TYPE: &str = "biDirectional";
/// Default name for a freshly connected data flow.
pub const DEFAULT_EDGE_NAME: &str = "Data";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Actor,
    Process,
    Datastore,
    TrustBoundary,
}

impl NodeKind {
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Actor,
        NodeKind::Process,
        NodeKind::Datastore,
        NodeKind::TrustBoundary,
    ];

    /// The wire tag, also used as the default name of a new node.
    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::Actor => "actor",
            NodeKind::Process => "process",
            NodeKind::Datastore => "datastore",
            NodeKind::TrustBoundary => "trustBoundary",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            NodeKind::Actor => "Actor",
            NodeKind::Process => "Process",
            NodeKind::Datastore => "Datastore",
            NodeKind::TrustBoundary => "Trust boundary",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Descriptive metadata shared by nodes and edges.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementData {
    pub name: String,
    pub description: String,
    pub out_of_scope: bool,
    pub scope_reason: String,
    pub data_tags: Vec<String>,
    pub tech_tags: Vec<String>,
    pub security_tags: Vec<String>,
    pub tags: Vec<String>,
    pub selected_threats: Vec<String>,
}

impl ElementData {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Merge the fields present in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: &MetadataPatch) {
        if let Some(v) = &patch.name { self.name = v.clone(); }
        if let Some(v) = &patch.description { self.description = v.clone(); }
        if let Some(v) = patch.out_of_scope { self.out_of_scope = v; }
        if let Some(v) = &patch.scope_reason { self.scope_reason = v.clone(); }
        if let Some(v) = &patch.data_tags { self.data_tags = v.clone(); }
        if let Some(v) = &patch.tech_tags { self.tech_tags = v.clone(); }
        if let Some(v) = &patch.security_tags { self.security_tags = v.clone(); }
        if let Some(v) = &patch.tags { self.tags = v.clone(); }
        if let Some(v) = &patch.selected_threats { self.selected_threats = v.clone(); }
    }
}

/// Partial `ElementData`; only `Some` fields are merged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub out_of_scope: Option<bool>,
    pub scope_reason: Option<String>,
    pub data_tags: Option<Vec<String>>,
    pub tech_tags: Option<Vec<String>>,
    pub security_tags: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub selected_threats: Option<Vec<String>>,
}

impl MetadataPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub position: Position,
    #[serde(default)]
    pub data: ElementData,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrowMarker {
    #[serde(rename = "type")]
    pub kind: String,
    pub width: f32,
    pub height: f32,
    pub color: String,
}

impl Default for ArrowMarker {
    fn default() -> Self {
        Self {
            kind: "arrowclosed".to_string(),
            width: 20.0,
            height: 20.0,
            color: "#b1b1b7".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type", default = "default_edge_type")]
    pub kind: String,
    #[serde(default)]
    pub data: ElementData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<ArrowMarker>,
}

fn default_edge_type() -> String {
    BIDIRECTIONAL_EDGE_TYPE.to_string()
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    Node(NodeId),
    Edge(EdgeId),
}

impl Selection {
    pub fn id(self) -> Uuid {
        match self {
            Selection::Node(id) | Selection::Edge(id) => id,
        }
    }
}

/// Camera state: pan offset in screen units and zoom factor.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, zoom: 1.0 }
    }
}
