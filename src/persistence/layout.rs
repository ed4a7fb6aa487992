use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diagram::camera::Camera;
use crate::diagram::model::{Edge, Node, Viewport};
use crate::diagram::store::DiagramStore;

use super::source::DiagramSource;

/// Detached capture of a diagram: nodes, edges and camera.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphState {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub viewport: Viewport,
}

impl GraphState {
    pub fn from_store(store: &DiagramStore, viewport: Viewport) -> Self {
        Self { nodes: store.nodes().to_vec(), edges: store.edges().to_vec(), viewport }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Serialize the store and camera, and clear the store's dirty flag.
pub fn save(store: &mut DiagramStore, viewport: Viewport) -> anyhow::Result<String> {
    let s = serde_json::to_string(&GraphState::from_store(store, viewport))?;
    store.mark_clean();
    Ok(s)
}

/// Parse a snapshot leniently. Anything unusable becomes the empty default.
pub fn load(content: Option<&str>) -> GraphState {
    let Some(content) = content.map(str::trim).filter(|c| !c.is_empty()) else {
        return GraphState::default();
    };
    let root: Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("discarding unreadable diagram snapshot: {}", e);
            return GraphState::default();
        }
    };
    let Some(obj) = root.as_object() else {
        log::warn!("discarding diagram snapshot: top level is not an object");
        return GraphState::default();
    };

    let mut seen = HashSet::new();
    let nodes: Vec<Node> = parse_items::<Node>(obj.get("nodes"), "node")
        .into_iter()
        .filter(|n| {
            let fresh = seen.insert(n.id);
            if !fresh {
                log::warn!("dropping duplicate node {}", n.id);
            }
            fresh
        })
        .collect();
    let edges: Vec<Edge> = parse_items::<Edge>(obj.get("edges"), "edge")
        .into_iter()
        .filter(|e| {
            let linked = seen.contains(&e.source) && seen.contains(&e.target);
            if !linked {
                log::warn!("dropping edge {} with a missing endpoint", e.id);
            }
            linked
        })
        .collect();

    let viewport = parse_viewport(obj.get("viewport"));
    GraphState { nodes, edges, viewport }
}

fn parse_items<T: serde::de::DeserializeOwned>(value: Option<&Value>, what: &str) -> Vec<T> {
    let Some(items) = value.and_then(Value::as_array) else { return Vec::new() };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<T>(item.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("skipping malformed {}: {}", what, e);
                None
            }
        })
        .collect()
}

// Each field falls back on its own default
fn parse_viewport(value: Option<&Value>) -> Viewport {
    let d = Viewport::default();
    let field = |name: &str, default: f32| {
        value
            .and_then(|v| v.get(name))
            .and_then(Value::as_f64)
            .map(|f| f as f32)
            .filter(|f| f.is_finite())
            .unwrap_or(default)
    };
    Viewport { x: field("x", d.x), y: field("y", d.y), zoom: field("zoom", d.zoom) }
}

/// True when the content holds at least one node.
pub fn has_diagram(content: Option<&str>) -> bool {
    !load(content).nodes.is_empty()
}

/// Keeps the live store and camera in step with a `DiagramSource`.
#[derive(Debug)]
pub struct LayoutAdapter {
    applied_revision: Option<u64>,
    initial_fit_max_zoom: f32,
}

impl Default for LayoutAdapter {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl LayoutAdapter {
    pub fn new(initial_fit_max_zoom: f32) -> Self {
        Self { applied_revision: None, initial_fit_max_zoom }
    }

    /// Replace the store contents and camera viewport with `content`.
    pub fn restore(store: &mut DiagramStore, camera: &mut Camera, content: Option<&str>) -> bool {
        let state = load(content);
        let restored = !state.is_empty();
        log::debug!("restoring {} node(s), {} edge(s)", state.nodes.len(), state.edges.len());
        store.replace_contents(state.nodes, state.edges);
        camera.set_viewport(state.viewport);
        restored
    }

    /// Restore if the source changed since the last restore. Returns true when it ran.
    pub fn sync(&mut self, store: &mut DiagramStore, camera: &mut Camera, source: &dyn DiagramSource) -> bool {
        if self.applied_revision == Some(source.revision()) {
            return false;
        }
        self.applied_revision = Some(source.revision());
        Self::restore(store, camera, source.content());
        true
    }

    /// Unconditional restore from `source`, recorded so `sync` does not repeat it.
    pub fn restore_from(&mut self, store: &mut DiagramStore, camera: &mut Camera, source: &dyn DiagramSource) -> bool {
        self.applied_revision = Some(source.revision());
        Self::restore(store, camera, source.content())
    }

    /// First paint: restore, fit the camera to the content, then cap the zoom.
    pub fn on_ready(
        &mut self,
        store: &mut DiagramStore,
        camera: &mut Camera,
        source: &dyn DiagramSource,
        canvas: (f32, f32),
    ) {
        self.restore_from(store, camera, source);
        camera.fit_to_content(store.nodes(), canvas);
        self.guard_initial_zoom(camera, canvas);
    }

    /// The first fit must never leave the camera zoomed in past the configured cap.
    pub fn guard_initial_zoom(&self, camera: &mut Camera, canvas: (f32, f32)) -> bool {
        if camera.zoom() > self.initial_fit_max_zoom {
            log::debug!("capping initial zoom {} to {}", camera.zoom(), self.initial_fit_max_zoom);
            camera.zoom_to(self.initial_fit_max_zoom, canvas);
            true
        } else {
            false
        }
    }

    /// Serialize into the source, replacing its previous snapshot.
    pub fn save_to(
        &mut self,
        store: &mut DiagramStore,
        camera: &Camera,
        source: &mut dyn DiagramSource,
    ) -> anyhow::Result<String> {
        let snapshot = save(store, camera.viewport)?;
        if let Err(e) = source.set_content(snapshot.clone()) {
            store.mark_dirty();
            return Err(e);
        }
        // our own write must not trigger a restore
        self.applied_revision = Some(source.revision());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::model::NodeKind;
    use crate::persistence::source::LocalStateSource;

    #[test]
    fn malformed_inputs_yield_empty_default() {
        for input in [None, Some(""), Some("{}"), Some("not json"), Some("[1,2]"), Some("null")] {
            let state = load(input);
            assert!(state.is_empty(), "{:?}", input);
            assert_eq!(state.viewport, Viewport { x: 0.0, y: 0.0, zoom: 1.0 });
        }
    }

    #[test]
    fn viewport_fields_default_individually() {
        let state = load(Some(r#"{"nodes":[],"edges":[],"viewport":{"x":12.5,"zoom":"big"}}"#));
        assert_eq!(state.viewport, Viewport { x: 12.5, y: 0.0, zoom: 1.0 });
    }

    #[test]
    fn dangling_edges_are_dropped() {
        let mut store = DiagramStore::new();
        let a = store.add_node(NodeKind::Actor).id;
        let b = store.add_node(NodeKind::Process).id;
        store.connect(a, b);
        let mut state = GraphState::from_store(&store, Viewport::default());
        state.nodes.retain(|n| n.id == a);
        let text = serde_json::to_string(&state).unwrap();
        let loaded = load(Some(text.as_str()));
        assert_eq!(loaded.nodes.len(), 1);
        assert!(loaded.edges.is_empty());
    }

    #[test]
    fn sync_only_restores_on_new_revision() {
        let mut store = DiagramStore::new();
        let mut camera = Camera::default();
        let mut adapter = LayoutAdapter::new(1.0);
        let mut source = LocalStateSource::default();

        assert!(adapter.sync(&mut store, &mut camera, &source));
        store.add_node(NodeKind::Actor);
        adapter.save_to(&mut store, &camera, &mut source).unwrap();
        assert!(!store.is_dirty());
        assert!(!adapter.sync(&mut store, &mut camera, &source));

        source.remove_diagram().unwrap();
        assert!(adapter.sync(&mut store, &mut camera, &source));
        assert!(store.nodes().is_empty());
    }

    #[test]
    fn forced_restore_is_not_repeated_by_sync() {
        let mut store = DiagramStore::new();
        let mut camera = Camera::default();
        let mut adapter = LayoutAdapter::new(1.0);
        let mut source = LocalStateSource::default();
        adapter.sync(&mut store, &mut camera, &source);
        store.add_node(NodeKind::Datastore);
        adapter.save_to(&mut store, &camera, &mut source).unwrap();

        // unsaved edit, then a reload that bumps the revision
        store.add_node(NodeKind::Actor);
        source.remove_diagram().unwrap();
        assert!(!adapter.restore_from(&mut store, &mut camera, &source));
        assert!(store.nodes().is_empty());
        store.add_node(NodeKind::Process);
        assert!(!adapter.sync(&mut store, &mut camera, &source));
        assert_eq!(store.nodes().len(), 1);
    }
}
