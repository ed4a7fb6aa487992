use uuid::Uuid;

use super::model::{MetadataPatch, NodeId, NodeKind, Position};
use super::store::{DiagramStore, ZDirection};

/// Every editor gesture that can change the diagram.
#[derive(Clone, Debug, PartialEq)]
pub enum DiagramEvent {
    AddNode(NodeKind),
    Connect { source: NodeId, target: NodeId },
    Select(Uuid),
    Deselect,
    DragNode { id: NodeId, position: Position },
    DragStopped(NodeId),
    UpdateMetadata(MetadataPatch),
    ChangeZOrder(ZDirection),
    Remove(Uuid),
    RemoveSelected,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Nodes or edges changed (selection changes alone do not count).
    pub mutated: bool,
    /// Id of a newly created node or edge.
    pub created: Option<Uuid>,
}

impl DispatchOutcome {
    fn mutated(mutated: bool) -> Self {
        Self { mutated, created: None }
    }
}

/// Apply one event to the store. Events are handled strictly in order.
pub fn dispatch(store: &mut DiagramStore, event: DiagramEvent) -> DispatchOutcome {
    match event {
        DiagramEvent::AddNode(kind) => {
            let id = store.add_node(kind).id;
            DispatchOutcome { mutated: true, created: Some(id) }
        }
        DiagramEvent::Connect { source, target } => match store.connect(source, target) {
            Some(edge) => DispatchOutcome { mutated: true, created: Some(edge.id) },
            None => DispatchOutcome::default(),
        },
        DiagramEvent::Select(id) => {
            store.select(id);
            DispatchOutcome::default()
        }
        DiagramEvent::Deselect => {
            store.deselect();
            DispatchOutcome::default()
        }
        DiagramEvent::DragNode { id, position } => DispatchOutcome::mutated(store.move_node(id, position)),
        DiagramEvent::DragStopped(id) => {
            store.finish_drag(id);
            DispatchOutcome::default()
        }
        DiagramEvent::UpdateMetadata(patch) => DispatchOutcome::mutated(store.update_selected_metadata(&patch)),
        DiagramEvent::ChangeZOrder(direction) => DispatchOutcome::mutated(store.change_z_order(direction)),
        DiagramEvent::Remove(id) => DispatchOutcome::mutated(store.remove_element(id)),
        DiagramEvent::RemoveSelected => match store.selection() {
            Some(sel) => DispatchOutcome::mutated(store.remove_element(sel.id())),
            None => DispatchOutcome::default(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::model::Selection;

    #[test]
    fn events_drive_the_store() {
        let mut store = DiagramStore::new();
        let a = dispatch(&mut store, DiagramEvent::AddNode(NodeKind::Actor)).created.unwrap();
        let b = dispatch(&mut store, DiagramEvent::AddNode(NodeKind::Datastore)).created.unwrap();
        let e = dispatch(&mut store, DiagramEvent::Connect { source: a, target: b }).created.unwrap();

        dispatch(&mut store, DiagramEvent::Select(e));
        assert_eq!(store.selection(), Some(Selection::Edge(e)));
        let out = dispatch(&mut store, DiagramEvent::UpdateMetadata(MetadataPatch::name("Credentials")));
        assert!(out.mutated);
        assert_eq!(store.edge(e).unwrap().data.name, "Credentials");

        dispatch(&mut store, DiagramEvent::DragStopped(a));
        assert_eq!(store.selection(), Some(Selection::Node(a)));
        assert!(dispatch(&mut store, DiagramEvent::RemoveSelected).mutated);
        assert!(store.edges().is_empty());
        assert_eq!(store.nodes().len(), 1);
    }

    #[test]
    fn removing_without_selection_does_nothing() {
        let mut store = DiagramStore::new();
        dispatch(&mut store, DiagramEvent::AddNode(NodeKind::Process));
        assert_eq!(dispatch(&mut store, DiagramEvent::RemoveSelected), DispatchOutcome::default());
        assert_eq!(store.nodes().len(), 1);
    }
}
