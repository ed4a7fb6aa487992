pub mod frontend;

pub use frontend::{FlowEditor, FlowEditorOptions};
