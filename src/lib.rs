//! Data-flow diagram editing core for threat models: an owned diagram store,
//! bidirectional edge routing, lenient layout snapshots and an egui editor.

pub mod diagram;
pub mod export;
pub mod gui;
pub mod persistence;
pub mod threats;
