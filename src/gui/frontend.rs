use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use eframe::egui::{self, Color32, Pos2, Rect, Sense, Stroke, Vec2};
use uuid::Uuid;

use crate::diagram::camera::{Camera, NODE_HEIGHT, NODE_WIDTH};
use crate::diagram::events::{DiagramEvent, dispatch};
use crate::diagram::model::{MetadataPatch, Node, NodeId, NodeKind, Position, Selection};
use crate::diagram::routing::{EdgeRoute, route_edge};
use crate::diagram::store::{DiagramStore, ZDirection};
use crate::export;
use crate::persistence::layout::LayoutAdapter;
use crate::persistence::settings::AppSettings;
use crate::persistence::source::DiagramSource;
use crate::threats::{self, ThreatCatalog};

// Pixels of slop when clicking an edge
const EDGE_HIT_TOLERANCE: f32 = 8.0;
const EDGE_SEGMENTS: usize = 24;

/// Host-supplied options for the embedded editor.
#[derive(Default)]
pub struct FlowEditorOptions {
    pub app_mode: Option<String>,
    pub on_threat_list_view: Option<Box<dyn FnMut()>>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Gesture {
    DragNode { id: NodeId, grab: Vec2 },
    Connect { source: NodeId },
    Pan,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ExportFormat {
    Json,
    Csv,
}

// Text buffers for the properties panel, rebuilt when the selection changes
#[derive(Default)]
struct PropertyEdits {
    for_id: Option<Uuid>,
    name: String,
    description: String,
    out_of_scope: bool,
    scope_reason: String,
    data_tags: String,
    tech_tags: String,
    security_tags: String,
    tags: String,
}

/// Diagram canvas, properties panel and threat list as one `eframe::App`.
pub struct FlowEditor {
    store: DiagramStore,
    camera: Camera,
    adapter: LayoutAdapter,
    source: Box<dyn DiagramSource>,
    catalog: ThreatCatalog,
    settings: AppSettings,
    options: FlowEditorOptions,
    ready: bool,
    canvas_size: (f32, f32),
    gesture: Option<Gesture>,
    edits: PropertyEdits,
    export_format: ExportFormat,
    workspace_edit: String,
    show_versions: bool,
    status: Option<(String, Instant)>,
    error: Option<String>,
}

impl FlowEditor {
    pub fn new(
        source: Box<dyn DiagramSource>,
        catalog: ThreatCatalog,
        settings: AppSettings,
        options: FlowEditorOptions,
    ) -> Self {
        let workspace_edit = source.workspace().unwrap_or_default().to_string();
        Self {
            store: DiagramStore::with_spawn_extent(settings.spawn_extent),
            camera: Camera::new(settings.min_zoom, settings.max_zoom),
            adapter: LayoutAdapter::new(settings.initial_fit_max_zoom),
            source,
            catalog,
            settings,
            options,
            ready: false,
            canvas_size: (0.0, 0.0),
            gesture: None,
            edits: PropertyEdits::default(),
            export_format: ExportFormat::Json,
            workspace_edit,
            show_versions: false,
            status: None,
            error: None,
        }
    }

    pub fn store(&self) -> &DiagramStore { &self.store }
    pub fn source(&self) -> &dyn DiagramSource { self.source.as_ref() }

    /// Pick up content that changed underneath the editor. Returns true when it restored.
    pub fn sync_source(&mut self) -> bool {
        self.adapter.sync(&mut self.store, &mut self.camera, self.source.as_ref())
    }

    // Public helpers callable from the host as well as the menus

    pub fn menu_switch_workspace(&mut self, workspace: Option<String>) {
        if self.store.is_dirty() {
            log::warn!("switching workspace with unsaved diagram changes");
        }
        match self.source.switch_workspace(workspace) {
            Ok(()) => {
                self.workspace_edit = self.source.workspace().unwrap_or_default().to_string();
                self.error = None;
                self.notify(format!("Workspace: {}", self.source.workspace().unwrap_or("default")));
            }
            Err(e) => self.error = Some(format!("Switch workspace failed: {}", e)),
        }
    }

    /// Destroy the stored diagram of `workspace_id`; the canvas empties if it is the active one.
    pub fn menu_delete_workspace(&mut self, workspace_id: &str) {
        match self.source.on_delete_workspace(workspace_id) {
            Ok(()) => self.notify(format!("Deleted diagram of workspace {}", workspace_id)),
            Err(e) => self.error = Some(format!("Delete failed: {}", e)),
        }
    }

    pub fn menu_delete_diagram(&mut self) {
        let result = match self.source.workspace().map(str::to_string) {
            Some(ws) => self.source.on_delete_workspace(&ws),
            None => self.source.remove_diagram(),
        };
        match result {
            Ok(()) => self.notify("Deleted stored diagram"),
            Err(e) => self.error = Some(format!("Delete failed: {}", e)),
        }
    }

    pub fn menu_restore_version(&mut self, path: &Path) {
        match self.source.restore_version(path) {
            Ok(()) => {
                let label = path.file_name().and_then(|s| s.to_str()).unwrap_or("<unknown>");
                self.notify(format!("Loaded {}", label));
                self.error = None;
            }
            Err(e) => self.error = Some(format!("Failed to load {}: {}", path.display(), e)),
        }
    }

    fn apply(&mut self, event: DiagramEvent) {
        let outcome = dispatch(&mut self.store, event);
        if outcome.mutated {
            self.error = None;
        }
    }

    fn notify(&mut self, msg: impl Into<String>) {
        self.status = Some((msg.into(), Instant::now()));
    }

    fn save(&mut self) {
        match self.adapter.save_to(&mut self.store, &self.camera, self.source.as_mut()) {
            Ok(_) => {
                self.error = None;
                self.notify("Saved");
            }
            Err(e) => {
                log::error!("saving diagram failed: {:#}", e);
                self.error = Some(format!("Save failed: {}", e));
            }
        }
    }

    fn save_version(&mut self) {
        match self.source.save_versioned() {
            Ok(Some(path)) => self.notify(format!("Saved version {}", path.display())),
            Ok(None) => self.notify("Nothing saved yet to keep a version of"),
            Err(e) => self.error = Some(format!("Save version failed: {}", e)),
        }
    }

    fn reload(&mut self) {
        match self.source.reload() {
            Ok(()) => {
                // unsaved edits are discarded even when the stored content did not change
                self.adapter.restore_from(&mut self.store, &mut self.camera, self.source.as_ref());
                self.notify("Reloaded");
            }
            Err(e) => self.error = Some(format!("Reload failed: {}", e)),
        }
    }

    fn export(&mut self) {
        let dir = self.settings.export_dir();
        let result = match self.export_format {
            ExportFormat::Json => {
                let path = dir.join("diagram_elements.json");
                export::export_elements_json(&self.store, &path).map(|_| path)
            }
            ExportFormat::Csv => {
                let path = dir.join("diagram_elements.csv");
                export::export_elements_csv(&self.store, &path).map(|_| path)
            }
        };
        match result {
            Ok(path) => self.notify(format!("Exported to {}", path.display())),
            Err(e) => self.error = Some(format!("Export failed: {}", e)),
        }
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Data flow diagram");
                if let Some(mode) = &self.options.app_mode {
                    ui.weak(format!("({})", mode));
                }
                ui.separator();
                let dirty = self.store.is_dirty();
                let save_btn = egui::Button::new(if dirty { "Save" } else { "Saved" })
                    .shortcut_text(ctx.format_shortcut(&egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::S)));
                if ui.add_enabled(dirty, save_btn).clicked() {
                    self.save();
                }
                if ui.button("Save version").clicked() { self.save_version(); }
                if ui.button("Reload").on_hover_text("Discard unsaved changes and restore the stored diagram").clicked() {
                    self.reload();
                }
                if ui.button("Versions…").clicked() { self.show_versions = true; }
                ui.menu_button("Workspace", |ui| {
                    ui.label(format!("Active: {}", self.source.workspace().unwrap_or("default")));
                    ui.horizontal(|ui| {
                        ui.text_edit_singleline(&mut self.workspace_edit);
                        if ui.button("Open").clicked() {
                            let ws = self.workspace_edit.trim().to_string();
                            self.menu_switch_workspace(if ws.is_empty() { None } else { Some(ws) });
                            ui.close();
                        }
                    });
                    if ui.button("Default workspace").clicked() {
                        self.menu_switch_workspace(None);
                        ui.close();
                    }
                    ui.separator();
                    if ui.button(egui::RichText::new("Delete stored diagram").color(Color32::RED)).clicked() {
                        self.menu_delete_diagram();
                        ui.close();
                    }
                });
                ui.separator();
                if ui.selectable_label(self.export_format == ExportFormat::Json, "JSON").clicked() {
                    self.export_format = ExportFormat::Json;
                }
                if ui.selectable_label(self.export_format == ExportFormat::Csv, "CSV").clicked() {
                    self.export_format = ExportFormat::Csv;
                }
                if ui.button("Export elements").clicked() { self.export(); }
                ui.separator();
                if ui.button("Reset view").clicked() {
                    self.camera.fit_to_content(self.store.nodes(), self.canvas_size);
                }
                if let Some((msg, at)) = &self.status {
                    if at.elapsed() < Duration::from_secs(3) {
                        ui.label(msg.as_str());
                    }
                }
                if let Some(err) = &self.error {
                    ui.colored_label(Color32::RED, err.as_str());
                }
            });
        });
        if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::S)) && self.store.is_dirty() {
            self.save();
        }
    }

    fn versions_window(&mut self, ctx: &egui::Context) {
        if !self.show_versions {
            return;
        }
        let mut open = true;
        let mut to_load: Option<PathBuf> = None;
        egui::Window::new("Load Version")
            .collapsible(false)
            .resizable(true)
            .open(&mut open)
            .show(ctx, |ui| match self.source.list_versions() {
                Ok(list) => {
                    if list.is_empty() { ui.label("No saved versions for this workspace"); }
                    for p in list.iter() {
                        let label = p.file_name().and_then(|s| s.to_str()).unwrap_or("<unknown>");
                        if ui.button(label).clicked() {
                            to_load = Some(p.clone());
                        }
                    }
                }
                Err(e) => { ui.colored_label(Color32::RED, format!("List failed: {}", e)); }
            });
        if let Some(p) = to_load {
            self.menu_restore_version(&p);
            if self.error.is_none() { open = false; }
        }
        self.show_versions = open;
    }

    fn side_panels(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("properties")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.heading("Properties");
                    self.properties_panel(ui);
                    ui.separator();
                    ui.heading("Threats");
                    self.threat_panel(ui);
                });
            });
    }

    fn refresh_edits(&mut self) {
        let sel = self.store.selection().map(Selection::id);
        if self.edits.for_id == sel {
            return;
        }
        self.edits = match self.store.selected_data() {
            Some(d) => PropertyEdits {
                for_id: sel,
                name: d.name.clone(),
                description: d.description.clone(),
                out_of_scope: d.out_of_scope,
                scope_reason: d.scope_reason.clone(),
                data_tags: d.data_tags.join(", "),
                tech_tags: d.tech_tags.join(", "),
                security_tags: d.security_tags.join(", "),
                tags: d.tags.join(", "),
            },
            None => PropertyEdits::default(),
        };
    }

    fn properties_panel(&mut self, ui: &mut egui::Ui) {
        self.refresh_edits();
        let Some(sel) = self.store.selection() else {
            ui.weak("Select a node or data flow to edit it.");
            return;
        };
        let what = match sel {
            Selection::Node(id) => self.store.node(id).map(|n| n.kind.display_name()).unwrap_or("Node"),
            Selection::Edge(_) => "Data flow",
        };
        ui.label(egui::RichText::new(what).strong());

        let mut patch = MetadataPatch::default();
        let e = &mut self.edits;
        ui.label("Name");
        if ui.text_edit_singleline(&mut e.name).changed() { patch.name = Some(e.name.clone()); }
        ui.label("Description");
        if ui.text_edit_multiline(&mut e.description).changed() { patch.description = Some(e.description.clone()); }
        if ui.checkbox(&mut e.out_of_scope, "Out of scope").changed() { patch.out_of_scope = Some(e.out_of_scope); }
        if e.out_of_scope {
            ui.label("Reason");
            if ui.text_edit_singleline(&mut e.scope_reason).changed() { patch.scope_reason = Some(e.scope_reason.clone()); }
        }
        ui.small("Tags are comma separated");
        for (label, buf, slot) in [
            ("Data tags", &mut e.data_tags, &mut patch.data_tags),
            ("Tech tags", &mut e.tech_tags, &mut patch.tech_tags),
            ("Security tags", &mut e.security_tags, &mut patch.security_tags),
            ("Tags", &mut e.tags, &mut patch.tags),
        ] {
            ui.label(label);
            if ui.text_edit_singleline(buf).changed() {
                *slot = Some(split_tags(buf));
            }
        }
        if !patch.is_empty() {
            self.apply(DiagramEvent::UpdateMetadata(patch));
        }

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let is_node = matches!(sel, Selection::Node(_));
            for (text, dir) in [
                ("⏫", ZDirection::ToFront),
                ("⬆", ZDirection::Up),
                ("⬇", ZDirection::Down),
                ("⏬", ZDirection::ToBack),
            ] {
                if ui.add_enabled(is_node, egui::Button::new(text)).on_hover_text(format!("{:?}", dir)).clicked() {
                    self.apply(DiagramEvent::ChangeZOrder(dir));
                }
            }
            if ui.button(egui::RichText::new("Delete").color(Color32::RED)).clicked() {
                self.apply(DiagramEvent::RemoveSelected);
            }
        });
    }

    fn threat_panel(&mut self, ui: &mut egui::Ui) {
        if ui.button("View all threats").clicked() {
            if let Some(cb) = self.options.on_threat_list_view.as_mut() {
                cb();
            }
        }
        if self.catalog.is_empty() {
            ui.weak("No threats available.");
            return;
        }
        let data = self.store.selected_data().cloned();
        let mut toggled: Option<String> = None;
        for t in self.catalog.threats() {
            let mut linked = data.as_ref().is_some_and(|d| d.selected_threats.contains(&t.id));
            let resp = ui.add_enabled(data.is_some(), egui::Checkbox::new(&mut linked, t.caption()));
            if resp.changed() {
                toggled = Some(t.id.clone());
            }
        }
        if let (Some(id), Some(d)) = (toggled, data) {
            self.apply(DiagramEvent::UpdateMetadata(threats::toggle_threat(&d, &id)));
        }
    }

    fn palette(&mut self, ui: &mut egui::Ui, canvas: Rect) {
        let area = Rect::from_min_size(canvas.min + Vec2::new(8.0, 8.0), Vec2::new(140.0, 130.0));
        ui.scope_builder(egui::UiBuilder::new().max_rect(area), |ui| {
            egui::Frame::group(ui.style()).fill(ui.visuals().window_fill).show(ui, |ui| {
                for kind in NodeKind::ALL {
                    if ui.small_button(format!("+ {}", kind.display_name())).clicked() {
                        self.apply(DiagramEvent::AddNode(kind));
                    }
                }
            });
        });
    }

    fn canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_rect_before_wrap();
            self.canvas_size = (available.width(), available.height());

            // Restore on first paint, then whenever the source changes underneath us
            if !self.ready {
                self.adapter.on_ready(&mut self.store, &mut self.camera, self.source.as_ref(), self.canvas_size);
                self.ready = true;
            } else {
                self.sync_source();
            }

            let resp = ui.allocate_rect(available, Sense::click_and_drag());
            let origin = available.min;
            let camera = self.camera;
            let to_screen = move |p: Position| -> Pos2 {
                let s = camera.world_to_screen(p);
                origin + Vec2::new(s.x, s.y)
            };
            let to_world = move |p: Pos2| -> Position {
                camera.screen_to_world(Position::new(p.x - origin.x, p.y - origin.y))
            };

            self.handle_pointer(ui, &resp, &to_world, &to_screen);

            let painter = ui.painter_at(available);
            painter.rect_filled(available, 0.0, Color32::from_rgb(250, 250, 250));
            self.draw_edges(&painter, &to_screen);
            // sequence order: later nodes are painted over earlier ones
            let selected = self.store.selection();
            for node in self.store.nodes() {
                draw_node(&painter, node, &to_screen, camera.zoom(), selected == Some(Selection::Node(node.id)));
            }
            if let (Some(Gesture::Connect { source }), Some(pointer)) = (self.gesture, ui.input(|i| i.pointer.latest_pos())) {
                if let Some(n) = self.store.node(source) {
                    painter.line_segment([to_screen(source_anchor(n)), pointer], Stroke::new(1.5, Color32::GRAY));
                }
            }

            let zoom_text = format!("{:.0}%", self.camera.zoom() * 100.0);
            painter.text(available.right_bottom() - Vec2::new(8.0, 8.0), egui::Align2::RIGHT_BOTTOM, zoom_text,
                egui::FontId::proportional(12.0), Color32::DARK_GRAY);

            self.palette(ui, available);
        });
    }

    fn handle_pointer(
        &mut self,
        ui: &egui::Ui,
        resp: &egui::Response,
        to_world: &dyn Fn(Pos2) -> Position,
        to_screen: &dyn Fn(Position) -> Pos2,
    ) {
        let pointer = ui.input(|i| i.pointer.latest_pos());

        if resp.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 && let Some(p) = pointer {
                let factor = (1.0 + scroll * 0.001).clamp(0.9, 1.1);
                let origin = resp.rect.min;
                self.camera.zoom_about(Position::new(p.x - origin.x, p.y - origin.y), factor);
            }
        }

        if resp.drag_started() {
            let start = ui.input(|i| i.pointer.press_origin()).or(pointer);
            let shift = ui.input(|i| i.modifiers.shift);
            self.gesture = match start.and_then(|p| self.node_at(to_world(p))) {
                Some(id) if shift => Some(Gesture::Connect { source: id }),
                Some(id) => {
                    let grab = start.map(|p| {
                        let w = to_world(p);
                        let n = self.store.node(id).map(|n| n.position).unwrap_or(w);
                        Vec2::new(w.x - n.x, w.y - n.y)
                    });
                    Some(Gesture::DragNode { id, grab: grab.unwrap_or(Vec2::ZERO) })
                }
                None => Some(Gesture::Pan),
            };
        }

        if resp.dragged() {
            match self.gesture {
                Some(Gesture::DragNode { id, grab }) => {
                    if let Some(p) = pointer {
                        let w = to_world(p);
                        self.apply(DiagramEvent::DragNode { id, position: Position::new(w.x - grab.x, w.y - grab.y) });
                    }
                }
                Some(Gesture::Pan) => {
                    let d = resp.drag_delta();
                    self.camera.pan_by(d.x, d.y);
                }
                Some(Gesture::Connect { .. }) | None => {}
            }
        }

        if resp.drag_stopped() {
            match self.gesture.take() {
                Some(Gesture::DragNode { id, .. }) => self.apply(DiagramEvent::DragStopped(id)),
                Some(Gesture::Connect { source }) => {
                    if let Some(target) = pointer.and_then(|p| self.node_at(to_world(p)))
                        && target != source
                    {
                        self.apply(DiagramEvent::Connect { source, target });
                    }
                }
                Some(Gesture::Pan) | None => {}
            }
        }

        if resp.clicked() && let Some(p) = pointer {
            let event = match self.node_at(to_world(p)).or_else(|| self.edge_at(p, to_screen)) {
                Some(id) => DiagramEvent::Select(id),
                None => DiagramEvent::Deselect,
            };
            self.apply(event);
        }

        let deleting = ui.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace));
        if deleting && !ui.ctx().wants_keyboard_input() {
            self.apply(DiagramEvent::RemoveSelected);
        }
    }

    // Topmost node under a world point
    fn node_at(&self, p: Position) -> Option<NodeId> {
        self.store
            .nodes()
            .iter()
            .rev()
            .find(|n| node_rect(n).contains(Pos2::new(p.x, p.y)))
            .map(|n| n.id)
    }

    fn edge_at(&self, p: Pos2, to_screen: &dyn Fn(Position) -> Pos2) -> Option<Uuid> {
        let edges = self.store.edges();
        let mut best: Option<(Uuid, f32)> = None;
        for e in edges {
            let Some(route) = self.screen_route(e, to_screen) else { continue };
            let d = route.distance_to(Position::new(p.x, p.y), EDGE_SEGMENTS);
            if d <= EDGE_HIT_TOLERANCE && best.is_none_or(|(_, bd)| d < bd) {
                best = Some((e.id, d));
            }
        }
        best.map(|(id, _)| id)
    }

    fn screen_route(&self, edge: &crate::diagram::model::Edge, to_screen: &dyn Fn(Position) -> Pos2) -> Option<EdgeRoute> {
        let (s, t) = (self.store.node(edge.source)?, self.store.node(edge.target)?);
        let a = to_screen(source_anchor(s));
        let b = to_screen(target_anchor(t));
        let offset = self.settings.curve_offset * self.camera.zoom();
        Some(route_edge(self.store.edges(), edge, Position::new(a.x, a.y), Position::new(b.x, b.y), offset))
    }

    fn draw_edges(&self, painter: &egui::Painter, to_screen: &dyn Fn(Position) -> Pos2) {
        let selected = self.store.selection();
        let zoom = self.camera.zoom();
        for edge in self.store.edges() {
            let Some(route) = self.screen_route(edge, to_screen) else { continue };
            let is_sel = selected == Some(Selection::Edge(edge.id));
            let color = if is_sel { Color32::from_rgb(255, 0, 114) } else { Color32::BLACK };
            let stroke = Stroke::new(2.0, color);
            let points: Vec<Pos2> = route.flatten(EDGE_SEGMENTS).into_iter().map(|p| Pos2::new(p.x, p.y)).collect();
            painter.add(egui::Shape::line(points, stroke));

            if edge.marker_end.is_some() {
                let end = match route {
                    EdgeRoute::Curved { end, .. } | EdgeRoute::Bezier { end, .. } => Pos2::new(end.x, end.y),
                };
                let (tx, ty) = route.end_tangent();
                let dir = Vec2::new(tx, ty);
                let normal = Vec2::new(-ty, tx);
                let size = (10.0 * zoom).clamp(4.0, 16.0);
                let tri = vec![end, end - dir * size + normal * size * 0.5, end - dir * size - normal * size * 0.5];
                painter.add(egui::Shape::convex_polygon(tri, Color32::from_rgb(177, 177, 183), Stroke::NONE));
            }

            let label = route.label();
            let font = egui::FontId::proportional((12.0 * zoom).clamp(8.0, 18.0));
            let galley = painter.layout_no_wrap(edge.data.name.clone(), font, Color32::BLACK);
            let pad = Vec2::new(6.0, 4.0) * zoom.clamp(0.5, 1.5);
            let center = Pos2::new(label.x, label.y);
            let rect = Rect::from_center_size(center, galley.size() + pad * 2.0);
            painter.rect_filled(rect, 5.0 * zoom, Color32::from_rgb(255, 204, 0));
            painter.galley(center - galley.size() * 0.5, galley, Color32::BLACK);
        }
    }
}

impl eframe::App for FlowEditor {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.top_bar(ctx);
        self.side_panels(ctx);
        self.canvas(ctx);
        self.versions_window(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if self.store.is_dirty() {
            log::warn!("closing with unsaved diagram changes");
        }
    }
}

fn split_tags(s: &str) -> Vec<String> {
    s.split(',').map(str::trim).filter(|t| !t.is_empty()).map(str::to_string).collect()
}

fn node_rect(n: &Node) -> Rect {
    Rect::from_min_size(Pos2::new(n.position.x, n.position.y), Vec2::new(NODE_WIDTH, NODE_HEIGHT))
}

// Edges leave from the right-middle and enter at the left-middle
fn source_anchor(n: &Node) -> Position {
    Position::new(n.position.x + NODE_WIDTH, n.position.y + NODE_HEIGHT / 2.0)
}

fn target_anchor(n: &Node) -> Position {
    Position::new(n.position.x, n.position.y + NODE_HEIGHT / 2.0)
}

fn draw_node(painter: &egui::Painter, node: &Node, to_screen: &dyn Fn(Position) -> Pos2, zoom: f32, selected: bool) {
    let world = node_rect(node);
    let rect = Rect::from_two_pos(
        to_screen(Position::new(world.min.x, world.min.y)),
        to_screen(Position::new(world.max.x, world.max.y)),
    );
    let outline = if selected { Color32::from_rgb(255, 0, 114) } else { Color32::BLACK };
    let stroke = Stroke::new(if selected { 2.5 } else { 1.5 }, outline);
    let fill = if node.data.out_of_scope { Color32::from_gray(225) } else { Color32::WHITE };

    match node.kind {
        NodeKind::Actor => {
            painter.rect_filled(rect, 0.0, fill);
            painter.rect_stroke(rect, 0.0, stroke, egui::StrokeKind::Middle);
        }
        NodeKind::Process => {
            let r = rect.height() / 2.0;
            painter.rect_filled(rect, r, fill);
            painter.rect_stroke(rect, r, stroke, egui::StrokeKind::Middle);
        }
        NodeKind::Datastore => {
            painter.rect_filled(rect, 0.0, fill);
            painter.line_segment([rect.left_top(), rect.right_top()], stroke);
            painter.line_segment([rect.left_bottom(), rect.right_bottom()], stroke);
        }
        NodeKind::TrustBoundary => {
            let corners = [rect.left_top(), rect.right_top(), rect.right_bottom(), rect.left_bottom(), rect.left_top()];
            let dash = (6.0 * zoom).max(2.0);
            painter.extend(egui::Shape::dashed_line(&corners, Stroke::new(stroke.width, Color32::from_rgb(200, 30, 30)), dash, dash));
        }
    }

    let font = egui::FontId::proportional((13.0 * zoom).clamp(8.0, 22.0));
    painter.text(rect.center(), egui::Align2::CENTER_CENTER, &node.data.name, font, Color32::BLACK);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(split_tags(" pii, ,secrets ,"), vec!["pii".to_string(), "secrets".to_string()]);
        assert!(split_tags("").is_empty());
    }

    #[test]
    fn anchors_sit_on_node_sides() {
        let node = Node {
            id: Uuid::now_v7(),
            kind: NodeKind::Actor,
            position: Position::new(10.0, 20.0),
            data: Default::default(),
        };
        assert_eq!(source_anchor(&node), Position::new(110.0, 45.0));
        assert_eq!(target_anchor(&node), Position::new(10.0, 45.0));
    }
}
