use super::model::{Node, Position, Viewport};

/// Nominal on-canvas footprint of a node, in world units.
pub const NODE_WIDTH: f32 = 100.0;
pub const NODE_HEIGHT: f32 = 50.0;
const FIT_PADDING: f32 = 0.1;

/// Maps world coordinates to the canvas: `screen = world * zoom + (x, y)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    pub viewport: Viewport,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self { viewport: Viewport::default(), min_zoom: 0.2, max_zoom: 4.0 }
    }
}

impl Camera {
    pub fn new(min_zoom: f32, max_zoom: f32) -> Self {
        let (min_zoom, max_zoom) = if min_zoom <= max_zoom { (min_zoom, max_zoom) } else { (max_zoom, min_zoom) };
        Self { viewport: Viewport::default(), min_zoom, max_zoom }
    }

    pub fn zoom(&self) -> f32 { self.viewport.zoom }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn world_to_screen(&self, p: Position) -> Position {
        let v = self.viewport;
        Position::new(p.x * v.zoom + v.x, p.y * v.zoom + v.y)
    }

    pub fn screen_to_world(&self, p: Position) -> Position {
        let v = self.viewport;
        let zoom = if v.zoom.abs() <= f32::EPSILON { 1.0 } else { v.zoom };
        Position::new((p.x - v.x) / zoom, (p.y - v.y) / zoom)
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.viewport.x += dx;
        self.viewport.y += dy;
    }

    /// Zoom by `factor` keeping the screen point `anchor` fixed.
    pub fn zoom_about(&mut self, anchor: Position, factor: f32) {
        let target = (self.viewport.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        self.zoom_to_about(anchor, target);
    }

    fn zoom_to_about(&mut self, anchor: Position, zoom: f32) {
        let world = self.screen_to_world(anchor);
        self.viewport.zoom = zoom;
        self.viewport.x = anchor.x - world.x * zoom;
        self.viewport.y = anchor.y - world.y * zoom;
    }

    /// Set the zoom around the canvas centre.
    pub fn zoom_to(&mut self, zoom: f32, canvas: (f32, f32)) {
        let center = Position::new(canvas.0 / 2.0, canvas.1 / 2.0);
        self.zoom_to_about(center, zoom.clamp(self.min_zoom, self.max_zoom));
    }

    /// Frame all nodes inside a canvas of size `canvas`. Returns false if there is nothing to fit.
    pub fn fit_to_content(&mut self, nodes: &[Node], canvas: (f32, f32)) -> bool {
        let Some(first) = nodes.first() else { return false };
        let (w, h) = canvas;
        if w <= 0.0 || h <= 0.0 {
            return false;
        }
        let mut min = first.position;
        let mut max = first.position;
        for n in nodes {
            min.x = min.x.min(n.position.x);
            min.y = min.y.min(n.position.y);
            max.x = max.x.max(n.position.x);
            max.y = max.y.max(n.position.y);
        }
        let bw = (max.x - min.x + NODE_WIDTH) * (1.0 + 2.0 * FIT_PADDING);
        let bh = (max.y - min.y + NODE_HEIGHT) * (1.0 + 2.0 * FIT_PADDING);
        let zoom = (w / bw).min(h / bh).clamp(self.min_zoom, self.max_zoom);
        let cx = (min.x + max.x + NODE_WIDTH) / 2.0;
        let cy = (min.y + max.y + NODE_HEIGHT) / 2.0;
        self.viewport = Viewport { x: w / 2.0 - cx * zoom, y: h / 2.0 - cy * zoom, zoom };
        true
    }
}
