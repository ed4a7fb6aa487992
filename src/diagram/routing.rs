//! Edge classification and path geometry.
//!
//! An edge whose reverse also exists is drawn as a quadratic curve bent away
//! from the straight line so the two opposing flows do not overlap; every
//! other edge is a horizontal-tangent cubic bezier.

use super::model::{Edge, NodeId, Position};

/// Vertical bend applied to bidirectional edges.
pub const DEFAULT_CURVE_OFFSET: f32 = 25.0;
const BEZIER_CURVATURE: f32 = 0.25;

/// True iff `edges` holds an edge running from `target` back to `source`.
pub fn is_bidirectional(edges: &[Edge], source: NodeId, target: NodeId) -> bool {
    edges.iter().any(|e| e.source == target && e.target == source)
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum EdgeRoute {
    Curved { start: Position, control: Position, end: Position, label: Position },
    Bezier { start: Position, c1: Position, c2: Position, end: Position, label: Position },
}

impl EdgeRoute {
    pub fn label(&self) -> Position {
        match *self {
            EdgeRoute::Curved { label, .. } | EdgeRoute::Bezier { label, .. } => label,
        }
    }

    pub fn is_curved(&self) -> bool {
        matches!(self, EdgeRoute::Curved { .. })
    }

    pub fn point_at(&self, t: f32) -> Position {
        let u = 1.0 - t;
        match *self {
            EdgeRoute::Curved { start, control, end, .. } => Position::new(
                u * u * start.x + 2.0 * u * t * control.x + t * t * end.x,
                u * u * start.y + 2.0 * u * t * control.y + t * t * end.y,
            ),
            EdgeRoute::Bezier { start, c1, c2, end, .. } => {
                let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
                Position::new(
                    a * start.x + b * c1.x + c * c2.x + d * end.x,
                    a * start.y + b * c1.y + c * c2.y + d * end.y,
                )
            }
        }
    }

    /// Polyline approximation with `segments` pieces.
    pub fn flatten(&self, segments: usize) -> Vec<Position> {
        let segments = segments.max(1);
        (0..=segments).map(|i| self.point_at(i as f32 / segments as f32)).collect()
    }

    // Direction of travel at the end point, for the arrow marker
    pub fn end_tangent(&self) -> (f32, f32) {
        let (from, end) = match *self {
            EdgeRoute::Curved { control, end, .. } => (control, end),
            EdgeRoute::Bezier { c2, end, .. } => (c2, end),
        };
        let (dx, dy) = (end.x - from.x, end.y - from.y);
        let len = (dx * dx + dy * dy).sqrt();
        if len <= f32::EPSILON { (1.0, 0.0) } else { (dx / len, dy / len) }
    }

    pub fn distance_to(&self, p: Position, segments: usize) -> f32 {
        self.flatten(segments)
            .windows(2)
            .map(|w| point_segment_distance(p, w[0], w[1]))
            .fold(f32::INFINITY, f32::min)
    }
}

/// Pick the route for `edge`; re-run on every frame since edges change.
pub fn route_edge(edges: &[Edge], edge: &Edge, source: Position, target: Position, curve_offset: f32) -> EdgeRoute {
    if is_bidirectional(edges, edge.source, edge.target) {
        let offset = if source.x < target.x { curve_offset } else { -curve_offset };
        curved_path(source, target, offset)
    } else {
        bezier_path(source, target)
    }
}

pub fn curved_path(source: Position, target: Position, offset: f32) -> EdgeRoute {
    let center = Position::new((source.x + target.x) / 2.0, (source.y + target.y) / 2.0);
    let control = Position::new(center.x, center.y + offset);
    EdgeRoute::Curved { start: source, control, end: target, label: control }
}

fn control_offset(distance: f32) -> f32 {
    if distance >= 0.0 {
        0.5 * distance
    } else {
        BEZIER_CURVATURE * 25.0 * (-distance).sqrt()
    }
}

// Source leaves to the right, target is entered from the left
pub fn bezier_path(source: Position, target: Position) -> EdgeRoute {
    let c1 = Position::new(source.x + control_offset(target.x - source.x), source.y);
    let c2 = Position::new(target.x - control_offset(target.x - source.x), target.y);
    let label = Position::new(
        source.x * 0.125 + c1.x * 0.375 + c2.x * 0.375 + target.x * 0.125,
        source.y * 0.125 + c1.y * 0.375 + c2.y * 0.375 + target.y * 0.125,
    );
    EdgeRoute::Bezier { start: source, c1, c2, end: target, label }
}

// Geometry helper: distance from point P to segment AB
pub fn point_segment_distance(p: Position, a: Position, b: Position) -> f32 {
    let (apx, apy) = (p.x - a.x, p.y - a.y);
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let ab_len2 = abx * abx + aby * aby;
    if ab_len2 <= f32::EPSILON {
        return (apx * apx + apy * apy).sqrt();
    }
    let t = ((apx * abx + apy * aby) / ab_len2).clamp(0.0, 1.0);
    let (px, py) = (a.x + abx * t, a.y + aby * t);
    ((p.x - px).powi(2) + (p.y - py).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::model::{ElementData, BIDIRECTIONAL_EDGE_TYPE};
    use uuid::Uuid;

    fn edge(source: NodeId, target: NodeId) -> Edge {
        Edge {
            id: Uuid::now_v7(),
            source,
            target,
            kind: BIDIRECTIONAL_EDGE_TYPE.to_string(),
            data: ElementData::default(),
            marker_end: None,
        }
    }

    #[test]
    fn single_direction_is_not_bidirectional() {
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let edges = vec![edge(a, b)];
        assert!(!is_bidirectional(&edges, a, b));
        assert!(is_bidirectional(&edges, b, a));
    }

    #[test]
    fn curve_offset_sign_follows_horizontal_order() {
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let edges = vec![edge(a, b), edge(b, a)];
        let left = Position::new(0.0, 0.0);
        let right = Position::new(100.0, 40.0);

        let forward = route_edge(&edges, &edges[0], left, right, 25.0);
        assert!(forward.is_curved());
        assert_eq!(forward.label(), Position::new(50.0, 45.0));

        let back = route_edge(&edges, &edges[1], right, left, 25.0);
        assert_eq!(back.label(), Position::new(50.0, -5.0));
    }

    #[test]
    fn bezier_label_sits_on_the_curve_midpoint() {
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let edges = vec![edge(a, b)];
        let route = route_edge(&edges, &edges[0], Position::new(0.0, 0.0), Position::new(200.0, 100.0), 25.0);
        assert!(!route.is_curved());
        let mid = route.point_at(0.5);
        let label = route.label();
        assert!((mid.x - label.x).abs() < 1e-3);
        assert!((mid.y - label.y).abs() < 1e-3);
    }

    #[test]
    fn distance_to_curve_endpoints_is_zero() {
        let route = curved_path(Position::new(0.0, 0.0), Position::new(100.0, 0.0), 25.0);
        assert!(route.distance_to(Position::new(0.0, 0.0), 16) < 1e-3);
        assert!(route.distance_to(Position::new(50.0, 12.5), 32) < 0.5);
    }
}
