use crate::config::LayoutConfig;

use super::types::{GraphNode, Point};

// ── Self loops ──────────────────────────────────────────────────────
/// Fraction of the node height between a self loop's exit and entry.
const SELF_LOOP_SPREAD_RATIO: f32 = 0.25;

// ── Parallel edges ──────────────────────────────────────────────────
/// Offset between edges that share both endpoints, such as a branch whose
/// two outcomes name the same step.
const PARALLEL_EDGE_GAP: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RouteKind {
    Straight,
    Curve,
    Orthogonal,
    LayerSkip,
    BackEdge,
    SameLayer,
    SelfLoop,
}

/// Positioned nodes plus the per-layer extents that detours steer around.
/// Back edges pass on the right, forward edges that skip layers on the left.
pub(super) struct RouteContext<'a> {
    nodes: &'a [GraphNode],
    layer_left: Vec<f32>,
    layer_right: Vec<f32>,
    config: &'a LayoutConfig,
}

impl<'a> RouteContext<'a> {
    pub(super) fn new(nodes: &'a [GraphNode], config: &'a LayoutConfig) -> Self {
        let layer_count = nodes.iter().map(|node| node.layer + 1).max().unwrap_or(0);
        let mut layer_left = vec![f32::MAX; layer_count];
        let mut layer_right = vec![f32::MIN; layer_count];
        for node in nodes {
            layer_left[node.layer] = layer_left[node.layer].min(node.left());
            layer_right[node.layer] = layer_right[node.layer].max(node.right());
        }
        Self {
            nodes,
            layer_left,
            layer_right,
            config,
        }
    }

    pub(super) fn classify(&self, from: usize, to: usize, branch_label: bool) -> RouteKind {
        if from == to {
            return RouteKind::SelfLoop;
        }
        let (a, b) = (&self.nodes[from], &self.nodes[to]);
        if b.layer == a.layer {
            return RouteKind::SameLayer;
        }
        if b.layer < a.layer {
            return RouteKind::BackEdge;
        }
        if b.layer > a.layer + 1 {
            return RouteKind::LayerSkip;
        }
        let dx = (b.x - a.x).abs();
        if dx <= self.config.straight_tolerance {
            RouteKind::Straight
        } else if branch_label && dx > self.config.curve_threshold {
            RouteKind::Curve
        } else {
            RouteKind::Orthogonal
        }
    }

    /// Waypoints for the edge `from -> to`. `branch_label` marks edges leaving
    /// a branch decision, the only ones that may be curved. `lane` separates
    /// edges that share both endpoints: lane 0 is the plain route and each
    /// further lane is shifted right and pushes its channel outward.
    pub(super) fn route(
        &self,
        from: usize,
        to: usize,
        branch_label: bool,
        lane: usize,
    ) -> Vec<Point> {
        let (a, b) = (&self.nodes[from], &self.nodes[to]);
        let shift = lane as f32 * PARALLEL_EDGE_GAP;
        match self.classify(from, to, branch_label) {
            RouteKind::Straight => vec![
                Point::new(a.x + shift, a.bottom()),
                Point::new(b.x + shift, b.top()),
            ],
            RouteKind::Curve => {
                let start = Point::new(a.x + shift, a.bottom());
                let end = Point::new(b.x + shift, b.top());
                vec![start, Point::new(end.x, start.y), end]
            }
            RouteKind::Orthogonal => {
                let start = Point::new(a.x + shift, a.bottom());
                let end = Point::new(b.x + shift, b.top());
                let bend_y = end.y - self.config.row_gap / 2.0;
                vec![
                    start,
                    Point::new(start.x, bend_y),
                    Point::new(end.x, bend_y),
                    end,
                ]
            }
            RouteKind::LayerSkip => {
                let start = Point::new(a.x + shift, a.bottom());
                let end = Point::new(b.x + shift, b.top());
                let exit_y = start.y + self.config.row_gap / 2.0;
                let entry_y = end.y - self.config.row_gap / 2.0;
                let side_x = self.left_channel(a.layer + 1, b.layer - 1) - shift;
                vec![
                    start,
                    Point::new(start.x, exit_y),
                    Point::new(side_x, exit_y),
                    Point::new(side_x, entry_y),
                    Point::new(end.x, entry_y),
                    end,
                ]
            }
            RouteKind::BackEdge => {
                let side_x = self.side_channel(b.layer, a.layer) + shift;
                vec![
                    Point::new(a.right(), a.y + shift),
                    Point::new(side_x, a.y + shift),
                    Point::new(side_x, b.y + shift),
                    Point::new(b.right(), b.y + shift),
                ]
            }
            RouteKind::SameLayer => {
                let below = a.bottom().max(b.bottom()) + self.config.row_gap / 2.0 + shift;
                vec![
                    Point::new(a.x + shift, a.bottom()),
                    Point::new(a.x + shift, below),
                    Point::new(b.x + shift, below),
                    Point::new(b.x + shift, b.bottom()),
                ]
            }
            RouteKind::SelfLoop => {
                let spread = a.height * SELF_LOOP_SPREAD_RATIO;
                let side_x = a.right() + self.config.back_edge_offset + shift;
                vec![
                    Point::new(a.right(), a.y - spread),
                    Point::new(side_x, a.y - spread),
                    Point::new(side_x, a.y + spread),
                    Point::new(a.right(), a.y + spread),
                ]
            }
        }
    }

    fn side_channel(&self, top: usize, bottom: usize) -> f32 {
        let widest = self.layer_right[top..=bottom]
            .iter()
            .copied()
            .fold(f32::MIN, f32::max);
        widest + self.config.back_edge_offset
    }

    fn left_channel(&self, top: usize, bottom: usize) -> f32 {
        let leftmost = self.layer_left[top..=bottom]
            .iter()
            .copied()
            .fold(f32::MAX, f32::min);
        leftmost - self.config.back_edge_offset
    }
}

/// Midpoint of a routed path: the Bezier midpoint for a 3-point curve,
/// otherwise the point halfway along the polyline.
pub(super) fn path_midpoint(points: &[Point]) -> Option<Point> {
    match points {
        [] => None,
        [only] => Some(*only),
        [p0, p1, p2] => Some(Point::new(
            0.25 * p0.x + 0.5 * p1.x + 0.25 * p2.x,
            0.25 * p0.y + 0.5 * p1.y + 0.25 * p2.y,
        )),
        _ => {
            let total: f32 = points.windows(2).map(|w| distance(w[0], w[1])).sum();
            let mut remaining = total / 2.0;
            for w in points.windows(2) {
                let seg = distance(w[0], w[1]);
                if seg > 0.0 && remaining <= seg {
                    let t = remaining / seg;
                    return Some(Point::new(
                        w[0].x + (w[1].x - w[0].x) * t,
                        w[0].y + (w[1].y - w[0].y) * t,
                    ));
                }
                remaining -= seg;
            }
            points.first().copied()
        }
    }
}

fn distance(a: Point, b: Point) -> f32 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}
