//! Layout computation. Node positions come from the external dagre engine;
//! port anchors and edge polylines are derived locally from those positions.

use crate::config::LayoutConfig;
use crate::graph::{Graph, Node, Port};
use crate::model::{Direction, PortKind};
use crate::theme::Theme;
use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

/// Node side a port anchor sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

#[derive(Debug, Clone)]
pub struct PortAnchor {
    pub name: String,
    pub kind: PortKind,
    pub side: Side,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone)]
pub struct NodeLayout {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label: TextBlock,
    pub sublabel: Option<TextBlock>,
    pub ports: Vec<PortAnchor>,
}

impl NodeLayout {
    pub fn anchor(&self, port: &str) -> Option<&PortAnchor> {
        self.ports.iter().find(|a| a.name == port)
    }
}

#[derive(Debug, Clone)]
pub struct EdgeLayout {
    pub from: String,
    pub from_port: String,
    pub to: String,
    pub to_port: String,
    pub label: Option<TextBlock>,
    pub points: Vec<(f32, f32)>,
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub nodes: BTreeMap<String, NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    pub width: f32,
    pub height: f32,
}

pub fn compute_layout(graph: &Graph, theme: &Theme, config: &LayoutConfig) -> Layout {
    let mut nodes: BTreeMap<String, NodeLayout> = BTreeMap::new();
    for node in graph.nodes.values() {
        nodes.insert(node.id.clone(), size_node(node, graph.direction, theme, config));
    }

    if nodes.is_empty() {
        return Layout {
            nodes,
            edges: Vec::new(),
            width: (config.canvas_margin * 2.0).max(120.0),
            height: (config.canvas_margin * 2.0).max(60.0),
        };
    }

    assign_positions_dagre(graph, &mut nodes, config);

    for gnode in graph.nodes.values() {
        if let Some(node) = nodes.get_mut(&gnode.id) {
            place_ports(node, graph.direction, &gnode.ports);
        }
    }

    let mut edges = Vec::new();
    for edge in &graph.edges {
        let (Some(from_node), Some(to_node)) = (nodes.get(&edge.from), nodes.get(&edge.to))
        else {
            continue;
        };
        let (Some(from_anchor), Some(to_anchor)) = (
            from_node.anchor(&edge.from_port),
            to_node.anchor(&edge.to_port),
        ) else {
            continue;
        };
        let points = route_edge(from_node, from_anchor, to_node, to_anchor, config);
        edges.push(EdgeLayout {
            from: edge.from.clone(),
            from_port: edge.from_port.clone(),
            to: edge.to.clone(),
            to_port: edge.to_port.clone(),
            label: edge
                .label
                .as_deref()
                .map(|text| measure_label(text, theme.font_size, config)),
            points,
        });
    }

    let (width, height) = normalize_canvas(&mut nodes, &mut edges, config);
    Layout {
        nodes,
        edges,
        width,
        height,
    }
}

fn port_side(kind: PortKind, direction: Direction) -> Side {
    match (direction, kind) {
        (Direction::LeftRight, PortKind::Out) => Side::Right,
        (Direction::LeftRight, _) => Side::Left,
        (Direction::TopDown, PortKind::Out) => Side::Bottom,
        (Direction::TopDown, _) => Side::Top,
    }
}

fn size_node(node: &Node, direction: Direction, theme: &Theme, config: &LayoutConfig) -> NodeLayout {
    let label = measure_label(&node.label, theme.font_size, config);
    let sublabel = node
        .sublabel
        .as_deref()
        .map(|text| measure_label(text, theme.font_size * config.type_font_scale, config));

    let title_width = label
        .width
        .max(sublabel.as_ref().map(|b| b.width).unwrap_or(0.0));
    let title_height = label.height + sublabel.as_ref().map(|b| b.height).unwrap_or(0.0);

    let port_font = theme.font_size * config.port_font_scale;
    let side_a = port_side_members(node, direction, true);
    let side_b = port_side_members(node, direction, false);
    let label_a = max_port_label_width(&side_a, port_font);
    let label_b = max_port_label_width(&side_b, port_font);
    let side_count = side_a.len().max(side_b.len()) as f32;

    let (width, height) = match direction {
        Direction::LeftRight => {
            let port_band = if label_a > 0.0 && label_b > 0.0 {
                label_a + label_b + config.port_label_gap * 4.0
            } else {
                label_a + label_b
            };
            let width = title_width.max(port_band) + config.node_padding_x * 2.0;
            let height = title_height.max(side_count * config.port_spacing)
                + config.node_padding_y * 2.0;
            (width, height)
        }
        Direction::TopDown => {
            let port_band = side_count * config.port_spacing;
            let width = (title_width + config.node_padding_x * 2.0).max(port_band);
            let mut height = title_height + config.node_padding_y * 2.0;
            if !side_a.is_empty() {
                height += port_font * config.label_line_height;
            }
            if !side_b.is_empty() {
                height += port_font * config.label_line_height;
            }
            (width, height)
        }
    };

    NodeLayout {
        id: node.id.clone(),
        x: 0.0,
        y: 0.0,
        width,
        height,
        label,
        sublabel,
        ports: Vec::new(),
    }
}

/// Ports belonging to the upstream (`true`) or downstream side of the node.
fn port_side_members(node: &Node, direction: Direction, upstream: bool) -> Vec<Port> {
    let upstream_side = match direction {
        Direction::LeftRight => Side::Left,
        Direction::TopDown => Side::Top,
    };
    node.ports
        .iter()
        .filter(|p| (port_side(p.kind, direction) == upstream_side) == upstream)
        .cloned()
        .collect()
}

fn max_port_label_width(ports: &[Port], port_font: f32) -> f32 {
    ports
        .iter()
        .map(|p| approx_text_width(&p.name, port_font))
        .fold(0.0, f32::max)
}

fn assign_positions_dagre(
    graph: &Graph,
    nodes: &mut BTreeMap<String, NodeLayout>,
    config: &LayoutConfig,
) {
    let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
        DagreGraph::new(Some(GraphOption {
            directed: Some(true),
            multigraph: Some(false),
            compound: Some(false),
        }));

    let mut graph_config = DagreConfig::default();
    graph_config.rankdir = Some(dagre_rankdir(graph.direction).to_string());
    graph_config.nodesep = Some(config.node_spacing);
    graph_config.ranksep = Some(config.rank_spacing);
    graph_config.marginx = Some(8.0);
    graph_config.marginy = Some(8.0);
    dagre_graph.set_graph(graph_config);

    for (node_id, layout) in nodes.iter() {
        let mut node = DagreNode::default();
        node.width = layout.width;
        node.height = layout.height;
        if let Some(order) = graph.node_order.get(node_id) {
            node.order = Some(*order);
        }
        dagre_graph.set_node(node_id.clone(), Some(node));
    }

    let mut edge_set: HashSet<(String, String)> = HashSet::new();
    for edge in &graph.edges {
        // Self-loops are routed locally and would only confuse the ranker.
        if edge.from == edge.to {
            continue;
        }
        if !nodes.contains_key(&edge.from) || !nodes.contains_key(&edge.to) {
            continue;
        }
        if !edge_set.insert((edge.from.clone(), edge.to.clone())) {
            continue;
        }
        let edge_label = DagreEdge::default();
        let _ = dagre_graph.set_edge(&edge.from, &edge.to, Some(edge_label), None);
    }

    dagre_layout::run_layout(&mut dagre_graph);

    for (node_id, node) in nodes.iter_mut() {
        let Some(dagre_node) = dagre_graph.node(node_id) else {
            continue;
        };
        node.x = dagre_node.x - node.width / 2.0;
        node.y = dagre_node.y - node.height / 2.0;
    }
}

fn place_ports(node: &mut NodeLayout, direction: Direction, ports: &[Port]) {
    let sides = match direction {
        Direction::LeftRight => [Side::Left, Side::Right],
        Direction::TopDown => [Side::Top, Side::Bottom],
    };
    let mut anchors = Vec::with_capacity(ports.len());
    for side in sides {
        let mut members: Vec<&Port> = ports
            .iter()
            .filter(|p| port_side(p.kind, direction) == side)
            .collect();
        // Pure inputs first, then inout; declaration order within each kind.
        members.sort_by_key(|p| match p.kind {
            PortKind::In => 0,
            PortKind::InOut => 1,
            PortKind::Out => 2,
        });
        let count = members.len() as f32;
        for (idx, port) in members.iter().enumerate() {
            let frac = (idx as f32 + 1.0) / (count + 1.0);
            let (x, y) = match side {
                Side::Left => (node.x, node.y + node.height * frac),
                Side::Right => (node.x + node.width, node.y + node.height * frac),
                Side::Top => (node.x + node.width * frac, node.y),
                Side::Bottom => (node.x + node.width * frac, node.y + node.height),
            };
            anchors.push(PortAnchor {
                name: port.name.clone(),
                kind: port.kind,
                side,
                x,
                y,
            });
        }
    }
    node.ports = anchors;
}

fn stub_point(anchor: &PortAnchor, stub: f32) -> (f32, f32) {
    match anchor.side {
        Side::Left => (anchor.x - stub, anchor.y),
        Side::Right => (anchor.x + stub, anchor.y),
        Side::Top => (anchor.x, anchor.y - stub),
        Side::Bottom => (anchor.x, anchor.y + stub),
    }
}

fn route_edge(
    from_node: &NodeLayout,
    from: &PortAnchor,
    to_node: &NodeLayout,
    to: &PortAnchor,
    config: &LayoutConfig,
) -> Vec<(f32, f32)> {
    let stub = config.edge_stub.max(config.port_size);
    let p0 = (from.x, from.y);
    let p1 = stub_point(from, stub);
    let p3 = (to.x, to.y);
    let p2 = stub_point(to, stub);

    let mut points = vec![p0, p1];
    match (from.side, to.side) {
        (Side::Right, Side::Left) => {
            if p2.0 >= p1.0 {
                if (p1.1 - p2.1).abs() > 0.5 {
                    let mid_x = (p1.0 + p2.0) / 2.0;
                    points.push((mid_x, p1.1));
                    points.push((mid_x, p2.1));
                }
            } else {
                // Backward edge or self-loop: detour below both nodes.
                let clearance = config.node_spacing.max(stub);
                let channel_y =
                    (from_node.y + from_node.height).max(to_node.y + to_node.height) + clearance;
                points.push((p1.0, channel_y));
                points.push((p2.0, channel_y));
            }
        }
        (Side::Bottom, Side::Top) => {
            if p2.1 >= p1.1 {
                if (p1.0 - p2.0).abs() > 0.5 {
                    let mid_y = (p1.1 + p2.1) / 2.0;
                    points.push((p1.0, mid_y));
                    points.push((p2.0, mid_y));
                }
            } else {
                let clearance = config.node_spacing.max(stub);
                let channel_x =
                    (from_node.x + from_node.width).max(to_node.x + to_node.width) + clearance;
                points.push((channel_x, p1.1));
                points.push((channel_x, p2.1));
            }
        }
        // Unusual pairings (in-to-in, out-to-out) get the plain stub route.
        _ => {}
    }
    points.push(p2);
    points.push(p3);
    dedup_points(points)
}

fn dedup_points(points: Vec<(f32, f32)>) -> Vec<(f32, f32)> {
    let mut out: Vec<(f32, f32)> = Vec::with_capacity(points.len());
    for point in points {
        if let Some(last) = out.last() {
            if (last.0 - point.0).abs() < 0.01 && (last.1 - point.1).abs() < 0.01 {
                continue;
            }
        }
        out.push(point);
    }
    out
}

/// Shifts everything so the top-left extent lands on the canvas margin and
/// returns the final canvas size.
fn normalize_canvas(
    nodes: &mut BTreeMap<String, NodeLayout>,
    edges: &mut [EdgeLayout],
    config: &LayoutConfig,
) -> (f32, f32) {
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;

    for node in nodes.values() {
        min_x = min_x.min(node.x);
        min_y = min_y.min(node.y);
        max_x = max_x.max(node.x + node.width);
        max_y = max_y.max(node.y + node.height);
    }
    for edge in edges.iter() {
        for (x, y) in &edge.points {
            min_x = min_x.min(*x);
            min_y = min_y.min(*y);
            max_x = max_x.max(*x);
            max_y = max_y.max(*y);
        }
    }

    let margin = config.canvas_margin;
    let dx = margin - min_x;
    let dy = margin - min_y;

    for node in nodes.values_mut() {
        node.x += dx;
        node.y += dy;
        for anchor in &mut node.ports {
            anchor.x += dx;
            anchor.y += dy;
        }
    }
    for edge in edges.iter_mut() {
        for point in &mut edge.points {
            point.0 += dx;
            point.1 += dy;
        }
    }

    (max_x - min_x + margin * 2.0, max_y - min_y + margin * 2.0)
}

fn dagre_rankdir(direction: Direction) -> &'static str {
    match direction {
        Direction::TopDown => "tb",
        Direction::LeftRight => "lr",
    }
}

fn measure_label(text: &str, font_size: f32, config: &LayoutConfig) -> TextBlock {
    let mut lines = Vec::new();
    for line in text.replace("\\n", "\n").split('\n') {
        lines.extend(wrap_line(line.trim(), config.max_label_width_chars));
    }
    if lines.is_empty() {
        lines.push(String::new());
    }

    let max_len = lines.iter().map(|l| l.chars().count()).max().unwrap_or(1);
    let width = max_len as f32 * font_size * 0.45;
    let height = lines.len() as f32 * font_size * config.label_line_height;

    TextBlock {
        lines,
        width,
        height,
    }
}

fn approx_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.45
}

fn wrap_line(line: &str, max_chars: usize) -> Vec<String> {
    if line.chars().count() <= max_chars {
        return vec![line.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let candidate_len = current.chars().count() + word.chars().count() + 1;
        if !current.is_empty() && candidate_len > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(line.to_string());
    }
    lines
}
