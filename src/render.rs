use crate::config::LayoutConfig;
use crate::layout::{EdgeLayout, Layout, NodeLayout, Side, TextBlock};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

pub fn render_svg(layout: &Layout, theme: &Theme, config: &LayoutConfig) -> String {
    let mut svg = String::new();
    let width = layout.width.max(120.0);
    let height = layout.height.max(60.0);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));

    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
        theme.line_color
    ));
    svg.push_str("</defs>");

    for edge in &layout.edges {
        svg.push_str(&edge_svg(edge, theme, config));
    }

    for node in layout.nodes.values() {
        svg.push_str(&node_svg(node, theme, config));
    }

    svg.push_str("</svg>");
    svg
}

fn node_svg(node: &NodeLayout, theme: &Theme, config: &LayoutConfig) -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{r}\" ry=\"{r}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.4\"/>",
        node.x,
        node.y,
        node.width,
        node.height,
        theme.component_fill,
        theme.component_border,
        r = config.corner_radius,
    ));

    let center_x = node.x + node.width / 2.0;
    let type_height = node.sublabel.as_ref().map(|b| b.height).unwrap_or(0.0);
    let title_center_y = node.y + (node.height - type_height) / 2.0;
    svg.push_str(&text_block_svg(
        center_x,
        title_center_y,
        &node.label,
        theme.font_size,
        &theme.component_text,
        theme,
        config,
    ));
    if let Some(sublabel) = &node.sublabel {
        let type_font = theme.font_size * config.type_font_scale;
        let type_center_y = title_center_y + node.label.height / 2.0 + sublabel.height / 2.0;
        svg.push_str(&text_block_svg(
            center_x,
            type_center_y,
            sublabel,
            type_font,
            &theme.type_text,
            theme,
            config,
        ));
    }

    let half = config.port_size / 2.0;
    let port_font = theme.font_size * config.port_font_scale;
    for anchor in &node.ports {
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{s:.2}\" height=\"{s:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
            anchor.x - half,
            anchor.y - half,
            theme.port_fill,
            theme.port_border,
            s = config.port_size,
        ));

        // Port names sit just inside the node, next to their anchor.
        let (label_x, label_y, text_anchor) = match anchor.side {
            Side::Left => (
                anchor.x + half + config.port_label_gap,
                anchor.y + port_font * 0.35,
                "start",
            ),
            Side::Right => (
                anchor.x - half - config.port_label_gap,
                anchor.y + port_font * 0.35,
                "end",
            ),
            Side::Top => (
                anchor.x,
                anchor.y + half + config.port_label_gap + port_font,
                "middle",
            ),
            Side::Bottom => (
                anchor.x,
                anchor.y - half - config.port_label_gap,
                "middle",
            ),
        };
        svg.push_str(&format!(
            "<text x=\"{label_x:.2}\" y=\"{label_y:.2}\" text-anchor=\"{text_anchor}\" font-family=\"{}\" font-size=\"{port_font}\" fill=\"{}\">{}</text>",
            theme.font_family,
            theme.port_text,
            escape_xml(&anchor.name)
        ));
    }

    svg
}

fn edge_svg(edge: &EdgeLayout, theme: &Theme, config: &LayoutConfig) -> String {
    let mut svg = String::new();
    let d = points_to_path(&edge.points);
    svg.push_str(&format!(
        "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.4\" marker-end=\"url(#arrow)\"/>",
        d, theme.line_color
    ));

    if let Some(label) = &edge.label {
        let (x, y) = edge_midpoint(edge);
        let rect_x = x - label.width / 2.0 - 6.0;
        let rect_y = y - label.height / 2.0 - 4.0;
        let rect_w = label.width + 12.0;
        let rect_h = label.height + 8.0;
        svg.push_str(&format!(
            "<rect x=\"{rect_x:.2}\" y=\"{rect_y:.2}\" width=\"{rect_w:.2}\" height=\"{rect_h:.2}\" rx=\"4\" ry=\"4\" fill=\"{}\" stroke=\"{}\" stroke-width=\"0.8\"/>",
            theme.edge_label_background,
            theme.component_border
        ));
        svg.push_str(&text_block_svg(
            x,
            y,
            label,
            theme.font_size,
            &theme.component_text,
            theme,
            config,
        ));
    }

    svg
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].0, points[0].1));
    for point in points.iter().skip(1) {
        d.push_str(&format!(" L {:.2} {:.2}", point.0, point.1));
    }
    d
}

fn text_block_svg(
    x: f32,
    y: f32,
    label: &TextBlock,
    font_size: f32,
    fill: &str,
    theme: &Theme,
    config: &LayoutConfig,
) -> String {
    let total_height = label.lines.len() as f32 * font_size * config.label_line_height;
    let start_y = y - total_height / 2.0 + font_size;
    let mut text = String::new();

    text.push_str(&format!(
        "<text x=\"{x:.2}\" y=\"{start_y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{font_size}\" fill=\"{fill}\">",
        theme.font_family
    ));

    for (idx, line) in label.lines.iter().enumerate() {
        if idx == 0 {
            text.push_str(&format!("<tspan x=\"{x:.2}\" dy=\"0\">{}", escape_xml(line)));
        } else {
            let dy = font_size * config.label_line_height;
            text.push_str(&format!("<tspan x=\"{x:.2}\" dy=\"{dy:.2}\">{}", escape_xml(line)));
        }
        text.push_str("</tspan>");
    }

    text.push_str("</text>");
    text
}

fn edge_midpoint(edge: &EdgeLayout) -> (f32, f32) {
    if edge.points.len() >= 4 {
        let p1 = edge.points[1];
        let p2 = edge.points[2];
        ((p1.0 + p2.0) / 2.0, (p1.1 + p2.1) / 2.0)
    } else if edge.points.len() >= 2 {
        let p1 = edge.points[0];
        let p2 = edge.points[edge.points.len() - 1];
        ((p1.0 + p2.0) / 2.0, (p1.1 + p2.1) / 2.0)
    } else {
        (0.0, 0.0)
    }
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(
    svg: &str,
    output: &Path,
    render_cfg: &crate::config::RenderConfig,
) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .unwrap_or(usvg::Size::from_wh(800.0, 600.0).unwrap());

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
