use crate::config::{LayoutConfig, RenderConfig};
use crate::format::{escape_xml, format_percent, format_rows, truncate_label};
use crate::ir::{OperatorId, PlanOperator, PlanTree};
use crate::layout::{PlanLayout, compute_layout};
use crate::theme::Theme;
use crate::tooltip::{edge_tooltip, node_tooltip};
use anyhow::Result;
use std::path::Path;
use tracing::debug;

pub const WARNING_GLYPH: &str = "\u{26a0}";
pub const PARALLEL_GLYPH: &str = "\u{2016}";

/// Lays out and draws `tree` with the host theme and default geometry.
pub fn render_plan_svg(tree: &PlanTree) -> String {
    render_plan_svg_with(tree, &Theme::default(), &LayoutConfig::default())
}

pub fn render_plan_svg_with(tree: &PlanTree, theme: &Theme, config: &LayoutConfig) -> String {
    let layout = compute_layout(tree, config);
    render_svg(tree, &layout, theme, config)
}

pub fn render_svg(tree: &PlanTree, layout: &PlanLayout, theme: &Theme, config: &LayoutConfig) -> String {
    let mut svg = String::new();
    let width = layout.width;
    let height = layout.height;

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" style=\"display:block\">",
    ));
    svg.push_str(&style_block(theme));

    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrowhead\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><polygon points=\"0,0 10,5 0,10\" fill=\"{}\"/></marker>",
        escape_xml(&theme.line_color)
    ));
    svg.push_str("</defs>");

    if !matches!(theme.background.as_str(), "transparent" | "none" | "") {
        svg.push_str(&format!(
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            escape_xml(&theme.background)
        ));
    }

    // Pre-order: each edge lands right before the subtree it leads into, so
    // a node always paints over its incoming edge.
    for op in tree.iter() {
        if let Some(parent) = op.parent {
            svg.push_str(&edge_svg(parent, op, layout, theme, config));
        }
        svg.push_str(&node_svg(op, layout, theme, config));
    }

    svg.push_str("</svg>");
    debug!(operators = tree.len(), bytes = svg.len(), "rendered plan svg");
    svg
}

fn style_block(theme: &Theme) -> String {
    format!(
        "<style>\
.plan-node rect {{ cursor: pointer; transition: opacity 0.15s; }}\
.plan-node:hover rect {{ opacity: 0.85; }}\
.plan-node text, .plan-edge text {{ pointer-events: none; font-family: {}; }}\
.plan-edge path {{ stroke-opacity: 0.7; transition: stroke-opacity 0.15s; }}\
.plan-edge:hover path {{ stroke-opacity: 1; }}\
</style>",
        escape_xml(&theme.font_family)
    )
}

fn node_svg(op: &PlanOperator, layout: &PlanLayout, theme: &Theme, config: &LayoutConfig) -> String {
    let node = layout.node(op.id);
    let (x, y) = (node.x, node.y);
    let (w, h) = (layout.node_width, layout.node_height);
    let center_x = x + w / 2.0;
    let line_height = h / 4.0;
    let baseline = |line: usize| y + line_height * (line as f32 + 0.5) + theme.font_size * 0.35;
    let small = (theme.font_size - 1.0).max(1.0);
    let text_color = escape_xml(&theme.node_text_color);

    let mut title = truncate_label(&op.physical_op, config.labels.physical_op_chars);
    if op.has_warnings() {
        title = format!("{WARNING_GLYPH} {title}");
    }
    if op.parallel {
        title = format!("{title} {PARALLEL_GLYPH}");
    }

    let mut out = format!(
        "<g class=\"plan-node\" data-node-id=\"{}\" data-tooltip=\"{}\">",
        op.node_id,
        escape_xml(&node_tooltip(op))
    );
    out.push_str(&format!(
        "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" rx=\"4\" ry=\"4\" fill=\"{}\" stroke=\"{}\"/>",
        theme.cost_color(op.rel_op_cost),
        escape_xml(&theme.node_border_color)
    ));
    out.push_str(&format!(
        "<text x=\"{center_x:.2}\" y=\"{:.2}\" text-anchor=\"middle\" fill=\"{}\" font-size=\"{}\" font-weight=\"600\">{}</text>",
        baseline(0),
        text_color,
        theme.font_size,
        escape_xml(&title)
    ));

    let secondary = op.secondary_label();
    if !secondary.is_empty() {
        out.push_str(&format!(
            "<text x=\"{center_x:.2}\" y=\"{:.2}\" text-anchor=\"middle\" fill=\"{}\" font-size=\"{small}\" opacity=\"0.85\">{}</text>",
            baseline(1),
            text_color,
            escape_xml(&truncate_label(secondary, config.labels.secondary_chars))
        ));
    }

    out.push_str(&format!(
        "<text x=\"{center_x:.2}\" y=\"{:.2}\" text-anchor=\"middle\" fill=\"{}\" font-size=\"{small}\" opacity=\"0.8\">Cost: {}</text>",
        baseline(2),
        text_color,
        format_percent(op.rel_op_cost)
    ));
    out.push_str(&format!(
        "<text x=\"{center_x:.2}\" y=\"{:.2}\" text-anchor=\"middle\" fill=\"{}\" font-size=\"{small}\" opacity=\"0.8\">Rows: {}</text>",
        baseline(3),
        text_color,
        format_rows(op.estimate_rows)
    ));
    out.push_str("</g>");
    out
}

fn edge_svg(
    parent: OperatorId,
    child: &PlanOperator,
    layout: &PlanLayout,
    theme: &Theme,
    config: &LayoutConfig,
) -> String {
    let (x1, y1) = layout.bottom_center(parent);
    let (x2, y2) = layout.top_center(child.id);
    let mid_y = (y1 + y2) / 2.0;
    // Control points share the vertical midpoint, so t = 0.5 lands there too.
    let mid_x = (x1 + x2) / 2.0;
    let weight = config.edges.weight(child.estimate_rows);

    let mut out = format!(
        "<g class=\"plan-edge\" data-tooltip=\"{}\">",
        escape_xml(&edge_tooltip(child))
    );
    out.push_str(&format!(
        "<path d=\"M{x1:.2},{y1:.2} C{x1:.2},{mid_y:.2} {x2:.2},{mid_y:.2} {x2:.2},{y2:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{weight:.2}\" marker-start=\"url(#arrowhead)\"/>",
        escape_xml(&theme.line_color)
    ));
    out.push_str(&format!(
        "<text class=\"plan-edge-label\" x=\"{mid_x:.2}\" y=\"{:.2}\" text-anchor=\"middle\" fill=\"{}\" font-size=\"{}\">{}</text>",
        mid_y - 4.0,
        escape_xml(&theme.edge_label_color),
        (theme.font_size - 1.0).max(1.0),
        format_rows(child.estimate_rows)
    ));
    out.push_str("</g>");
    out
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
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .ok_or_else(|| anyhow::anyhow!("invalid render size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    anyhow::bail!("PNG output requires the `png` feature")
}
