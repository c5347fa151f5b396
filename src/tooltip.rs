//! Hover tooltips. Each fragment is a small HTML snippet the host page
//! injects into its tooltip element, styled through the `ptt-*` classes.

use crate::format::{escape_xml, format_cost, format_percent, format_rows};
use crate::ir::PlanOperator;

struct Tooltip {
    title: String,
    warnings: Vec<String>,
    rows: Vec<(&'static str, String)>,
}

impl Tooltip {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            warnings: Vec::new(),
            rows: Vec::new(),
        }
    }

    fn row(&mut self, label: &'static str, value: impl Into<String>) {
        self.rows.push((label, value.into()));
    }

    fn to_html(&self) -> String {
        let mut html = format!("<div class=\"ptt-title\">{}</div>", escape_xml(&self.title));
        if !self.warnings.is_empty() {
            let joined = self
                .warnings
                .iter()
                .map(|warning| escape_xml(warning))
                .collect::<Vec<_>>()
                .join(", ");
            html.push_str(&format!("<div class=\"ptt-warn\">\u{26a0} {joined}</div>"));
        }
        html.push_str("<table class=\"ptt-metrics\">");
        for (label, value) in &self.rows {
            html.push_str(&format!(
                "<tr class=\"ptt-row\"><td class=\"ptt-label\">{label}</td><td class=\"ptt-value\">{}</td></tr>",
                escape_xml(value)
            ));
        }
        html.push_str("</table>");
        html
    }
}

pub fn node_tooltip(op: &PlanOperator) -> String {
    let mut tip = Tooltip::new(&op.physical_op);
    tip.warnings = op.warnings.clone();

    tip.row("Logical Operation", op.logical_op.as_str());
    if !op.object_name.is_empty() {
        tip.row("Object", op.object_name.as_str());
    }
    tip.row("Estimated Rows", format_rows(op.estimate_rows));
    tip.row("Estimated CPU Cost", format_cost(op.estimate_cpu));
    tip.row("Estimated I/O Cost", format_cost(op.estimate_io));
    tip.row("Estimated Subtree Cost", format_cost(op.total_subtree_cost));
    tip.row("Cost", format_percent(op.rel_op_cost));
    tip.row("Avg Row Size", format!("{:.0} B", op.avg_row_size));
    if op.parallel {
        tip.row("Parallel", "Yes");
    }
    if op.estimate_rebinds > 0.0 {
        tip.row("Estimated Rebinds", format_rows(op.estimate_rebinds));
    }
    if op.estimate_rewinds > 0.0 {
        tip.row("Estimated Rewinds", format_rows(op.estimate_rewinds));
    }
    tip.to_html()
}

/// Tooltip for the edge carrying `child`'s output up to its parent.
pub fn edge_tooltip(child: &PlanOperator) -> String {
    let mut tip = Tooltip::new(&child.physical_op);
    tip.row("Estimated Rows", format_rows(child.estimate_rows));
    tip.row("Avg Row Size", format!("{:.0} B", child.avg_row_size));
    tip.row(
        "Estimated Data Size",
        format!("{} B", format_rows(child.estimate_rows * child.avg_row_size)),
    );
    tip.to_html()
}
