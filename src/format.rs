//! Number formatting and markup helpers shared by the renderer and tooltips.

use crate::config::EdgeConfig;
use crate::theme::Theme;
use once_cell::sync::Lazy;

static DEFAULT_THEME: Lazy<Theme> = Lazy::new(Theme::default);
static DEFAULT_EDGES: Lazy<EdgeConfig> = Lazy::new(EdgeConfig::default);

pub const ELLIPSIS: char = '\u{2026}';

/// Cost fill color on the default green-to-red scale.
pub fn cost_color(fraction: f64) -> String {
    DEFAULT_THEME.cost_color(fraction)
}

/// Edge stroke width for `rows` with the default weighting.
pub fn edge_weight(rows: f64) -> f64 {
    DEFAULT_EDGES.weight(rows)
}

/// Row counts with a K/M magnitude suffix: `500`, `1.5K`, `2.5M`.
pub fn format_rows(rows: f64) -> String {
    if rows >= 1_000_000.0 {
        format!("{:.1}M", rows / 1_000_000.0)
    } else if rows >= 1_000.0 {
        format!("{:.1}K", rows / 1_000.0)
    } else if rows.abs() < 0.5 {
        "0".to_string()
    } else {
        format!("{rows:.0}")
    }
}

/// Optimizer costs: `1.50`, `0.0050`, `1.00e-4`.
pub fn format_cost(cost: f64) -> String {
    if cost == 0.0 {
        "0".to_string()
    } else if cost >= 1.0 {
        format!("{cost:.2}")
    } else if cost >= 0.001 {
        format!("{cost:.4}")
    } else {
        format!("{cost:.2e}")
    }
}

/// A cost fraction as a percentage with one decimal.
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Cuts `text` to at most `max_chars` characters, ending with an ellipsis
/// when anything was dropped.
pub fn truncate_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push(ELLIPSIS);
    out
}

pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
