use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Character budgets for the text lines drawn inside a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    pub physical_op_chars: usize,
    pub secondary_chars: usize,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            physical_op_chars: 18,
            secondary_chars: 22,
        }
    }
}

/// Log-scaled stroke width of an edge from the rows flowing along it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    pub min_weight: f64,
    pub weight_scale: f64,
    pub max_weight: f64,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            min_weight: 0.5,
            weight_scale: 0.75,
            max_weight: 6.0,
        }
    }
}

impl EdgeConfig {
    pub fn weight(&self, rows: f64) -> f64 {
        if rows.is_nan() || rows <= 0.0 {
            return self.min_weight;
        }
        (self.min_weight + self.weight_scale * rows.log10())
            .max(self.min_weight)
            .min(self.max_weight)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_width: f32,
    pub node_height: f32,
    pub horizontal_gap: f32,
    pub vertical_gap: f32,
    pub padding: f32,
    pub labels: LabelConfig,
    pub edges: EdgeConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 130.0,
            node_height: 60.0,
            horizontal_gap: 30.0,
            vertical_gap: 50.0,
            padding: 20.0,
            labels: LabelConfig::default(),
            edges: EdgeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::standalone(),
            layout: LayoutConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    labels: Option<LabelConfigFile>,
    edges: Option<EdgeConfigFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    node_text_color: Option<String>,
    node_border_color: Option<String>,
    line_color: Option<String>,
    edge_label_color: Option<String>,
    background: Option<String>,
    cost_hue_low: Option<f32>,
    cost_hue_high: Option<f32>,
    cost_saturation: Option<f32>,
    cost_lightness: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    node_width: Option<f32>,
    node_height: Option<f32>,
    horizontal_gap: Option<f32>,
    vertical_gap: Option<f32>,
    padding: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabelConfigFile {
    physical_op_chars: Option<usize>,
    secondary_chars: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EdgeConfigFile {
    min_weight: Option<f64>,
    weight_scale: Option<f64>,
    max_weight: Option<f64>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Merges a JSON (or JSON5) config document onto the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(_) => json5::from_str(contents)?,
    };

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "vscode" | "host" => config.theme = Theme::vscode(),
            "standalone" | "default" => config.theme = Theme::standalone(),
            other => anyhow::bail!("unknown theme '{other}'"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.node_text_color {
            config.theme.node_text_color = v;
        }
        if let Some(v) = vars.node_border_color {
            config.theme.node_border_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.edge_label_color {
            config.theme.edge_label_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.cost_hue_low {
            config.theme.cost_hue_low = v;
        }
        if let Some(v) = vars.cost_hue_high {
            config.theme.cost_hue_high = v;
        }
        if let Some(v) = vars.cost_saturation {
            config.theme.cost_saturation = v;
        }
        if let Some(v) = vars.cost_lightness {
            config.theme.cost_lightness = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.node_width {
            config.layout.node_width = v.max(1.0);
        }
        if let Some(v) = layout.node_height {
            config.layout.node_height = v.max(1.0);
        }
        if let Some(v) = layout.horizontal_gap {
            config.layout.horizontal_gap = v.max(0.0);
        }
        if let Some(v) = layout.vertical_gap {
            config.layout.vertical_gap = v.max(0.0);
        }
        if let Some(v) = layout.padding {
            config.layout.padding = v.max(0.0);
        }
    }

    if let Some(labels) = parsed.labels {
        if let Some(v) = labels.physical_op_chars {
            config.layout.labels.physical_op_chars = v.max(2);
        }
        if let Some(v) = labels.secondary_chars {
            config.layout.labels.secondary_chars = v.max(2);
        }
    }

    if let Some(edges) = parsed.edges {
        if let Some(v) = edges.min_weight {
            config.layout.edges.min_weight = v;
        }
        if let Some(v) = edges.weight_scale {
            config.layout.edges.weight_scale = v;
        }
        if let Some(v) = edges.max_weight {
            config.layout.edges.max_weight = v;
        }
        if config.layout.edges.max_weight < config.layout.edges.min_weight {
            anyhow::bail!("edges.maxWeight must not be below edges.minWeight");
        }
    }

    Ok(config)
}
