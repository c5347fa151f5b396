use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub node_text_color: String,
    pub node_border_color: String,
    pub line_color: String,
    pub edge_label_color: String,
    pub background: String,
    /// Hue used for operators that cost nothing.
    pub cost_hue_low: f32,
    /// Hue used for operators carrying the whole plan cost.
    pub cost_hue_high: f32,
    pub cost_saturation: f32,
    pub cost_lightness: f32,
}

impl Theme {
    /// Colors resolved through the host editor's CSS variables, for plans
    /// embedded in a webview.
    pub fn vscode() -> Self {
        Self {
            font_family: "var(--vscode-font-family, monospace)".to_string(),
            font_size: 11.0,
            node_text_color: "#fff".to_string(),
            node_border_color: "none".to_string(),
            line_color: "var(--vscode-editorWidget-border, #666)".to_string(),
            edge_label_color: "var(--vscode-descriptionForeground, #888)".to_string(),
            background: "transparent".to_string(),
            cost_hue_low: 120.0,
            cost_hue_high: 0.0,
            cost_saturation: 70.0,
            cost_lightness: 45.0,
        }
    }

    /// Concrete colors only, for SVG files and PNG output rendered outside a
    /// host that defines CSS variables.
    pub fn standalone() -> Self {
        Self {
            font_family: "Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 11.0,
            node_text_color: "#FFFFFF".to_string(),
            node_border_color: "#1C2430".to_string(),
            line_color: "#7A8AA6".to_string(),
            edge_label_color: "#4A5568".to_string(),
            background: "#FFFFFF".to_string(),
            cost_hue_low: 120.0,
            cost_hue_high: 0.0,
            cost_saturation: 70.0,
            cost_lightness: 45.0,
        }
    }

    /// Fill color for an operator holding `fraction` of the plan cost.
    pub fn cost_color(&self, fraction: f64) -> String {
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        let low = f64::from(self.cost_hue_low);
        let high = f64::from(self.cost_hue_high);
        let hue = (low + (high - low) * fraction).round();
        format!(
            "hsl({hue}, {}%, {}%)",
            self.cost_saturation, self.cost_lightness
        )
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::vscode()
    }
}
