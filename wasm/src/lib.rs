use serde::Deserialize;
use showplan_renderer::{RenderOptions, parse_plan, render_with_options};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    node_width: Option<f32>,
    node_height: Option<f32>,
}

fn build_render_options(options: PlanRenderOptions) -> RenderOptions {
    let mut render_options = if options.theme.as_deref() == Some("standalone") {
        RenderOptions::standalone()
    } else {
        RenderOptions::vscode()
    };

    if let Some(font_family) = options.font_family {
        render_options.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        render_options.theme.font_size = font_size;
    }
    if let Some(width) = options.node_width {
        render_options.layout.node_width = width.max(1.0);
    }
    if let Some(height) = options.node_height {
        render_options.layout.node_height = height.max(1.0);
    }

    render_options
}

fn render(xml: &str, options_json: Option<String>) -> Result<String, String> {
    let options = match options_json {
        Some(raw_options) => serde_json::from_str::<PlanRenderOptions>(&raw_options)
            .map_err(|error| error.to_string())?,
        None => PlanRenderOptions::default(),
    };
    render_with_options(xml, build_render_options(options))
        .map_err(|_| "Could not parse query plan XML.".to_string())
}

/// Renders ShowPlan XML to SVG markup; rejects with a user-facing message
/// when the plan cannot be drawn.
#[wasm_bindgen]
pub fn render_plan_svg(xml: &str, options_json: Option<String>) -> Result<String, JsValue> {
    render(xml, options_json).map_err(|message| JsValue::from_str(&message))
}

/// The parsed operator tree as JSON, or `null` when the plan is unusable.
#[wasm_bindgen]
pub fn parse_plan_json(xml: &str) -> String {
    parse_plan(xml)
        .and_then(|tree| serde_json::to_string(&tree).ok())
        .unwrap_or_else(|| "null".to_string())
}
