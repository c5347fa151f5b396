#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod theme;
pub mod tooltip;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, EdgeConfig, LabelConfig, LayoutConfig, RenderConfig, load_config};
pub use error::PlanError;
pub use format::{cost_color, edge_weight, format_cost, format_rows};
pub use ir::{OperatorId, PlanOperator, PlanTree};
pub use layout::{PlanLayout, compute_layout};
pub use parser::{parse_plan, try_parse_plan};
pub use render::{render_plan_svg, render_plan_svg_with, render_svg};
pub use theme::Theme;

/// Theme plus geometry for one render call.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub theme: Theme,
    pub layout: LayoutConfig,
}

impl RenderOptions {
    pub fn vscode() -> Self {
        Self {
            theme: Theme::vscode(),
            layout: LayoutConfig::default(),
        }
    }

    pub fn standalone() -> Self {
        Self {
            theme: Theme::standalone(),
            layout: LayoutConfig::default(),
        }
    }
}

/// Parses ShowPlan XML and renders it to SVG in one step.
pub fn render_with_options(xml: &str, options: RenderOptions) -> Result<String, PlanError> {
    let tree = try_parse_plan(xml)?;
    Ok(render_plan_svg_with(&tree, &options.theme, &options.layout))
}
