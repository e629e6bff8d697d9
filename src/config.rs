use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Separation between nodes in the same rank (dagre `nodesep`).
    pub node_spacing: f32,
    /// Separation between ranks (dagre `ranksep`).
    pub rank_spacing: f32,
    pub node_padding_x: f32,
    pub node_padding_y: f32,
    /// Side length of the port squares.
    pub port_size: f32,
    /// Minimum spacing between port anchors on one node side.
    pub port_spacing: f32,
    pub port_label_gap: f32,
    pub port_font_scale: f32,
    pub type_font_scale: f32,
    /// Length of the straight stub leaving or entering a port before any bend.
    pub edge_stub: f32,
    pub canvas_margin: f32,
    pub label_line_height: f32,
    pub max_label_width_chars: usize,
    pub corner_radius: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_spacing: 40.0,
            rank_spacing: 70.0,
            node_padding_x: 16.0,
            node_padding_y: 12.0,
            port_size: 8.0,
            port_spacing: 22.0,
            port_label_gap: 6.0,
            port_font_scale: 0.75,
            type_font_scale: 0.85,
            edge_stub: 12.0,
            canvas_margin: 16.0,
            label_line_height: 1.3,
            max_label_width_chars: 28,
            corner_radius: 6.0,
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

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutOverrides>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    component_fill: Option<String>,
    component_border: Option<String>,
    component_text: Option<String>,
    type_text: Option<String>,
    port_fill: Option<String>,
    port_border: Option<String>,
    port_text: Option<String>,
    line_color: Option<String>,
    edge_label_background: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutOverrides {
    node_spacing: Option<f32>,
    rank_spacing: Option<f32>,
    port_size: Option<f32>,
    port_spacing: Option<f32>,
    edge_stub: Option<f32>,
    canvas_margin: Option<f32>,
    corner_radius: Option<f32>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "classic" {
            config.theme = Theme::classic();
        } else if theme_name == "modern" || theme_name == "default" {
            config.theme = Theme::modern();
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.component_fill {
            config.theme.component_fill = v;
        }
        if let Some(v) = vars.component_border {
            config.theme.component_border = v;
        }
        if let Some(v) = vars.component_text {
            config.theme.component_text = v;
        }
        if let Some(v) = vars.type_text {
            config.theme.type_text = v;
        }
        if let Some(v) = vars.port_fill {
            config.theme.port_fill = v;
        }
        if let Some(v) = vars.port_border {
            config.theme.port_border = v;
        }
        if let Some(v) = vars.port_text {
            config.theme.port_text = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.edge_label_background {
            config.theme.edge_label_background = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.node_spacing {
            config.layout.node_spacing = v;
        }
        if let Some(v) = layout.rank_spacing {
            config.layout.rank_spacing = v;
        }
        if let Some(v) = layout.port_size {
            config.layout.port_size = v;
        }
        if let Some(v) = layout.port_spacing {
            config.layout.port_spacing = v;
        }
        if let Some(v) = layout.edge_stub {
            config.layout.edge_stub = v;
        }
        if let Some(v) = layout.canvas_margin {
            config.layout.canvas_margin = v;
        }
        if let Some(v) = layout.corner_radius {
            config.layout.corner_radius = v;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_config_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.node_spacing, 40.0);
        assert_eq!(config.theme.background, "#FFFFFF");
    }

    #[test]
    fn parses_config_file_fields() {
        let parsed: ConfigFile = serde_json::from_str(
            r##"{
                "theme": "classic",
                "themeVariables": { "lineColor": "#FF0000", "fontSize": 11.0 },
                "layout": { "rankSpacing": 120.0 }
            }"##,
        )
        .unwrap();
        assert_eq!(parsed.theme.as_deref(), Some("classic"));
        let vars = parsed.theme_variables.unwrap();
        assert_eq!(vars.line_color.as_deref(), Some("#FF0000"));
        assert_eq!(vars.font_size, Some(11.0));
        assert_eq!(parsed.layout.unwrap().rank_spacing, Some(120.0));
    }
}
