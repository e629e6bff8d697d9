use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub component_fill: String,
    pub component_border: String,
    pub component_text: String,
    pub type_text: String,
    pub port_fill: String,
    pub port_border: String,
    pub port_text: String,
    pub line_color: String,
    pub edge_label_background: String,
    pub background: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 14.0,
            component_fill: "#ECECFF".to_string(),
            component_border: "#9370DB".to_string(),
            component_text: "#333333".to_string(),
            type_text: "#666666".to_string(),
            port_fill: "#FFFFFF".to_string(),
            port_border: "#9370DB".to_string(),
            port_text: "#555555".to_string(),
            line_color: "#333333".to_string(),
            edge_label_background: "#E8E8E8".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            component_fill: "#F8FAFF".to_string(),
            component_border: "#C7D2E5".to_string(),
            component_text: "#1C2430".to_string(),
            type_text: "#7A8AA6".to_string(),
            port_fill: "#FFFFFF".to_string(),
            port_border: "#7A8AA6".to_string(),
            port_text: "#4A5568".to_string(),
            line_color: "#7A8AA6".to_string(),
            edge_label_background: "#FFFFFF".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::modern()
    }
}
