#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod graph;
pub mod layout;
pub mod layout_dump;
pub mod loader;
pub mod model;
pub mod render;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, load_config};
pub use graph::build_graph;
pub use layout::compute_layout;
pub use loader::{LoadError, load_topology, parse_topology_str};
pub use render::render_svg;
pub use theme::Theme;
